// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Manager channel messages.

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::state::LifecycleState;
use crate::types::{BatteryLevel, SessionId, SubscriberId};

/// Outbound status message to the manager.
///
/// # Examples
///
/// ```
/// use alarm_sensor_adaptor::message::ManagerMessage;
/// use alarm_sensor_adaptor::state::LifecycleState;
/// use alarm_sensor_adaptor::types::SessionId;
///
/// let msg = ManagerMessage::state(SessionId::new("dev1"), LifecycleState::Running);
/// let json = serde_json::to_value(&msg).unwrap();
///
/// assert_eq!(json["id"], "dev1");
/// assert_eq!(json["status"], "state");
/// assert_eq!(json["state"], "running");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerMessage {
    /// Session the status belongs to.
    pub id: SessionId,
    /// Status payload.
    #[serde(flatten)]
    pub status: ManagerStatus,
}

/// Status payload of a [`ManagerMessage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ManagerStatus {
    /// Lifecycle transition.
    State {
        /// The new lifecycle state.
        state: LifecycleState,
    },
    /// Battery telemetry.
    BatteryLevel {
        /// Last reported battery level.
        battery_level: BatteryLevel,
    },
}

impl ManagerMessage {
    /// Creates a lifecycle status message.
    #[must_use]
    pub fn state(id: SessionId, state: LifecycleState) -> Self {
        Self {
            id,
            status: ManagerStatus::State { state },
        }
    }

    /// Creates a battery telemetry message.
    #[must_use]
    pub fn battery_level(id: SessionId, battery_level: BatteryLevel) -> Self {
        Self {
            id,
            status: ManagerStatus::BatteryLevel { battery_level },
        }
    }
}

/// Inbound command from the manager.
///
/// Configuration can be re-delivered at any time, typically because a new
/// application has been attached to this device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ManagerCommand {
    /// (Re)configure the session.
    Config {
        /// Applications the manager intends to connect to this device.
        #[serde(default)]
        apps: Vec<SubscriberId>,
    },
    /// Tear the session down.
    Stop,
}

impl ManagerCommand {
    /// Parses a command from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Json`] if the text is not a known command.
    pub fn parse(json: &str) -> Result<Self, DecodeError> {
        serde_json::from_str(json).map_err(DecodeError::from)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn battery_level_shape() {
        let msg = ManagerMessage::battery_level(SessionId::new("dev1"), BatteryLevel::new(64));
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"id": "dev1", "status": "battery_level", "battery_level": 64})
        );
    }

    #[test]
    fn state_round_trips_through_json() {
        let msg = ManagerMessage::state(SessionId::new("dev1"), LifecycleState::Starting);
        let text = serde_json::to_string(&msg).unwrap();
        let back: ManagerMessage = serde_json::from_str(&text).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn parse_config_with_apps() {
        let cmd = ManagerCommand::parse(r#"{"cmd":"config","apps":["app1","app2"]}"#).unwrap();
        assert_eq!(
            cmd,
            ManagerCommand::Config {
                apps: vec![SubscriberId::new("app1"), SubscriberId::new("app2")],
            }
        );
    }

    #[test]
    fn parse_config_without_apps() {
        let cmd = ManagerCommand::parse(r#"{"cmd":"config"}"#).unwrap();
        assert_eq!(cmd, ManagerCommand::Config { apps: Vec::new() });
    }

    #[test]
    fn parse_stop() {
        assert_eq!(ManagerCommand::parse(r#"{"cmd":"stop"}"#).unwrap(), ManagerCommand::Stop);
        assert!(ManagerCommand::parse(r#"{"cmd":"reboot"}"#).is_err());
    }
}
