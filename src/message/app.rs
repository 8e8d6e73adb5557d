// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscriber channel messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::DecodeError;
use crate::types::{AlarmState, BatteryLevel, Characteristic, SessionId, SubscriberId};

/// One entry of a service list, in registrations and in the handshake reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    /// Requested or offered characteristic.
    pub characteristic: Characteristic,
    /// Reporting interval in seconds; `0` means on change.
    #[serde(default)]
    pub interval: u64,
    /// Device type hint.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl ServiceEntry {
    /// Creates an on-change entry without a type hint.
    #[must_use]
    pub fn new(characteristic: Characteristic) -> Self {
        Self {
            characteristic,
            interval: 0,
            kind: None,
        }
    }
}

/// Inbound message from a subscriber application.
///
/// # Examples
///
/// ```
/// use alarm_sensor_adaptor::message::AppRequest;
/// use alarm_sensor_adaptor::types::Characteristic;
///
/// let req = AppRequest::parse(
///     r#"{"request":"service","id":"app1","service":[{"characteristic":"battery","interval":600}]}"#,
/// )
/// .unwrap();
///
/// let AppRequest::Service { service, .. } = req else { panic!() };
/// assert_eq!(service[0].characteristic, Characteristic::Battery);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "request", rename_all = "lowercase")]
pub enum AppRequest {
    /// The subscriber announces itself.
    Init {
        /// Subscriber identity.
        id: SubscriberId,
    },
    /// The subscriber replaces its full characteristic set.
    Service {
        /// Subscriber identity.
        id: SubscriberId,
        /// Requested characteristics.
        #[serde(default)]
        service: Vec<ServiceEntry>,
    },
    /// The subscriber asks the device to do something.
    Command {
        /// Subscriber identity.
        id: SubscriberId,
        /// Command payload.
        #[serde(default)]
        data: Option<Value>,
    },
}

impl AppRequest {
    /// Parses a request from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Json`] if the text is not a known request,
    /// including registrations naming an unknown characteristic.
    pub fn parse(json: &str) -> Result<Self, DecodeError> {
        serde_json::from_str(json).map_err(DecodeError::from)
    }

    /// Returns the subscriber that sent the request.
    #[must_use]
    pub fn subscriber(&self) -> &SubscriberId {
        match self {
            Self::Init { id } | Self::Service { id, .. } | Self::Command { id, .. } => id,
        }
    }
}

/// Typed payload of a characteristic event.
///
/// Each variant belongs to exactly one [`Characteristic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CharacteristicValue {
    /// `binary_sensor`: `"on"` / `"off"`.
    BinarySensor(AlarmState),
    /// `battery`: raw level.
    Battery(BatteryLevel),
    /// `connected`: boolean.
    Connected(bool),
}

impl CharacteristicValue {
    /// Returns the characteristic this value is published under.
    #[must_use]
    pub const fn characteristic(&self) -> Characteristic {
        match self {
            Self::BinarySensor(_) => Characteristic::BinarySensor,
            Self::Battery(_) => Characteristic::Battery,
            Self::Connected(_) => Characteristic::Connected,
        }
    }
}

/// A characteristic event as delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacteristicEvent {
    id: SessionId,
    characteristic: Characteristic,
    data: CharacteristicValue,
    #[serde(rename = "timeStamp", serialize_with = "serialize_unix_seconds")]
    timestamp: DateTime<Utc>,
}

impl CharacteristicEvent {
    /// Creates an event for `value` stamped with `timestamp`.
    #[must_use]
    pub fn new(id: SessionId, data: CharacteristicValue, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            characteristic: data.characteristic(),
            data,
            timestamp,
        }
    }

    /// Session that produced the event.
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Characteristic of the event.
    #[must_use]
    pub fn characteristic(&self) -> Characteristic {
        self.characteristic
    }

    /// Event payload.
    #[must_use]
    pub fn data(&self) -> CharacteristicValue {
        self.data
    }

    /// When the event was produced.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[allow(clippy::cast_precision_loss)]
fn serialize_unix_seconds<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(ts.timestamp_micros() as f64 / 1_000_000.0)
}

/// Outbound message to a subscriber application.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "content", rename_all = "lowercase")]
pub enum AppMessage {
    /// Reply to the init handshake, describing what the device offers.
    Service {
        /// Adaptor name.
        name: String,
        /// Session id.
        id: SessionId,
        /// Always `"ok"`.
        status: String,
        /// Offered characteristics.
        service: Vec<ServiceEntry>,
    },
    /// Telemetry event.
    Characteristic(CharacteristicEvent),
}

impl AppMessage {
    /// Builds the handshake reply of a smoke detector.
    ///
    /// # Examples
    ///
    /// ```
    /// use alarm_sensor_adaptor::message::AppMessage;
    /// use alarm_sensor_adaptor::types::SessionId;
    ///
    /// let reply = AppMessage::service_offer("everspring", SessionId::new("dev1"));
    /// let json = serde_json::to_value(&reply).unwrap();
    ///
    /// assert_eq!(json["content"], "service");
    /// assert_eq!(json["status"], "ok");
    /// assert_eq!(json["service"][0]["type"], "smoke_detector");
    /// ```
    #[must_use]
    pub fn service_offer(name: impl Into<String>, id: SessionId) -> Self {
        Self::Service {
            name: name.into(),
            id,
            status: "ok".to_string(),
            service: vec![ServiceEntry {
                characteristic: Characteristic::BinarySensor,
                interval: 0,
                kind: Some("smoke_detector".to_string()),
            }],
        }
    }

    /// Returns the characteristic event carried by this message, if any.
    #[must_use]
    pub fn as_characteristic(&self) -> Option<&CharacteristicEvent> {
        match self {
            Self::Characteristic(event) => Some(event),
            Self::Service { .. } => None,
        }
    }
}

/// A message addressed to one subscriber.
#[derive(Debug, Clone, PartialEq)]
pub struct AppEnvelope {
    /// Recipient.
    pub to: SubscriberId,
    /// Message body.
    pub message: AppMessage,
}
