// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lifecycle state machine of a device session.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{SessionError, ValueError};

/// Coarse lifecycle state of a device session.
///
/// ```text
/// Stopped --Configure--> Starting --AppInit--> Running --Fault--> Error
///                                                 ^                 |
///                                                 +---ClearError----+
/// any --Stop--> Stopped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Initial state, and the state after teardown.
    #[default]
    Stopped,
    /// Configuration received, waiting for the application handshake.
    Starting,
    /// Fully operational.
    Running,
    /// A fault was reported while running.
    Error,
}

/// Inputs that drive the lifecycle state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// A configuration message arrived from the manager.
    Configure,
    /// A subscriber completed the init handshake.
    AppInit,
    /// A fault condition was detected.
    Fault,
    /// The fault was cleared.
    ClearError,
    /// The session is being torn down.
    Stop,
}

impl LifecycleState {
    /// Returns the wire name used in manager status messages.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Error => "error",
        }
    }

    /// Computes the state reached from `self` on `event`.
    ///
    /// Returns `Ok(Some(next))` for a transition, `Ok(None)` when the event
    /// is accepted but the state does not change (a re-delivered
    /// configuration, a second handshake), and an error when the machine has
    /// no edge for the pair.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidTransition`] for an undefined edge.
    ///
    /// # Examples
    ///
    /// ```
    /// use alarm_sensor_adaptor::state::{LifecycleEvent, LifecycleState};
    ///
    /// let next = LifecycleState::Stopped.next(LifecycleEvent::Configure).unwrap();
    /// assert_eq!(next, Some(LifecycleState::Starting));
    ///
    /// assert!(LifecycleState::Stopped.next(LifecycleEvent::Fault).is_err());
    /// ```
    pub fn next(self, event: LifecycleEvent) -> Result<Option<Self>, SessionError> {
        use LifecycleEvent as E;

        match (self, event) {
            (Self::Stopped, E::Configure) => Ok(Some(Self::Starting)),
            (Self::Starting | Self::Running | Self::Error, E::Configure)
            | (Self::Running | Self::Error, E::AppInit)
            | (Self::Error, E::Fault)
            | (Self::Stopped, E::Stop) => Ok(None),
            (Self::Starting, E::AppInit) | (Self::Error, E::ClearError) => Ok(Some(Self::Running)),
            (Self::Running, E::Fault) => Ok(Some(Self::Error)),
            (_, E::Stop) => Ok(Some(Self::Stopped)),
            (from, event) => Err(SessionError::InvalidTransition { from, event }),
        }
    }

    /// Returns true once the application handshake has completed.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleState {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stopped" => Ok(Self::Stopped),
            "starting" => Ok(Self::Starting),
            "running" => Ok(Self::Running),
            "error" => Ok(Self::Error),
            _ => Err(ValueError::UnknownLifecycleState(s.to_string())),
        }
    }
}

impl LifecycleEvent {
    /// Returns a short name for log records and error messages.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Configure => "configure",
            Self::AppInit => "app_init",
            Self::Fault => "fault",
            Self::ClearError => "clear_error",
            Self::Stop => "stop",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
