// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Alarm state reported by the binary sensor.

use std::fmt;

use serde::{Deserialize, Serialize};

/// State of the detector's alarm.
///
/// Serialized as `"on"` / `"off"` in characteristic events.
///
/// # Examples
///
/// ```
/// use alarm_sensor_adaptor::types::AlarmState;
///
/// assert_eq!(AlarmState::from(true), AlarmState::On);
/// assert_eq!(AlarmState::Off.as_str(), "off");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmState {
    /// No alarm.
    Off,
    /// Alarm triggered.
    On,
}

impl AlarmState {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::On => "on",
        }
    }

    /// Returns true if the alarm is triggered.
    #[must_use]
    pub const fn is_on(&self) -> bool {
        matches!(self, Self::On)
    }
}

impl fmt::Display for AlarmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<bool> for AlarmState {
    fn from(value: bool) -> Self {
        if value { Self::On } else { Self::Off }
    }
}
