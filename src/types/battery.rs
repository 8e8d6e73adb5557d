// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Battery level type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Battery level as last reported by the device.
///
/// Values 0-100 are a percentage. Z-Wave devices report `255` as a
/// low-battery warning; it is kept as-is so subscribers see exactly what
/// the device sent.
///
/// # Examples
///
/// ```
/// use alarm_sensor_adaptor::types::BatteryLevel;
///
/// let level = BatteryLevel::new(87);
/// assert_eq!(level.value(), 87);
/// assert!(!level.is_low_warning());
/// assert!(BatteryLevel::LOW_WARNING.is_low_warning());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatteryLevel(u8);

impl BatteryLevel {
    /// The Z-Wave battery-low marker.
    pub const LOW_WARNING: Self = Self(0xFF);

    /// Creates a battery level from a raw report value.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Returns true for the device's low-battery marker.
    #[must_use]
    pub const fn is_low_warning(&self) -> bool {
        self.0 == Self::LOW_WARNING.0
    }
}

impl fmt::Display for BatteryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_low_warning() {
            f.write_str("low")
        } else {
            write!(f, "{}%", self.0)
        }
    }
}

impl From<u8> for BatteryLevel {
    fn from(value: u8) -> Self {
        Self(value)
    }
}
