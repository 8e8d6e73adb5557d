// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Characteristic names a subscriber can ask for.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValueError;

/// A typed category of telemetry a subscriber can receive.
///
/// The set is closed: each characteristic has exactly one payload type,
/// carried by [`CharacteristicValue`](crate::message::CharacteristicValue).
///
/// # Examples
///
/// ```
/// use alarm_sensor_adaptor::types::Characteristic;
///
/// let c: Characteristic = "binary_sensor".parse().unwrap();
/// assert_eq!(c, Characteristic::BinarySensor);
/// assert_eq!(Characteristic::Battery.as_str(), "battery");
/// assert!("humidity".parse::<Characteristic>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Characteristic {
    /// Alarm state, payload `"on"` / `"off"`.
    BinarySensor,
    /// Battery level, numeric payload.
    Battery,
    /// Connectivity, boolean payload.
    Connected,
}

impl Characteristic {
    /// Every characteristic, in declaration order.
    pub const ALL: [Self; 3] = [Self::BinarySensor, Self::Battery, Self::Connected];

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BinarySensor => "binary_sensor",
            Self::Battery => "battery",
            Self::Connected => "connected",
        }
    }

    /// Position in [`Characteristic::ALL`].
    #[must_use]
    pub(crate) const fn index(self) -> usize {
        match self {
            Self::BinarySensor => 0,
            Self::Battery => 1,
            Self::Connected => 2,
        }
    }
}

impl fmt::Display for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Characteristic {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "binary_sensor" => Ok(Self::BinarySensor),
            "battery" => Ok(Self::Battery),
            "connected" => Ok(Self::Connected),
            _ => Err(ValueError::UnknownCharacteristic(s.to_string())),
        }
    }
}

impl Serialize for Characteristic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Characteristic {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}
