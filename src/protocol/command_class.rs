// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Z-Wave command class identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValueError;

/// Protocol-level identifier of the kind of device report or request.
///
/// Serialized as a decimal string (`"156"`), the form the gateway uses.
/// Deserialization also accepts a plain integer.
///
/// # Examples
///
/// ```
/// use alarm_sensor_adaptor::protocol::CommandClass;
///
/// let cc: CommandClass = "128".parse().unwrap();
/// assert_eq!(cc, CommandClass::BATTERY);
/// assert_eq!(CommandClass::SENSOR_ALARM.to_string(), "156");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandClass(u8);

impl CommandClass {
    /// Battery reports and queries (`0x80`).
    pub const BATTERY: Self = Self(128);

    /// Binary alarm reports and queries (`0x9C`, Sensor Alarm).
    pub const SENSOR_ALARM: Self = Self(156);

    /// Creates a command class from its numeric identifier.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Returns the numeric identifier.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for CommandClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CommandClass {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .map(Self)
            .map_err(|_| ValueError::InvalidCommandClass(s.to_string()))
    }
}

impl Serialize for CommandClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CommandClass {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
            Raw::Number(n) => u8::try_from(n)
                .map(Self)
                .map_err(|_| serde::de::Error::custom(ValueError::InvalidCommandClass(n.to_string()))),
        }
    }
}
