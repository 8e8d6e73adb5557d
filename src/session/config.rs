// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session configuration.

use std::time::Duration;

use crate::types::SessionId;

/// Default period of the battery check (6 hours).
pub const DEFAULT_BATTERY_CHECK_INTERVAL: Duration = Duration::from_secs(21_600);

/// Default period of the sensor poll (6 hours).
pub const DEFAULT_SENSOR_POLL_INTERVAL: Duration = Duration::from_secs(21_600);

/// Default delay between device init and the first battery check.
pub const DEFAULT_INITIAL_BATTERY_CHECK_DELAY: Duration = Duration::from_secs(120);

/// Default delay before telling subscribers the device is connected.
pub const DEFAULT_CONNECTED_DELAY: Duration = Duration::from_secs(120);

/// Default adaptor name sent in the service handshake.
pub const DEFAULT_NAME: &str = "alarm_sensor";

/// Configuration of one device session.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use alarm_sensor_adaptor::session::SessionConfig;
///
/// let config = SessionConfig::new("dev4", "22")
///     .with_name("everspring_1")
///     .with_friendly_name("Hallway smoke detector")
///     .with_battery_check_interval(Duration::from_secs(3600));
///
/// assert_eq!(config.address, "22");
/// assert_eq!(config.display_name(), "Hallway smoke detector");
/// assert_eq!(config.connected_delay, Duration::from_secs(120));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Session identifier used in every outbound message.
    pub id: SessionId,
    /// Device address on the protocol bus.
    pub address: String,
    /// Adaptor name returned in the service handshake.
    pub name: String,
    /// Optional human-readable name for log records.
    pub friendly_name: Option<String>,
    /// Period of the recurring battery check.
    pub battery_check_interval: Duration,
    /// Period of the recurring sensor poll.
    pub sensor_poll_interval: Duration,
    /// Delay between device init and the first battery check.
    pub initial_battery_check_delay: Duration,
    /// Delay before the `connected` announcement.
    pub connected_delay: Duration,
}

impl SessionConfig {
    /// Creates a configuration with default timings.
    #[must_use]
    pub fn new(id: impl Into<SessionId>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            name: DEFAULT_NAME.to_string(),
            friendly_name: None,
            battery_check_interval: DEFAULT_BATTERY_CHECK_INTERVAL,
            sensor_poll_interval: DEFAULT_SENSOR_POLL_INTERVAL,
            initial_battery_check_delay: DEFAULT_INITIAL_BATTERY_CHECK_DELAY,
            connected_delay: DEFAULT_CONNECTED_DELAY,
        }
    }

    /// Sets the adaptor name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets a friendly name for the device.
    #[must_use]
    pub fn with_friendly_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = Some(name.into());
        self
    }

    /// Sets the battery check period.
    #[must_use]
    pub fn with_battery_check_interval(mut self, interval: Duration) -> Self {
        self.battery_check_interval = interval;
        self
    }

    /// Sets the sensor poll period.
    #[must_use]
    pub fn with_sensor_poll_interval(mut self, interval: Duration) -> Self {
        self.sensor_poll_interval = interval;
        self
    }

    /// Sets the delay before the first battery check.
    #[must_use]
    pub fn with_initial_battery_check_delay(mut self, delay: Duration) -> Self {
        self.initial_battery_check_delay = delay;
        self
    }

    /// Sets the delay before the `connected` announcement.
    #[must_use]
    pub fn with_connected_delay(mut self, delay: Duration) -> Self {
        self.connected_delay = delay;
        self
    }

    /// Returns the friendly name if set, otherwise the adaptor name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.friendly_name.as_deref().unwrap_or(&self.name)
    }
}
