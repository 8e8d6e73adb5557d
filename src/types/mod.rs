// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared across the adaptor.
//!
//! # Types
//!
//! - [`Characteristic`] - Closed set of telemetry categories (`binary_sensor`, `battery`, `connected`)
//! - [`AlarmState`] - On/Off state of the detector's alarm
//! - [`BatteryLevel`] - Raw battery report value
//! - [`SessionId`] - Opaque device session identifier
//! - [`SubscriberId`] - Opaque subscriber application identifier

mod alarm;
mod battery;
mod characteristic;
mod ids;

pub use alarm::AlarmState;
pub use battery::BatteryLevel;
pub use characteristic::Characteristic;
pub use ids::{SessionId, SubscriberId};
