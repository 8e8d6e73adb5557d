// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Translation of raw gateway events into typed device reports.
//!
//! Translation is pure: it never touches session state. The session decides
//! what to do with a [`Report`] and logs and drops any [`DecodeError`].

use serde_json::Value;

use crate::error::DecodeError;
use crate::types::{AlarmState, BatteryLevel};

use super::{CommandClass, GatewayEvent};

/// A device report understood by this adaptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    /// The device initialised; the session should query it and start polling.
    Initialized,
    /// Binary alarm report.
    Alarm(AlarmState),
    /// Battery level report.
    Battery(BatteryLevel),
}

/// Translates a gateway event into a [`Report`].
///
/// # Errors
///
/// - [`DecodeError::UnsupportedCommandClass`] for reports of any command
///   class other than battery and sensor alarm
/// - [`DecodeError::MissingField`] / [`DecodeError::InvalidValue`] when the
///   payload does not carry the expected value
///
/// # Examples
///
/// ```
/// use alarm_sensor_adaptor::protocol::{translate, CommandClass, GatewayEvent, Report};
/// use alarm_sensor_adaptor::types::AlarmState;
/// use serde_json::json;
///
/// let event = GatewayEvent::data(CommandClass::SENSOR_ALARM, json!({"value": 255}));
/// assert_eq!(translate(&event).unwrap(), Report::Alarm(AlarmState::On));
/// ```
pub fn translate(event: &GatewayEvent) -> Result<Report, DecodeError> {
    match event {
        GatewayEvent::Init => Ok(Report::Initialized),
        GatewayEvent::Data {
            command_class,
            data,
        } => match *command_class {
            CommandClass::SENSOR_ALARM => decode_alarm(data).map(Report::Alarm),
            CommandClass::BATTERY => decode_battery(data).map(Report::Battery),
            other => Err(DecodeError::UnsupportedCommandClass(other)),
        },
    }
}

fn decode_alarm(data: &Value) -> Result<AlarmState, DecodeError> {
    let value = data
        .get("value")
        .ok_or_else(|| DecodeError::MissingField("data.value".to_string()))?;

    Ok(AlarmState::from(is_truthy(value)))
}

fn decode_battery(data: &Value) -> Result<BatteryLevel, DecodeError> {
    let value = data
        .pointer("/last/value")
        .ok_or_else(|| DecodeError::MissingField("data.last.value".to_string()))?;

    let raw = value.as_u64().ok_or_else(|| DecodeError::InvalidValue {
        field: "data.last.value".to_string(),
        message: format!("expected a non-negative integer, got {value}"),
    })?;

    u8::try_from(raw)
        .map(BatteryLevel::new)
        .map_err(|_| DecodeError::InvalidValue {
            field: "data.last.value".to_string(),
            message: format!("{raw} exceeds 255"),
        })
}

/// Alarm values arrive as booleans or as the raw Z-Wave byte (0 / 255).
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}
