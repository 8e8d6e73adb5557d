// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Messages exchanged with the protocol gateway.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DecodeError;
use crate::types::SessionId;

use super::CommandClass;

/// Request verb understood by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestMethod {
    /// Read a cached or live value.
    Get,
    /// Invoke an action on the device.
    Post,
}

/// Outbound request to the protocol gateway.
///
/// # Examples
///
/// ```
/// use alarm_sensor_adaptor::protocol::{CommandClass, GatewayRequest};
/// use alarm_sensor_adaptor::types::SessionId;
///
/// let req = GatewayRequest::poll(SessionId::new("dev1"), "12", CommandClass::BATTERY);
/// let json = serde_json::to_value(&req).unwrap();
///
/// assert_eq!(json["request"], "post");
/// assert_eq!(json["commandClass"], "128");
/// assert_eq!(json["action"], "Get");
/// assert!(json.get("name").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayRequest {
    /// Session that issued the request.
    pub id: SessionId,
    /// Request verb.
    pub request: RequestMethod,
    /// Device address on the protocol bus.
    pub address: String,
    /// Endpoint instance; this device only has instance `"0"`.
    pub instance: String,
    /// Command class addressed.
    pub command_class: CommandClass,
    /// Action name for `post` requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Action argument or value selector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Name of the value being read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl GatewayRequest {
    fn new(
        id: SessionId,
        request: RequestMethod,
        address: impl Into<String>,
        command_class: CommandClass,
    ) -> Self {
        Self {
            id,
            request,
            address: address.into(),
            instance: "0".to_string(),
            command_class,
            action: None,
            value: None,
            name: None,
        }
    }

    /// Immediate read of the alarm sensor state, issued on device init.
    #[must_use]
    pub fn sensor_state_query(id: SessionId, address: impl Into<String>) -> Self {
        let mut req = Self::new(id, RequestMethod::Get, address, CommandClass::SENSOR_ALARM);
        req.value = Some("1".to_string());
        req.name = Some("sensorState".to_string());
        req
    }

    /// Immediate read of the battery level, issued on device init.
    #[must_use]
    pub fn battery_query(id: SessionId, address: impl Into<String>) -> Self {
        Self::new(id, RequestMethod::Get, address, CommandClass::BATTERY)
    }

    /// Periodic `Get` action for a command class.
    ///
    /// The device answers on its next wake-up with a data event.
    #[must_use]
    pub fn poll(id: SessionId, address: impl Into<String>, command_class: CommandClass) -> Self {
        let mut req = Self::new(id, RequestMethod::Post, address, command_class);
        req.action = Some("Get".to_string());
        req.value = Some(String::new());
        req
    }
}

/// Inbound event from the protocol gateway.
///
/// # Examples
///
/// ```
/// use alarm_sensor_adaptor::protocol::{CommandClass, GatewayEvent};
///
/// let init = GatewayEvent::parse(r#"{"content":"init"}"#).unwrap();
/// assert_eq!(init, GatewayEvent::Init);
///
/// let data = GatewayEvent::parse(
///     r#"{"content":"data","commandClass":"128","data":{"last":{"value":90}}}"#,
/// )
/// .unwrap();
/// assert_eq!(data.command_class(), Some(CommandClass::BATTERY));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "content", rename_all = "lowercase")]
pub enum GatewayEvent {
    /// The device joined or woke up for the first time.
    Init,

    /// The device reported a value.
    Data {
        /// Command class of the report.
        #[serde(rename = "commandClass")]
        command_class: CommandClass,
        /// Raw report payload; its shape depends on the command class.
        #[serde(default)]
        data: Value,
    },
}

impl GatewayEvent {
    /// Creates a data event.
    #[must_use]
    pub fn data(command_class: CommandClass, data: Value) -> Self {
        Self::Data {
            command_class,
            data,
        }
    }

    /// Parses an event from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Json`] if the text is not a known event shape.
    pub fn parse(json: &str) -> Result<Self, DecodeError> {
        serde_json::from_str(json).map_err(DecodeError::from)
    }

    /// Returns the command class of a data event.
    #[must_use]
    pub fn command_class(&self) -> Option<CommandClass> {
        match self {
            Self::Init => None,
            Self::Data { command_class, .. } => Some(*command_class),
        }
    }
}
