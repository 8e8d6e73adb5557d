// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the alarm sensor adaptor.
//!
//! Every error in this crate is contained by the session that produced it:
//! decode failures, unsupported subscriber commands and rejected lifecycle
//! transitions are logged and dropped rather than propagated to the host.

use thiserror::Error;

use crate::protocol::CommandClass;
use crate::state::{LifecycleEvent, LifecycleState};
use crate::types::SubscriberId;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// An inbound message could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A value did not match any known variant.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// The session refused or could not complete an operation.
    #[error("session error: {0}")]
    Session(#[from] SessionError),
}

/// Errors raised while decoding inbound protocol or subscriber messages.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the payload.
    #[error("missing field in payload: {0}")]
    MissingField(String),

    /// A field is present but its value cannot be used.
    #[error("failed to decode {field}: {message}")]
    InvalidValue {
        /// The field that failed to decode.
        field: String,
        /// Description of the decoding failure.
        message: String,
    },

    /// The report belongs to a command class this device does not handle.
    #[error("unsupported command class {0}")]
    UnsupportedCommandClass(CommandClass),
}

/// Errors related to parsing named values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// Characteristic name is not one of `binary_sensor`, `battery`, `connected`.
    #[error("unknown characteristic: {0}")]
    UnknownCharacteristic(String),

    /// Lifecycle state name is not recognised.
    #[error("unknown lifecycle state: {0}")]
    UnknownLifecycleState(String),

    /// Command class is not a decimal number in 0..=255.
    #[error("invalid command class: {0}")]
    InvalidCommandClass(String),
}

/// Errors related to session operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The lifecycle state machine has no edge for this event.
    #[error("no transition from {from} on {event}")]
    InvalidTransition {
        /// State the session was in.
        from: LifecycleState,
        /// Event that was refused.
        event: LifecycleEvent,
    },

    /// A subscriber sent a command a pure sensor cannot act on.
    #[error("this is a sensor, command from {subscriber} not understood")]
    UnsupportedCommand {
        /// The subscriber that sent the command.
        subscriber: SubscriberId,
    },

    /// A subscriber sent a command without a `data` field.
    #[error("command from {subscriber} has no data")]
    CommandWithoutData {
        /// The subscriber that sent the command.
        subscriber: SubscriberId,
    },

    /// A request could not be handed to the protocol gateway.
    #[error("protocol gateway is unavailable")]
    GatewayUnavailable,

    /// The session task is gone.
    #[error("channel closed: {0}")]
    ChannelClosed(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
