// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Messages on the manager and subscriber channels.
//!
//! All messages are field-keyed JSON objects. Inbound messages are parsed
//! into tagged enums with a fixed field set per kind; anything that does not
//! match is rejected with a [`DecodeError`](crate::error::DecodeError).
//!
//! | Channel | Inbound | Outbound |
//! |---------|---------|----------|
//! | Manager | [`ManagerCommand`] | [`ManagerMessage`] |
//! | Subscriber | [`AppRequest`] | [`AppMessage`] in an [`AppEnvelope`] |

mod app;
mod manager;

pub use app::{
    AppEnvelope, AppMessage, AppRequest, CharacteristicEvent, CharacteristicValue, ServiceEntry,
};
pub use manager::{ManagerCommand, ManagerMessage, ManagerStatus};
