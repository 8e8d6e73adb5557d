// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Protocol gateway messages and report translation.
//!
//! The gateway carries requests to the device and delivers its reports back
//! as field-keyed JSON objects.
//!
//! - [`GatewayRequest`]: outbound `get` / `post` requests
//! - [`GatewayEvent`]: inbound `init` and `data` events
//! - [`translate`]: maps an inbound event to a typed [`Report`]
//!
//! | Command class | Meaning | Payload field |
//! |---------------|---------|---------------|
//! | 156 | Sensor alarm | `data.value` |
//! | 128 | Battery | `data.last.value` |

mod command_class;
mod gateway;
mod translator;

pub use command_class::CommandClass;
pub use gateway::{GatewayEvent, GatewayRequest, RequestMethod};
pub use translator::{Report, translate};
