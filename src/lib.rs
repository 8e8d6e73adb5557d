// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Alarm sensor adaptor - bridges a Z-Wave binary alarm sensor to subscriber
//! applications.
//!
//! The adaptor runs one session per physical sensor (e.g. an Everspring
//! smoke detector). Each session:
//!
//! - translates gateway reports into `binary_sensor`, `battery` and
//!   `connected` characteristic events
//! - fans those events out to the applications subscribed to them
//! - polls the sleeping device periodically for its battery level and alarm
//!   state
//! - reports its lifecycle and battery level to the manager
//!
//! Transports are left to the host: a session talks through unbounded tokio
//! channels carrying the typed messages in [`message`] and [`protocol`], all
//! of which (de)serialize to the JSON wire shapes.
//!
//! # Quick Start
//!
//! ```no_run
//! use alarm_sensor_adaptor::message::{AppRequest, ManagerCommand};
//! use alarm_sensor_adaptor::session::{self, SessionConfig, SessionLinks};
//!
//! #[tokio::main]
//! async fn main() -> alarm_sensor_adaptor::Result<()> {
//!     let (links, mut endpoints) = SessionLinks::channel();
//!     let handle = session::spawn(
//!         SessionConfig::new("dev1", "12").with_name("everspring_1"),
//!         links,
//!     );
//!
//!     handle.manager_command(ManagerCommand::Config { apps: vec![] })?;
//!     handle.app_request(AppRequest::parse(r#"{"request":"init","id":"app1"}"#)?)?;
//!     handle.app_request(AppRequest::parse(
//!         r#"{"request":"service","id":"app1","service":[{"characteristic":"binary_sensor"}]}"#,
//!     )?)?;
//!     handle.gateway_json(r#"{"content":"data","commandClass":"156","data":{"value":true}}"#)?;
//!
//!     while let Some(envelope) = endpoints.apps.recv().await {
//!         println!("to {}: {:?}", envelope.to, envelope.message);
//!     }
//!
//!     handle.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Logging
//!
//! The crate logs through [`tracing`]. Every record emitted by a session is
//! inside a `device_session` span carrying its id, address and name.

pub mod error;
pub mod message;
pub mod polling;
pub mod protocol;
pub mod session;
pub mod state;
pub mod subscription;
pub mod timer;
pub mod types;

pub use error::{DecodeError, Error, Result, SessionError, ValueError};
pub use message::{AppMessage, AppRequest, CharacteristicEvent, ManagerCommand, ManagerMessage};
pub use protocol::{CommandClass, GatewayEvent, GatewayRequest};
pub use session::{DeviceSession, SessionConfig, SessionHandle, SessionLinks};
pub use state::LifecycleState;
pub use types::{AlarmState, BatteryLevel, Characteristic, SessionId, SubscriberId};
