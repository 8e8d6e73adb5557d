// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device sessions.
//!
//! A session adapts one alarm sensor at one bus address. It sits between
//! three parties:
//!
//! - the **protocol gateway**, which forwards device events and executes
//!   requests against the device
//! - the **manager**, which configures and stops the session and receives its
//!   lifecycle and battery status
//! - **subscriber applications**, which register for characteristics and
//!   receive characteristic events
//!
//! [`DeviceSession`] is the state machine itself and can be driven directly.
//! [`spawn`] hosts it on a tokio task behind a [`SessionHandle`]; timer fires
//! re-enter the same task, so state is never touched concurrently.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use alarm_sensor_adaptor::message::ManagerCommand;
//! use alarm_sensor_adaptor::protocol::GatewayEvent;
//! use alarm_sensor_adaptor::session::{DeviceSession, SessionConfig, SessionInput, SessionLinks};
//! use alarm_sensor_adaptor::state::LifecycleState;
//! use alarm_sensor_adaptor::timer::ManualScheduler;
//!
//! let clock = ManualScheduler::new();
//! let (links, mut endpoints) = SessionLinks::channel();
//! let (fire_tx, mut fires) = tokio::sync::mpsc::unbounded_channel();
//! let mut session = DeviceSession::new(
//!     SessionConfig::new("dev1", "12"),
//!     links,
//!     Arc::new(clock.clone()),
//!     fire_tx,
//! );
//!
//! session.process(SessionInput::Manager(ManagerCommand::Config { apps: vec![] }));
//! assert_eq!(session.state(), LifecycleState::Starting);
//!
//! session.process(SessionInput::Gateway(GatewayEvent::Init));
//! assert_eq!(endpoints.gateway.try_recv().unwrap().command_class.value(), 156);
//! assert_eq!(endpoints.gateway.try_recv().unwrap().command_class.value(), 128);
//!
//! clock.advance(Duration::from_secs(120));
//! while let Ok(fired) = fires.try_recv() {
//!     session.process(SessionInput::Timer(fired));
//! }
//! let poll = endpoints.gateway.try_recv().unwrap();
//! assert_eq!(poll.action.as_deref(), Some("Get"));
//! ```

mod config;
mod device_session;
mod links;
mod runner;

pub use config::{
    DEFAULT_BATTERY_CHECK_INTERVAL, DEFAULT_CONNECTED_DELAY, DEFAULT_INITIAL_BATTERY_CHECK_DELAY,
    DEFAULT_NAME, DEFAULT_SENSOR_POLL_INTERVAL, SessionConfig,
};
pub use device_session::{DeviceSession, Flow, SessionInput};
pub use links::{SessionEndpoints, SessionLinks};
pub use runner::{SessionHandle, spawn, spawn_with_scheduler};
