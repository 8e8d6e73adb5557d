// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device session lifecycle.
//!
//! [`LifecycleState`] is the coarse state reported to the manager on every
//! transition; [`LifecycleEvent`] is what drives it.
//!
//! # Examples
//!
//! ```
//! use alarm_sensor_adaptor::state::{LifecycleEvent, LifecycleState};
//!
//! let mut state = LifecycleState::default();
//! assert_eq!(state, LifecycleState::Stopped);
//!
//! for event in [LifecycleEvent::Configure, LifecycleEvent::AppInit] {
//!     if let Some(next) = state.next(event).unwrap() {
//!         state = next;
//!     }
//! }
//! assert!(state.is_running());
//! ```

mod lifecycle;

pub use lifecycle::{LifecycleEvent, LifecycleState};
