// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Delayed-callback facility used by the polling scheduler.
//!
//! Sessions never sleep themselves; they ask a [`Scheduler`] to run a
//! callback after a delay and keep the returned [`TimerHandle`] so the
//! callback can be cancelled.
//!
//! - [`TokioScheduler`]: real timers on a tokio runtime
//! - [`ManualScheduler`]: a virtual clock advanced explicitly, for tests and
//!   simulations
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::time::Duration;
//!
//! use alarm_sensor_adaptor::timer::{ManualScheduler, Scheduler};
//!
//! let scheduler = ManualScheduler::new();
//! let fired = Arc::new(AtomicUsize::new(0));
//!
//! let counter = Arc::clone(&fired);
//! let _handle = scheduler.after(
//!     Duration::from_secs(120),
//!     Box::new(move || {
//!         counter.fetch_add(1, Ordering::SeqCst);
//!     }),
//! );
//!
//! scheduler.advance(Duration::from_secs(119));
//! assert_eq!(fired.load(Ordering::SeqCst), 0);
//!
//! scheduler.advance(Duration::from_secs(1));
//! assert_eq!(fired.load(Ordering::SeqCst), 1);
//! ```

mod manual;
mod tokio_scheduler;

use std::fmt;
use std::time::Duration;

pub use manual::ManualScheduler;
pub use tokio_scheduler::TokioScheduler;

/// Callback run when a timer fires.
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Runs callbacks after a delay.
pub trait Scheduler: Send + Sync {
    /// Schedules `callback` to run once after `delay`.
    ///
    /// The callback must not run after [`TimerHandle::cancel`] returns.
    fn after(&self, delay: Duration, callback: TimerCallback) -> TimerHandle;
}

/// Handle to a scheduled callback.
///
/// Dropping the handle does not cancel the timer.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl TimerHandle {
    /// Creates a handle that runs `cancel` when cancelled.
    #[must_use]
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Cancels the timer. Has no effect if it already fired.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}
