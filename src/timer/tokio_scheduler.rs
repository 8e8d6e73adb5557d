// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scheduler backed by tokio timers.

use std::time::Duration;

use tokio::runtime::Handle;

use super::{Scheduler, TimerCallback, TimerHandle};

/// Runs each timer as a sleeping task on a tokio runtime.
///
/// Cancelling a timer aborts its task. Under a paused test clock
/// (`tokio::time::pause`) timers follow virtual time.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Creates a scheduler that spawns onto `handle`.
    #[must_use]
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Creates a scheduler for the runtime the caller is running on.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    #[must_use]
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl Scheduler for TokioScheduler {
    fn after(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let task = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        });
        TimerHandle::new(move || task.abort())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let scheduler = TokioScheduler::current();
        let fired = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&fired);
        let _handle = scheduler.after(
            Duration::from_secs(120),
            Box::new(move || flag.store(true, Ordering::SeqCst)),
        );

        tokio::time::sleep(Duration::from_secs(119)).await;
        assert!(!fired.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let scheduler = TokioScheduler::current();
        let fired = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&fired);
        let handle = scheduler.after(
            Duration::from_secs(5),
            Box::new(move || flag.store(true, Ordering::SeqCst)),
        );
        handle.cancel();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }
}
