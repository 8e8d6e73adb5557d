// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Virtual-clock scheduler.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;

use super::{Scheduler, TimerCallback, TimerHandle};

/// Scheduler driven by an explicit virtual clock.
///
/// Nothing fires until [`advance`](Self::advance) moves the clock past a
/// timer's deadline. Timers due at the same instant fire in the order they
/// were scheduled. Clones share the same clock.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    inner: Arc<Mutex<Clock>>,
}

#[derive(Default)]
struct Clock {
    now: Duration,
    next_seq: u64,
    pending: BTreeMap<(Duration, u64), TimerCallback>,
}

impl ManualScheduler {
    /// Creates a scheduler with its clock at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time since creation.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.inner.lock().now
    }

    /// Number of timers waiting to fire.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Moves the clock forward by `by`, firing every timer that comes due.
    ///
    /// Callbacks run without the clock locked, so they may schedule new
    /// timers; those fire within the same call if they fall inside the
    /// window. Returns the number of callbacks run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.inner.lock().now + by;
        let mut fired = 0;

        loop {
            let callback = {
                let mut clock = self.inner.lock();
                let due = clock
                    .pending
                    .first_key_value()
                    .is_some_and(|(&(at, _), _)| at <= target);
                if !due {
                    clock.now = target;
                    break;
                }
                let Some(((at, _), callback)) = clock.pending.pop_first() else {
                    break;
                };
                clock.now = at;
                callback
            };
            callback();
            fired += 1;
        }

        fired
    }
}

impl Scheduler for ManualScheduler {
    fn after(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let key = {
            let mut clock = self.inner.lock();
            let key = (clock.now + delay, clock.next_seq);
            clock.next_seq += 1;
            clock.pending.insert(key, callback);
            key
        };

        let weak: Weak<Mutex<Clock>> = Arc::downgrade(&self.inner);
        TimerHandle::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.lock().pending.remove(&key);
            }
        })
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let clock = self.inner.lock();
        f.debug_struct("ManualScheduler")
            .field("now", &clock.now)
            .field("pending", &clock.pending.len())
            .finish()
    }
}
