// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polling timers of a device session.
//!
//! A battery-powered sensor only listens during short wake-up windows, so
//! the session keeps its view fresh by queuing periodic requests the device
//! picks up on its next wake. Three timers are involved:
//!
//! | Kind | Lifecycle | On fire |
//! |------|-----------|---------|
//! | [`TimerKind::BatteryCheck`] | recurring | battery `Get` request |
//! | [`TimerKind::SensorPoll`] | recurring | sensor alarm `Get` request |
//! | [`TimerKind::ConnectedAnnouncement`] | one-shot | `connected = true` event |
//!
//! Fires are not handled inside the timer callback. The callback only posts
//! a [`TimerFired`] on the session's channel; the session then calls
//! [`PollingScheduler::accept`], issues the request and calls
//! [`PollingScheduler::reschedule`], in that order.
//!
//! Every arm gets a fresh [`TimerToken`]. A fire is accepted only if its
//! token is the one currently pending for its kind and the scheduler has not
//! been closed, so a fire that was already queued when its timer got
//! replaced or cancelled is dropped.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::protocol::CommandClass;
use crate::timer::{Scheduler, TimerHandle};

/// The timers owned by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Periodic battery query.
    BatteryCheck,
    /// Periodic sensor state query.
    SensorPoll,
    /// Delayed `connected` announcement after device init.
    ConnectedAnnouncement,
}

impl TimerKind {
    /// Returns true for timers that re-arm after every fire.
    #[must_use]
    pub const fn is_recurring(self) -> bool {
        matches!(self, Self::BatteryCheck | Self::SensorPoll)
    }

    /// Command class queried when a recurring timer fires.
    #[must_use]
    pub const fn command_class(self) -> Option<CommandClass> {
        match self {
            Self::BatteryCheck => Some(CommandClass::BATTERY),
            Self::SensorPoll => Some(CommandClass::SENSOR_ALARM),
            Self::ConnectedAnnouncement => None,
        }
    }

    /// Short name for log records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BatteryCheck => "battery_check",
            Self::SensorPoll => "sensor_poll",
            Self::ConnectedAnnouncement => "connected_announcement",
        }
    }
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one arming of a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

/// Notification that a timer's delay elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    /// Which timer fired.
    pub kind: TimerKind,
    /// The arming it belongs to.
    pub token: TimerToken,
}

/// Observable state of one timer kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// Not armed.
    Idle,
    /// Armed and waiting to fire.
    Scheduled,
}

struct PendingTimer {
    token: TimerToken,
    handle: TimerHandle,
}

/// Owns the pending timers of one session.
pub struct PollingScheduler {
    scheduler: Arc<dyn Scheduler>,
    fire_tx: mpsc::UnboundedSender<TimerFired>,
    battery_check_interval: Duration,
    sensor_poll_interval: Duration,
    pending: HashMap<TimerKind, PendingTimer>,
    next_token: u64,
    closed: bool,
}

impl PollingScheduler {
    /// Creates a scheduler that posts fires on `fire_tx`.
    #[must_use]
    pub fn new(
        scheduler: Arc<dyn Scheduler>,
        fire_tx: mpsc::UnboundedSender<TimerFired>,
        battery_check_interval: Duration,
        sensor_poll_interval: Duration,
    ) -> Self {
        Self {
            scheduler,
            fire_tx,
            battery_check_interval,
            sensor_poll_interval,
            pending: HashMap::new(),
            next_token: 0,
            closed: false,
        }
    }

    /// Arms `kind` to fire after `delay`, replacing any pending arming.
    ///
    /// Returns false once the scheduler is closed.
    pub fn arm(&mut self, kind: TimerKind, delay: Duration) -> bool {
        if self.closed {
            return false;
        }
        self.cancel(kind);

        let token = TimerToken(self.next_token);
        self.next_token += 1;

        let tx = self.fire_tx.clone();
        let handle = self.scheduler.after(
            delay,
            Box::new(move || {
                // The session may already be gone; nothing to deliver to then.
                let _ = tx.send(TimerFired { kind, token });
            }),
        );

        tracing::trace!(timer = %kind, ?delay, "timer armed");
        self.pending.insert(kind, PendingTimer { token, handle });
        true
    }

    /// Accepts a fire if it belongs to the current arming of its kind.
    ///
    /// An accepted timer moves back to [`TimerState::Idle`]. Stale fires and
    /// fires after [`close`](Self::close) are rejected.
    pub fn accept(&mut self, fired: TimerFired) -> bool {
        if self.closed {
            return false;
        }
        match self.pending.get(&fired.kind) {
            Some(pending) if pending.token == fired.token => {
                self.pending.remove(&fired.kind);
                true
            }
            _ => false,
        }
    }

    /// Re-arms a recurring timer for its configured interval.
    ///
    /// Call this after issuing the request for the accepted fire. Returns
    /// false for one-shot kinds and once closed.
    pub fn reschedule(&mut self, kind: TimerKind) -> bool {
        match self.interval(kind) {
            Some(interval) => self.arm(kind, interval),
            None => false,
        }
    }

    /// Configured interval of a recurring kind.
    #[must_use]
    pub fn interval(&self, kind: TimerKind) -> Option<Duration> {
        match kind {
            TimerKind::BatteryCheck => Some(self.battery_check_interval),
            TimerKind::SensorPoll => Some(self.sensor_poll_interval),
            TimerKind::ConnectedAnnouncement => None,
        }
    }

    /// Cancels the pending arming of `kind`, if any.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        match self.pending.remove(&kind) {
            Some(pending) => {
                pending.handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Refuses further arming and cancels every pending timer.
    ///
    /// Returns the number of timers cancelled.
    pub fn close(&mut self) -> usize {
        self.closed = true;
        let cancelled = self.pending.len();
        for (_, pending) in self.pending.drain() {
            pending.handle.cancel();
        }
        cancelled
    }

    /// Returns true after [`close`](Self::close).
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// State of one timer kind.
    #[must_use]
    pub fn state(&self, kind: TimerKind) -> TimerState {
        if self.pending.contains_key(&kind) {
            TimerState::Scheduled
        } else {
            TimerState::Idle
        }
    }

    /// Number of armed timers.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl fmt::Debug for PollingScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollingScheduler")
            .field("pending", &self.pending.keys().collect::<Vec<_>>())
            .field("battery_check_interval", &self.battery_check_interval)
            .field("sensor_poll_interval", &self.sensor_poll_interval)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}
