// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry of subscribers per characteristic.

use crate::message::{AppEnvelope, AppMessage, CharacteristicEvent};
use crate::types::{Characteristic, SubscriberId};

/// Mapping from characteristic to the subscribers interested in it.
///
/// Each characteristic keeps its subscribers in registration order with no
/// duplicates. A subscriber appears under a characteristic iff its most
/// recent registration listed that characteristic.
///
/// The registry is owned by exactly one session and mutated only from that
/// session's task, so it needs no interior locking.
///
/// # Examples
///
/// ```
/// use alarm_sensor_adaptor::subscription::SubscriptionRegistry;
/// use alarm_sensor_adaptor::types::{Characteristic, SubscriberId};
///
/// let mut registry = SubscriptionRegistry::new();
/// let app = SubscriberId::new("app1");
///
/// registry.register(&app, [Characteristic::Battery, Characteristic::Connected]);
/// registry.register(&app, [Characteristic::BinarySensor]);
///
/// assert_eq!(registry.characteristics_for(&app), vec![Characteristic::BinarySensor]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SubscriptionRegistry {
    members: [Vec<SubscriberId>; Characteristic::ALL.len()],
}

impl SubscriptionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the full membership of `subscriber`.
    ///
    /// The subscriber is first removed from every characteristic, then
    /// appended to each requested one. Repeated entries in `requested`
    /// are collapsed.
    pub fn register<I>(&mut self, subscriber: &SubscriberId, requested: I)
    where
        I: IntoIterator<Item = Characteristic>,
    {
        self.unregister_all(subscriber);

        for characteristic in requested {
            let members = &mut self.members[characteristic.index()];
            if !members.contains(subscriber) {
                members.push(subscriber.clone());
            }
        }
    }

    /// Removes `subscriber` from every characteristic.
    ///
    /// Returns true if it was registered for at least one.
    pub fn unregister_all(&mut self, subscriber: &SubscriberId) -> bool {
        let mut removed = false;
        for members in &mut self.members {
            let before = members.len();
            members.retain(|id| id != subscriber);
            removed |= members.len() != before;
        }
        removed
    }

    /// Subscribers of `characteristic`, in registration order.
    #[must_use]
    pub fn subscribers(&self, characteristic: Characteristic) -> &[SubscriberId] {
        &self.members[characteristic.index()]
    }

    /// Returns true if `subscriber` receives `characteristic`.
    #[must_use]
    pub fn is_subscribed(&self, subscriber: &SubscriberId, characteristic: Characteristic) -> bool {
        self.subscribers(characteristic).contains(subscriber)
    }

    /// Characteristics `subscriber` currently receives.
    #[must_use]
    pub fn characteristics_for(&self, subscriber: &SubscriberId) -> Vec<Characteristic> {
        Characteristic::ALL
            .into_iter()
            .filter(|c| self.is_subscribed(subscriber, *c))
            .collect()
    }

    /// Returns true if nobody is subscribed to anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.iter().all(Vec::is_empty)
    }

    /// Delivers `event` to every subscriber of its characteristic.
    ///
    /// Delivery is fire-and-forget: `deliver` is called once per subscriber
    /// in registration order and the number of recipients is returned.
    pub fn fan_out<F>(&self, event: &CharacteristicEvent, mut deliver: F) -> usize
    where
        F: FnMut(AppEnvelope),
    {
        let recipients = self.subscribers(event.characteristic());
        for to in recipients {
            deliver(AppEnvelope {
                to: to.clone(),
                message: AppMessage::Characteristic(event.clone()),
            });
        }
        recipients.len()
    }
}
