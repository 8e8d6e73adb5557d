// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscriber bookkeeping for a device session.
//!
//! Subscribers register by sending a service list; each registration
//! replaces whatever the subscriber asked for before. Events are fanned out
//! to the current subscribers of their characteristic only.

mod registry;

pub use registry::SubscriptionRegistry;
