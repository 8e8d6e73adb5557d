// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outbound channels of a session.

use tokio::sync::mpsc;

use crate::error::SessionError;
use crate::message::{AppEnvelope, ManagerMessage};
use crate::protocol::GatewayRequest;

/// Senders a session uses to reach its collaborators.
#[derive(Debug, Clone)]
pub struct SessionLinks {
    manager: mpsc::UnboundedSender<ManagerMessage>,
    gateway: mpsc::UnboundedSender<GatewayRequest>,
    apps: mpsc::UnboundedSender<AppEnvelope>,
}

/// Receiving ends matching a [`SessionLinks`], held by the host's transport.
#[derive(Debug)]
pub struct SessionEndpoints {
    /// Status messages for the manager.
    pub manager: mpsc::UnboundedReceiver<ManagerMessage>,
    /// Requests for the protocol gateway.
    pub gateway: mpsc::UnboundedReceiver<GatewayRequest>,
    /// Messages for subscriber applications.
    pub apps: mpsc::UnboundedReceiver<AppEnvelope>,
}

impl SessionLinks {
    /// Wraps existing senders.
    #[must_use]
    pub fn new(
        manager: mpsc::UnboundedSender<ManagerMessage>,
        gateway: mpsc::UnboundedSender<GatewayRequest>,
        apps: mpsc::UnboundedSender<AppEnvelope>,
    ) -> Self {
        Self {
            manager,
            gateway,
            apps,
        }
    }

    /// Creates links together with their receiving ends.
    #[must_use]
    pub fn channel() -> (Self, SessionEndpoints) {
        let (manager, manager_rx) = mpsc::unbounded_channel();
        let (gateway, gateway_rx) = mpsc::unbounded_channel();
        let (apps, apps_rx) = mpsc::unbounded_channel();

        (
            Self::new(manager, gateway, apps),
            SessionEndpoints {
                manager: manager_rx,
                gateway: gateway_rx,
                apps: apps_rx,
            },
        )
    }

    pub(crate) fn notify_manager(&self, message: ManagerMessage) {
        if self.manager.send(message).is_err() {
            tracing::debug!("manager channel closed, status dropped");
        }
    }

    pub(crate) fn request(&self, request: GatewayRequest) -> Result<(), SessionError> {
        self.gateway
            .send(request)
            .map_err(|_| SessionError::GatewayUnavailable)
    }

    pub(crate) fn deliver(&self, envelope: AppEnvelope) {
        if let Err(err) = self.apps.send(envelope) {
            tracing::debug!(subscriber = %err.0.to, "subscriber channel closed, message dropped");
        }
    }
}
