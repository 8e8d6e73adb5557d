// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hosting a session on a tokio task.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::error::SessionError;
use crate::message::{AppRequest, ManagerCommand};
use crate::polling::TimerFired;
use crate::protocol::GatewayEvent;
use crate::state::LifecycleState;
use crate::timer::{Scheduler, TokioScheduler};
use crate::types::{SessionId, SubscriberId};

use super::{DeviceSession, Flow, SessionConfig, SessionInput, SessionLinks};

/// Spawns a session on the current tokio runtime with real timers.
///
/// # Panics
///
/// Panics when called outside a tokio runtime.
///
/// # Examples
///
/// ```no_run
/// use alarm_sensor_adaptor::message::ManagerCommand;
/// use alarm_sensor_adaptor::protocol::GatewayEvent;
/// use alarm_sensor_adaptor::session::{self, SessionConfig, SessionLinks};
///
/// # async fn example() -> Result<(), alarm_sensor_adaptor::error::SessionError> {
/// let (links, mut endpoints) = SessionLinks::channel();
/// let handle = session::spawn(SessionConfig::new("dev1", "12"), links);
///
/// handle.manager_command(ManagerCommand::Config { apps: vec![] })?;
/// handle.gateway_event(GatewayEvent::Init)?;
///
/// while let Some(request) = endpoints.gateway.recv().await {
///     println!("to gateway: {}", serde_json::to_string(&request).unwrap());
/// }
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn spawn(config: SessionConfig, links: SessionLinks) -> SessionHandle {
    spawn_with_scheduler(config, links, Arc::new(TokioScheduler::current()))
}

/// Spawns a session on the current tokio runtime using `scheduler` for its
/// timers.
///
/// # Panics
///
/// Panics when called outside a tokio runtime.
#[must_use]
pub fn spawn_with_scheduler(
    config: SessionConfig,
    links: SessionLinks,
    scheduler: Arc<dyn Scheduler>,
) -> SessionHandle {
    let id = config.id.clone();
    let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
    let (fire_tx, fire_rx) = mpsc::unbounded_channel();

    let session = DeviceSession::new(config, links, scheduler, fire_tx);
    let (state_tx, state_rx) = watch::channel(session.state());

    let span = session.span().clone();
    let task = tokio::spawn(run(session, inbox_rx, fire_rx, state_tx).instrument(span));

    SessionHandle {
        id,
        inbox: inbox_tx,
        state: state_rx,
        task,
    }
}

async fn run(
    mut session: DeviceSession,
    mut inbox: mpsc::UnboundedReceiver<SessionInput>,
    mut fires: mpsc::UnboundedReceiver<TimerFired>,
    state_tx: watch::Sender<LifecycleState>,
) {
    tracing::debug!("session task started");

    loop {
        let input = tokio::select! {
            Some(fired) = fires.recv() => SessionInput::Timer(fired),
            input = inbox.recv() => {
                let Some(input) = input else {
                    tracing::debug!("inbox closed, tearing down");
                    session.teardown();
                    publish_state(&state_tx, session.state());
                    break;
                };
                input
            }
        };

        let flow = session.process(input);
        publish_state(&state_tx, session.state());

        if flow == Flow::Stop {
            break;
        }
    }

    tracing::debug!("session task finished");
}

fn publish_state(tx: &watch::Sender<LifecycleState>, state: LifecycleState) {
    tx.send_if_modified(|current| {
        if *current == state {
            false
        } else {
            *current = state;
            true
        }
    });
}

/// Handle to a spawned session.
///
/// Inputs are queued and handled in order by the session task. Dropping the
/// handle (and every sender obtained from
/// [`input_sender`](Self::input_sender)) tears the session down.
#[derive(Debug)]
pub struct SessionHandle {
    id: SessionId,
    inbox: mpsc::UnboundedSender<SessionInput>,
    state: watch::Receiver<LifecycleState>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Session identifier.
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Queues an input for the session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ChannelClosed`] once the session has stopped.
    pub fn send(&self, input: SessionInput) -> Result<(), SessionError> {
        self.inbox
            .send(input)
            .map_err(|_| SessionError::ChannelClosed(format!("session {} has stopped", self.id)))
    }

    /// Returns a sender feeding the same session, for transport tasks.
    #[must_use]
    pub fn input_sender(&self) -> mpsc::UnboundedSender<SessionInput> {
        self.inbox.clone()
    }

    /// Queues a decoded gateway event.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ChannelClosed`] once the session has stopped.
    pub fn gateway_event(&self, event: GatewayEvent) -> Result<(), SessionError> {
        self.send(SessionInput::Gateway(event))
    }

    /// Queues a raw gateway event; it is decoded on the session task.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ChannelClosed`] once the session has stopped.
    pub fn gateway_json(&self, json: impl Into<String>) -> Result<(), SessionError> {
        self.send(SessionInput::GatewayJson(json.into()))
    }

    /// Queues a subscriber request.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ChannelClosed`] once the session has stopped.
    pub fn app_request(&self, request: AppRequest) -> Result<(), SessionError> {
        self.send(SessionInput::App(request))
    }

    /// Reports that a subscriber disconnected.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ChannelClosed`] once the session has stopped.
    pub fn app_disconnected(&self, subscriber: SubscriberId) -> Result<(), SessionError> {
        self.send(SessionInput::AppDisconnected(subscriber))
    }

    /// Queues a manager command.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ChannelClosed`] once the session has stopped.
    pub fn manager_command(&self, command: ManagerCommand) -> Result<(), SessionError> {
        self.send(SessionInput::Manager(command))
    }

    /// Reports a fault condition.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ChannelClosed`] once the session has stopped.
    pub fn fault(&self, reason: impl Into<String>) -> Result<(), SessionError> {
        self.send(SessionInput::Fault(reason.into()))
    }

    /// Reports that the fault condition was resolved.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ChannelClosed`] once the session has stopped.
    pub fn clear_error(&self) -> Result<(), SessionError> {
        self.send(SessionInput::ClearError)
    }

    /// Lifecycle state as of the last handled input.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Returns a receiver notified on every lifecycle change.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<LifecycleState> {
        self.state.clone()
    }

    /// Returns true once the session task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the session and waits for its task to exit.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ChannelClosed`] if the session task panicked.
    pub async fn shutdown(self) -> Result<(), SessionError> {
        // Already stopped if the send fails; just reap the task.
        let _ = self.inbox.send(SessionInput::Manager(ManagerCommand::Stop));
        self.task
            .await
            .map_err(|err| SessionError::ChannelClosed(format!("session {} task failed: {err}", self.id)))
    }
}
