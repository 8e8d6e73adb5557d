// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The device session state machine.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::error::{Error, SessionError};
use crate::message::{
    AppEnvelope, AppMessage, AppRequest, CharacteristicEvent, CharacteristicValue, ManagerCommand,
    ManagerMessage,
};
use crate::polling::{PollingScheduler, TimerFired, TimerKind};
use crate::protocol::{GatewayEvent, GatewayRequest, Report, translate};
use crate::state::{LifecycleEvent, LifecycleState};
use crate::subscription::SubscriptionRegistry;
use crate::timer::Scheduler;
use crate::types::{AlarmState, BatteryLevel, SessionId, SubscriberId};

use super::{SessionConfig, SessionLinks};

/// Everything a session reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionInput {
    /// Decoded event from the protocol gateway.
    Gateway(GatewayEvent),
    /// Undecoded gateway event as received from the transport.
    GatewayJson(String),
    /// Message from a subscriber application.
    App(AppRequest),
    /// A subscriber went away.
    AppDisconnected(SubscriberId),
    /// Command from the manager.
    Manager(ManagerCommand),
    /// A fault condition was detected by the host.
    Fault(String),
    /// The fault was resolved.
    ClearError,
    /// One of the session's timers fired.
    Timer(TimerFired),
}

/// Whether the session keeps running after an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep processing inputs.
    Continue,
    /// The session has been torn down.
    Stop,
}

/// State of one device session.
///
/// All mutation happens through [`handle`](Self::handle) /
/// [`process`](Self::process) on a single sequential context; the session
/// exclusively owns its [`SubscriptionRegistry`] and [`PollingScheduler`].
/// [`spawn`](super::spawn) runs it on a dedicated tokio task, but it can be
/// driven directly, e.g. with a [`ManualScheduler`](crate::timer::ManualScheduler).
pub struct DeviceSession {
    config: SessionConfig,
    state: LifecycleState,
    last_invalidate: Instant,
    registry: SubscriptionRegistry,
    polling: PollingScheduler,
    links: SessionLinks,
    connected_announced: bool,
    span: tracing::Span,
}

impl DeviceSession {
    /// Creates a stopped session.
    ///
    /// Timer fires are posted on `fire_tx`; the owner must feed them back as
    /// [`SessionInput::Timer`].
    #[must_use]
    pub fn new(
        config: SessionConfig,
        links: SessionLinks,
        scheduler: Arc<dyn Scheduler>,
        fire_tx: mpsc::UnboundedSender<TimerFired>,
    ) -> Self {
        let span = tracing::info_span!(
            "device_session",
            id = %config.id,
            address = %config.address,
            name = %config.display_name(),
        );
        let polling = PollingScheduler::new(
            scheduler,
            fire_tx,
            config.battery_check_interval,
            config.sensor_poll_interval,
        );

        Self {
            config,
            state: LifecycleState::Stopped,
            last_invalidate: Instant::now(),
            registry: SubscriptionRegistry::new(),
            polling,
            links,
            connected_announced: false,
            span,
        }
    }

    /// Session identifier.
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.config.id
    }

    /// Device address on the protocol bus.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.config.address
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// When the lifecycle state last changed.
    #[must_use]
    pub fn last_invalidate_time(&self) -> Instant {
        self.last_invalidate
    }

    /// Current subscriptions.
    #[must_use]
    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// Pending timers.
    #[must_use]
    pub fn polling(&self) -> &PollingScheduler {
        &self.polling
    }

    pub(crate) fn span(&self) -> &tracing::Span {
        &self.span
    }

    /// Returns true once the session has been torn down.
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.polling.is_closed()
    }

    /// Handles one input.
    ///
    /// # Errors
    ///
    /// Returns the contained error for inputs that were dropped: decode
    /// failures, unsupported subscriber commands, refused transitions and
    /// gateway delivery failures. The session stays usable in every case.
    pub fn handle(&mut self, input: SessionInput) -> Result<Flow, Error> {
        let span = self.span.clone();
        let _guard = span.enter();
        self.dispatch(input)
    }

    /// Handles one input, logging any contained error as a warning.
    pub fn process(&mut self, input: SessionInput) -> Flow {
        let span = self.span.clone();
        let _guard = span.enter();
        match self.dispatch(input) {
            Ok(flow) => flow,
            Err(err) => {
                tracing::warn!(error = %err, "input dropped");
                Flow::Continue
            }
        }
    }

    /// Cancels every timer and moves to `Stopped`.
    ///
    /// No timer can be armed once this has started. Returns the number of
    /// timers cancelled; calling it again is a no-op.
    pub fn teardown(&mut self) -> usize {
        let span = self.span.clone();
        let _guard = span.enter();
        self.shut_down()
    }

    fn dispatch(&mut self, input: SessionInput) -> Result<Flow, Error> {
        if self.is_torn_down() {
            tracing::debug!(?input, "session torn down, input ignored");
            return Ok(Flow::Stop);
        }

        match input {
            SessionInput::Gateway(event) => self.on_gateway_event(&event)?,
            SessionInput::GatewayJson(text) => {
                let event = GatewayEvent::parse(&text)?;
                self.on_gateway_event(&event)?;
            }
            SessionInput::App(request) => self.on_app_request(request)?,
            SessionInput::AppDisconnected(subscriber) => {
                if self.registry.unregister_all(&subscriber) {
                    tracing::debug!(%subscriber, "subscriber removed");
                }
            }
            SessionInput::Manager(ManagerCommand::Config { apps }) => {
                tracing::debug!(apps = apps.len(), "configuration received");
                self.transition(LifecycleEvent::Configure)?;
            }
            SessionInput::Manager(ManagerCommand::Stop) => {
                self.shut_down();
                return Ok(Flow::Stop);
            }
            SessionInput::Fault(reason) => self.fault(&reason)?,
            SessionInput::ClearError => self.transition(LifecycleEvent::ClearError)?,
            SessionInput::Timer(fired) => self.on_timer(fired)?,
        }

        Ok(Flow::Continue)
    }

    fn shut_down(&mut self) -> usize {
        if self.polling.is_closed() {
            return 0;
        }
        let cancelled = self.polling.close();
        tracing::debug!(cancelled, "timers cancelled");

        if let Err(err) = self.transition(LifecycleEvent::Stop) {
            tracing::warn!(error = %err, "stop transition refused");
        }
        cancelled
    }

    /// Applies a lifecycle event, notifying the manager on change.
    fn transition(&mut self, event: LifecycleEvent) -> Result<(), SessionError> {
        let Some(next) = self.state.next(event)? else {
            tracing::debug!(state = %self.state, %event, "no state change");
            return Ok(());
        };

        tracing::debug!(from = %self.state, to = %next, %event, "state changed");
        self.state = next;
        self.last_invalidate = Instant::now();
        self.links
            .notify_manager(ManagerMessage::state(self.config.id.clone(), next));
        Ok(())
    }

    fn fault(&mut self, reason: &str) -> Result<(), SessionError> {
        tracing::warn!(reason, "fault reported");
        self.transition(LifecycleEvent::Fault)
    }

    /// Hands a request to the gateway; a closed gateway is a fault.
    fn issue(&mut self, request: GatewayRequest) -> Result<(), SessionError> {
        tracing::trace!(command_class = %request.command_class, method = ?request.request, "gateway request");
        if let Err(err) = self.links.request(request) {
            if let Err(refused) = self.fault("protocol gateway unavailable") {
                tracing::debug!(error = %refused, "fault not applied");
            }
            return Err(err);
        }
        Ok(())
    }

    // =========================================================================
    // Protocol gateway
    // =========================================================================

    fn on_gateway_event(&mut self, event: &GatewayEvent) -> Result<(), Error> {
        match translate(event)? {
            Report::Initialized => self.on_device_init()?,
            Report::Alarm(state) => self.on_alarm(state),
            Report::Battery(level) => self.on_battery(level),
        }
        Ok(())
    }

    fn on_device_init(&mut self) -> Result<(), SessionError> {
        tracing::debug!("device initialised");
        let id = self.config.id.clone();

        self.issue(GatewayRequest::sensor_state_query(
            id.clone(),
            &self.config.address,
        ))?;
        self.issue(GatewayRequest::battery_query(id, &self.config.address))?;

        self.polling.arm(
            TimerKind::BatteryCheck,
            self.config.initial_battery_check_delay,
        );
        self.polling
            .arm(TimerKind::SensorPoll, self.config.sensor_poll_interval);

        // A sensor this simple has no link status of its own.
        if !self.connected_announced {
            self.polling
                .arm(TimerKind::ConnectedAnnouncement, self.config.connected_delay);
        }
        Ok(())
    }

    fn on_alarm(&mut self, state: AlarmState) {
        tracing::debug!(alarm = %state, "alarm report");
        self.publish(CharacteristicValue::BinarySensor(state));
    }

    fn on_battery(&mut self, level: BatteryLevel) {
        tracing::info!(battery = %level, "battery level");
        self.publish(CharacteristicValue::Battery(level));
        self.links
            .notify_manager(ManagerMessage::battery_level(self.config.id.clone(), level));
    }

    fn publish(&self, value: CharacteristicValue) -> usize {
        let event = CharacteristicEvent::new(self.config.id.clone(), value, Utc::now());
        self.registry
            .fan_out(&event, |envelope| self.links.deliver(envelope))
    }

    // =========================================================================
    // Timers
    // =========================================================================

    fn on_timer(&mut self, fired: TimerFired) -> Result<(), SessionError> {
        if !self.polling.accept(fired) {
            tracing::trace!(timer = %fired.kind, "stale timer fire ignored");
            return Ok(());
        }

        match fired.kind.command_class() {
            Some(command_class) => {
                let request =
                    GatewayRequest::poll(self.config.id.clone(), &self.config.address, command_class);
                self.issue(request)?;
                self.polling.reschedule(fired.kind);
            }
            None => {
                self.connected_announced = true;
                let delivered = self.publish(CharacteristicValue::Connected(true));
                tracing::debug!(delivered, "connected announced");
            }
        }
        Ok(())
    }

    // =========================================================================
    // Subscribers
    // =========================================================================

    fn on_app_request(&mut self, request: AppRequest) -> Result<(), SessionError> {
        match request {
            AppRequest::Init { id } => {
                tracing::debug!(subscriber = %id, "subscriber handshake");
                self.links.deliver(AppEnvelope {
                    to: id,
                    message: AppMessage::service_offer(&self.config.name, self.config.id.clone()),
                });
                self.transition(LifecycleEvent::AppInit)
            }
            AppRequest::Service { id, service } => {
                self.registry
                    .register(&id, service.iter().map(|entry| entry.characteristic));
                tracing::debug!(
                    subscriber = %id,
                    characteristics = ?self.registry.characteristics_for(&id),
                    "subscriptions replaced"
                );
                Ok(())
            }
            AppRequest::Command { id, data: None } => {
                Err(SessionError::CommandWithoutData { subscriber: id })
            }
            AppRequest::Command { id, data: Some(_) } => {
                Err(SessionError::UnsupportedCommand { subscriber: id })
            }
        }
    }
}

impl std::fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("id", &self.config.id)
            .field("address", &self.config.address)
            .field("state", &self.state)
            .field("registry", &self.registry)
            .field("polling", &self.polling)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::error::DecodeError;
    use crate::message::{ManagerStatus, ServiceEntry};
    use crate::polling::TimerState;
    use crate::protocol::{CommandClass, RequestMethod};
    use crate::session::SessionEndpoints;
    use crate::timer::ManualScheduler;
    use crate::types::Characteristic;

    const SECOND: Duration = Duration::from_secs(1);
    const SIX_HOURS: Duration = Duration::from_secs(21_600);

    struct Harness {
        session: DeviceSession,
        clock: ManualScheduler,
        fires: mpsc::UnboundedReceiver<TimerFired>,
        ends: SessionEndpoints,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_config(SessionConfig::new("dev1", "12").with_name("everspring_1"))
        }

        fn with_config(config: SessionConfig) -> Self {
            let clock = ManualScheduler::new();
            let (links, ends) = SessionLinks::channel();
            let (fire_tx, fires) = mpsc::unbounded_channel();
            let session = DeviceSession::new(config, links, Arc::new(clock.clone()), fire_tx);
            Self {
                session,
                clock,
                fires,
                ends,
            }
        }

        /// Configured, handshaken and with `app` subscribed to everything.
        fn running() -> Self {
            let mut h = Self::new();
            h.input(SessionInput::Manager(ManagerCommand::Config { apps: vec![] }))
                .unwrap();
            h.input(app_init("app1")).unwrap();
            h.input(register("app1", &Characteristic::ALL)).unwrap();
            h.drain();
            h
        }

        fn input(&mut self, input: SessionInput) -> Result<Flow, Error> {
            self.session.handle(input)
        }

        fn advance(&mut self, by: Duration) {
            self.clock.advance(by);
            while let Ok(fired) = self.fires.try_recv() {
                self.session.process(SessionInput::Timer(fired));
            }
        }

        fn gateway(&mut self) -> Vec<GatewayRequest> {
            drain(&mut self.ends.gateway)
        }

        fn manager(&mut self) -> Vec<ManagerMessage> {
            drain(&mut self.ends.manager)
        }

        fn apps(&mut self) -> Vec<AppEnvelope> {
            drain(&mut self.ends.apps)
        }

        fn drain(&mut self) {
            self.gateway();
            self.manager();
            self.apps();
        }
    }

    fn drain<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> Vec<T> {
        let mut out = Vec::new();
        while let Ok(item) = rx.try_recv() {
            out.push(item);
        }
        out
    }

    fn app_init(id: &str) -> SessionInput {
        SessionInput::App(AppRequest::Init {
            id: SubscriberId::new(id),
        })
    }

    fn register(id: &str, characteristics: &[Characteristic]) -> SessionInput {
        SessionInput::App(AppRequest::Service {
            id: SubscriberId::new(id),
            service: characteristics.iter().copied().map(ServiceEntry::new).collect(),
        })
    }

    fn data(command_class: CommandClass, payload: serde_json::Value) -> SessionInput {
        SessionInput::Gateway(GatewayEvent::data(command_class, payload))
    }

    fn states(messages: &[ManagerMessage]) -> Vec<LifecycleState> {
        messages
            .iter()
            .filter_map(|m| match m.status {
                ManagerStatus::State { state } => Some(state),
                ManagerStatus::BatteryLevel { .. } => None,
            })
            .collect()
    }

    fn values(envelopes: &[AppEnvelope]) -> Vec<(String, CharacteristicValue)> {
        envelopes
            .iter()
            .filter_map(|e| {
                e.message
                    .as_characteristic()
                    .map(|ev| (e.to.to_string(), ev.data()))
            })
            .collect()
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    #[test]
    fn starts_stopped() {
        let h = Harness::new();
        assert_eq!(h.session.state(), LifecycleState::Stopped);
        assert_eq!(h.session.address(), "12");
        assert_eq!(h.session.polling().pending_count(), 0);
    }

    #[test]
    fn configure_then_handshake_reaches_running() {
        let mut h = Harness::new();

        h.input(SessionInput::Manager(ManagerCommand::Config { apps: vec![] }))
            .unwrap();
        assert_eq!(h.session.state(), LifecycleState::Starting);

        h.input(app_init("app1")).unwrap();
        assert_eq!(h.session.state(), LifecycleState::Running);

        let manager = h.manager();
        assert_eq!(
            states(&manager),
            vec![LifecycleState::Starting, LifecycleState::Running]
        );
        assert!(manager.iter().all(|m| m.id == SessionId::new("dev1")));
    }

    #[test]
    fn handshake_reply_describes_smoke_detector() {
        let mut h = Harness::new();
        h.input(SessionInput::Manager(ManagerCommand::Config { apps: vec![] }))
            .unwrap();
        h.input(app_init("app7")).unwrap();

        let apps = h.apps();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].to, SubscriberId::new("app7"));
        assert_eq!(
            serde_json::to_value(&apps[0].message).unwrap(),
            json!({
                "content": "service",
                "name": "everspring_1",
                "id": "dev1",
                "status": "ok",
                "service": [{"characteristic": "binary_sensor", "interval": 0, "type": "smoke_detector"}],
            })
        );
    }

    #[test]
    fn handshake_before_configuration_is_refused_but_answered() {
        let mut h = Harness::new();

        let err = h.input(app_init("app1")).unwrap_err();
        assert!(matches!(
            err,
            Error::Session(SessionError::InvalidTransition {
                from: LifecycleState::Stopped,
                event: LifecycleEvent::AppInit,
            })
        ));
        assert_eq!(h.session.state(), LifecycleState::Stopped);
        assert_eq!(h.apps().len(), 1);
        assert!(h.manager().is_empty());
    }

    #[test]
    fn redelivered_configuration_is_silent() {
        let mut h = Harness::running();

        h.input(SessionInput::Manager(ManagerCommand::Config {
            apps: vec![SubscriberId::new("app2")],
        }))
        .unwrap();

        assert_eq!(h.session.state(), LifecycleState::Running);
        assert!(h.manager().is_empty());
    }

    #[test]
    fn fault_and_clear_error() {
        let mut h = Harness::running();
        let before = h.session.last_invalidate_time();

        h.input(SessionInput::Fault("sensor tamper".to_string()))
            .unwrap();
        assert_eq!(h.session.state(), LifecycleState::Error);
        assert!(h.session.last_invalidate_time() >= before);

        h.input(SessionInput::ClearError).unwrap();
        assert_eq!(h.session.state(), LifecycleState::Running);

        assert_eq!(
            states(&h.manager()),
            vec![LifecycleState::Error, LifecycleState::Running]
        );
    }

    #[test]
    fn fault_before_running_is_refused() {
        let mut h = Harness::new();
        h.input(SessionInput::Manager(ManagerCommand::Config { apps: vec![] }))
            .unwrap();
        h.drain();

        assert!(h.input(SessionInput::Fault("x".to_string())).is_err());
        assert_eq!(h.session.state(), LifecycleState::Starting);
        assert!(h.manager().is_empty());
    }

    #[test]
    fn clear_error_without_error_is_refused() {
        let mut h = Harness::running();
        assert!(h.input(SessionInput::ClearError).is_err());
        assert_eq!(h.session.state(), LifecycleState::Running);
    }

    // -------------------------------------------------------------------------
    // Device init and polling
    // -------------------------------------------------------------------------

    #[test]
    fn init_queries_sensor_and_battery() {
        let mut h = Harness::running();

        h.input(SessionInput::Gateway(GatewayEvent::Init)).unwrap();

        let requests = h.gateway();
        assert_eq!(
            requests,
            vec![
                GatewayRequest::sensor_state_query(SessionId::new("dev1"), "12"),
                GatewayRequest::battery_query(SessionId::new("dev1"), "12"),
            ]
        );
        assert!(requests.iter().all(|r| r.request == RequestMethod::Get));
    }

    #[test]
    fn init_arms_every_timer() {
        let mut h = Harness::running();
        h.input(SessionInput::Gateway(GatewayEvent::Init)).unwrap();

        let polling = h.session.polling();
        assert_eq!(polling.state(TimerKind::BatteryCheck), TimerState::Scheduled);
        assert_eq!(polling.state(TimerKind::SensorPoll), TimerState::Scheduled);
        assert_eq!(
            polling.state(TimerKind::ConnectedAnnouncement),
            TimerState::Scheduled
        );
    }

    #[test]
    fn first_battery_check_after_short_delay() {
        let mut h = Harness::running();
        h.input(SessionInput::Gateway(GatewayEvent::Init)).unwrap();
        h.drain();

        h.advance(Duration::from_secs(119));
        assert!(h.gateway().is_empty());

        h.advance(SECOND);
        assert_eq!(
            h.gateway(),
            vec![GatewayRequest::poll(
                SessionId::new("dev1"),
                "12",
                CommandClass::BATTERY
            )]
        );
    }

    #[test]
    fn battery_check_recurs_every_interval() {
        let mut h = Harness::running();
        h.input(SessionInput::Gateway(GatewayEvent::Init)).unwrap();
        h.advance(Duration::from_secs(120));
        h.drain();

        for _ in 0..3 {
            h.advance(SIX_HOURS - SECOND);
            let early: Vec<_> = h
                .gateway()
                .into_iter()
                .filter(|r| r.command_class == CommandClass::BATTERY)
                .collect();
            assert!(early.is_empty());

            h.advance(SECOND);
            let due: Vec<_> = h
                .gateway()
                .into_iter()
                .filter(|r| r.command_class == CommandClass::BATTERY)
                .collect();
            assert_eq!(due.len(), 1);
            assert_eq!(due[0].action.as_deref(), Some("Get"));
        }
    }

    #[test]
    fn sensor_poll_recurs_every_interval() {
        let config = SessionConfig::new("dev1", "12")
            .with_sensor_poll_interval(Duration::from_secs(600))
            .with_battery_check_interval(Duration::from_secs(100_000))
            .with_initial_battery_check_delay(Duration::from_secs(100_000));
        let mut h = Harness::with_config(config);
        h.input(SessionInput::Gateway(GatewayEvent::Init)).unwrap();
        h.drain();

        for _ in 0..4 {
            h.advance(Duration::from_secs(600));
            assert_eq!(
                h.gateway(),
                vec![GatewayRequest::poll(
                    SessionId::new("dev1"),
                    "12",
                    CommandClass::SENSOR_ALARM
                )]
            );
        }
    }

    #[test]
    fn connected_announced_once_to_connected_subscribers() {
        let mut h = Harness::running();
        h.input(register("app2", &[Characteristic::Battery])).unwrap();
        h.input(register("app3", &[Characteristic::Connected])).unwrap();
        h.input(SessionInput::Gateway(GatewayEvent::Init)).unwrap();
        h.drain();

        h.advance(Duration::from_secs(119));
        assert!(h.apps().is_empty());

        h.advance(SECOND);
        assert_eq!(
            values(&h.apps()),
            vec![
                ("app1".to_string(), CharacteristicValue::Connected(true)),
                ("app3".to_string(), CharacteristicValue::Connected(true)),
            ]
        );

        h.advance(SIX_HOURS * 4);
        let later: Vec<_> = values(&h.apps())
            .into_iter()
            .filter(|(_, v)| v.characteristic() == Characteristic::Connected)
            .collect();
        assert!(later.is_empty());
    }

    #[test]
    fn reinit_does_not_reannounce_or_duplicate_timers() {
        let mut h = Harness::running();
        h.input(SessionInput::Gateway(GatewayEvent::Init)).unwrap();
        h.advance(Duration::from_secs(120));
        h.drain();

        h.input(SessionInput::Gateway(GatewayEvent::Init)).unwrap();
        assert_eq!(h.session.polling().pending_count(), 2);
        assert_eq!(
            h.session.polling().state(TimerKind::ConnectedAnnouncement),
            TimerState::Idle
        );

        h.advance(Duration::from_secs(120));
        let battery_polls = h
            .gateway()
            .into_iter()
            .filter(|r| r.request == RequestMethod::Post)
            .count();
        assert_eq!(battery_polls, 1);
        assert!(h.apps().is_empty());
    }

    #[test]
    fn reinit_before_announcement_announces_once() {
        let mut h = Harness::running();
        h.input(SessionInput::Gateway(GatewayEvent::Init)).unwrap();
        h.advance(Duration::from_secs(60));
        h.input(SessionInput::Gateway(GatewayEvent::Init)).unwrap();
        h.drain();

        h.advance(Duration::from_secs(60));
        assert!(h.apps().is_empty());

        h.advance(Duration::from_secs(60));
        assert_eq!(values(&h.apps()).len(), 1);
    }

    // -------------------------------------------------------------------------
    // Reports
    // -------------------------------------------------------------------------

    #[test]
    fn alarm_report_reaches_binary_sensor_subscribers_only() {
        let mut h = Harness::running();
        h.input(register("app2", &[Characteristic::Battery])).unwrap();
        h.input(register("app3", &[Characteristic::BinarySensor])).unwrap();

        h.input(data(CommandClass::SENSOR_ALARM, json!({"value": true})))
            .unwrap();

        assert_eq!(
            values(&h.apps()),
            vec![
                (
                    "app1".to_string(),
                    CharacteristicValue::BinarySensor(AlarmState::On)
                ),
                (
                    "app3".to_string(),
                    CharacteristicValue::BinarySensor(AlarmState::On)
                ),
            ]
        );
        assert!(h.manager().is_empty());
    }

    #[test]
    fn alarm_off_report() {
        let mut h = Harness::running();
        h.input(data(CommandClass::SENSOR_ALARM, json!({"value": 0})))
            .unwrap();

        let apps = h.apps();
        assert_eq!(apps.len(), 1);
        let json = serde_json::to_value(&apps[0].message).unwrap();
        assert_eq!(json["characteristic"], "binary_sensor");
        assert_eq!(json["data"], "off");
        assert!(json["timeStamp"].as_f64().is_some_and(|t| t > 0.0));
    }

    #[test]
    fn battery_report_goes_to_subscribers_and_manager() {
        let mut h = Harness::running();

        h.input(data(CommandClass::BATTERY, json!({"last": {"value": 73}})))
            .unwrap();

        assert_eq!(
            values(&h.apps()),
            vec![(
                "app1".to_string(),
                CharacteristicValue::Battery(BatteryLevel::new(73))
            )]
        );
        assert_eq!(
            h.manager(),
            vec![ManagerMessage::battery_level(
                SessionId::new("dev1"),
                BatteryLevel::new(73)
            )]
        );
    }

    #[test]
    fn battery_report_reaches_manager_without_subscribers() {
        let mut h = Harness::new();
        h.input(data(CommandClass::BATTERY, json!({"last": {"value": 10}})))
            .unwrap();

        assert!(h.apps().is_empty());
        assert_eq!(h.manager().len(), 1);
    }

    #[test]
    fn malformed_reports_produce_no_output() {
        let cases = [
            data(CommandClass::SENSOR_ALARM, json!({})),
            data(CommandClass::SENSOR_ALARM, serde_json::Value::Null),
            data(CommandClass::BATTERY, json!({"value": 40})),
            data(CommandClass::BATTERY, json!({"last": {"value": "high"}})),
            data(CommandClass::new(49), json!({"value": 21.5})),
            SessionInput::GatewayJson(r#"{"content":"data"}"#.to_string()),
            SessionInput::GatewayJson("not json".to_string()),
        ];

        for input in cases {
            let mut h = Harness::running();
            let result = h.input(input.clone());
            assert!(
                matches!(result, Err(Error::Decode(_))),
                "expected decode error for {input:?}, got {result:?}"
            );
            assert!(h.apps().is_empty());
            assert!(h.manager().is_empty());
            assert!(h.gateway().is_empty());
            assert_eq!(h.session.state(), LifecycleState::Running);
        }
    }

    #[test]
    fn unsupported_command_class_is_reported() {
        let mut h = Harness::running();
        let err = h
            .input(data(CommandClass::new(113), json!({"value": 1})))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Decode(DecodeError::UnsupportedCommandClass(cc)) if cc.value() == 113
        ));
    }

    #[test]
    fn raw_gateway_json_is_decoded() {
        let mut h = Harness::running();
        h.input(SessionInput::GatewayJson(
            r#"{"content":"data","commandClass":"156","data":{"value":255}}"#.to_string(),
        ))
        .unwrap();

        assert_eq!(
            values(&h.apps()),
            vec![(
                "app1".to_string(),
                CharacteristicValue::BinarySensor(AlarmState::On)
            )]
        );
    }

    // -------------------------------------------------------------------------
    // Subscribers
    // -------------------------------------------------------------------------

    #[test]
    fn registration_replaces_previous_set() {
        let mut h = Harness::running();
        let app1 = SubscriberId::new("app1");

        h.input(register("app1", &[Characteristic::Battery])).unwrap();
        assert_eq!(
            h.session.registry().characteristics_for(&app1),
            vec![Characteristic::Battery]
        );

        h.input(data(CommandClass::SENSOR_ALARM, json!({"value": true})))
            .unwrap();
        assert!(h.apps().is_empty());
    }

    #[test]
    fn disconnected_subscriber_receives_nothing() {
        let mut h = Harness::running();
        h.input(SessionInput::AppDisconnected(SubscriberId::new("app1")))
            .unwrap();
        assert!(h.session.registry().is_empty());

        h.input(data(CommandClass::BATTERY, json!({"last": {"value": 50}})))
            .unwrap();
        assert!(h.apps().is_empty());
    }

    #[test]
    fn commands_are_not_understood() {
        let mut h = Harness::running();

        let without = h.input(SessionInput::App(AppRequest::Command {
            id: SubscriberId::new("app1"),
            data: None,
        }));
        assert!(matches!(
            without,
            Err(Error::Session(SessionError::CommandWithoutData { .. }))
        ));

        let with = h.input(SessionInput::App(AppRequest::Command {
            id: SubscriberId::new("app1"),
            data: Some(json!({"switch": "on"})),
        }));
        assert!(matches!(
            with,
            Err(Error::Session(SessionError::UnsupportedCommand { .. }))
        ));

        assert_eq!(h.session.state(), LifecycleState::Running);
        assert!(h.apps().is_empty());
        assert!(h.manager().is_empty());
        assert!(h.gateway().is_empty());
    }

    // -------------------------------------------------------------------------
    // Teardown
    // -------------------------------------------------------------------------

    #[test]
    fn stop_cancels_timers_and_reports_stopped() {
        let mut h = Harness::running();
        h.input(SessionInput::Gateway(GatewayEvent::Init)).unwrap();
        h.drain();

        let flow = h
            .input(SessionInput::Manager(ManagerCommand::Stop))
            .unwrap();
        assert_eq!(flow, Flow::Stop);
        assert!(h.session.is_torn_down());
        assert_eq!(h.session.polling().pending_count(), 0);
        assert_eq!(h.clock.pending(), 0);
        assert_eq!(states(&h.manager()), vec![LifecycleState::Stopped]);
    }

    #[test]
    fn no_requests_after_teardown_for_any_delay() {
        for delay_secs in [1_u64, 60, 120, 121, 21_600, 86_400] {
            let config = SessionConfig::new("dev1", "12")
                .with_initial_battery_check_delay(Duration::from_secs(delay_secs))
                .with_connected_delay(Duration::from_secs(delay_secs))
                .with_sensor_poll_interval(Duration::from_secs(delay_secs))
                .with_battery_check_interval(Duration::from_secs(delay_secs));
            let mut h = Harness::with_config(config);
            h.input(SessionInput::Manager(ManagerCommand::Config { apps: vec![] }))
                .unwrap();
            h.input(register("app1", &Characteristic::ALL)).unwrap();
            h.input(SessionInput::Gateway(GatewayEvent::Init)).unwrap();

            h.advance(Duration::from_secs(delay_secs / 2));
            assert!(h.session.teardown() > 0);
            h.drain();

            h.advance(Duration::from_secs(delay_secs * 10));
            assert!(h.gateway().is_empty(), "request after teardown ({delay_secs}s)");
            assert!(h.apps().is_empty(), "event after teardown ({delay_secs}s)");
        }
    }

    #[test]
    fn fire_queued_before_teardown_is_dropped() {
        let mut h = Harness::running();
        h.input(SessionInput::Gateway(GatewayEvent::Init)).unwrap();
        h.drain();

        // Let the timers fire but do not feed the fires back yet.
        h.clock.advance(Duration::from_secs(120));
        h.session.teardown();

        while let Ok(fired) = h.fires.try_recv() {
            assert_eq!(h.session.process(SessionInput::Timer(fired)), Flow::Stop);
        }
        assert!(h.gateway().is_empty());
        assert!(h.apps().is_empty());
    }

    #[test]
    fn inputs_after_teardown_are_ignored() {
        let mut h = Harness::running();
        h.session.teardown();
        h.drain();

        let flow = h.input(SessionInput::Gateway(GatewayEvent::Init)).unwrap();
        assert_eq!(flow, Flow::Stop);
        assert!(h.gateway().is_empty());
        assert_eq!(h.session.polling().pending_count(), 0);
        assert_eq!(h.session.teardown(), 0);
    }

    #[test]
    fn closed_gateway_faults_running_session() {
        let mut h = Harness::running();
        h.ends.gateway.close();

        let err = h
            .input(SessionInput::Gateway(GatewayEvent::Init))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Session(SessionError::GatewayUnavailable)
        ));
        assert_eq!(h.session.state(), LifecycleState::Error);
        assert_eq!(states(&h.manager()), vec![LifecycleState::Error]);
        assert_eq!(h.session.polling().pending_count(), 0);
    }
}
