//! The session controller.
//!
//! Drives one realtime voice session from token acquisition through
//! connection and teardown. The controller owns the only live session handle
//! and serializes start sequences: `start` takes `&mut self` and additionally
//! refuses to run while a previous sequence is still in flight, so a second
//! start can never overlap another's token fetch or connect call.
//!
//! Status is never mutated in place. Every step and every asynchronous
//! session fault is sent as a [`ControllerEvent`] into one reducer task,
//! which publishes derived [`StatusSnapshot`]s on a watch channel.

use crate::{
    profile::{AgentDescriptor, AgentProfile},
    session::{RealtimeSession, SessionEvent, SessionFactory},
    status::{ConnectionPhase, ControllerEvent, SessionFault, StatusSnapshot, StatusState},
    token::TokenSource,
};
use std::sync::Arc;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{error, info, warn};

/// Model identifier the demo binds sessions to.
pub const DEFAULT_REALTIME_MODEL: &str = "gpt-4o-mini-realtime-preview";

pub struct SessionController {
    profile: AgentProfile,
    model: String,
    tokens: Arc<dyn TokenSource>,
    factory: Arc<dyn SessionFactory>,
    /// The single owned session slot. Replaced, never duplicated.
    session: Option<Box<dyn RealtimeSession>>,
    /// Forwards the live handle's event stream into the reducer. Lives as
    /// long as the handle; aborted when the handle is released.
    listener: Option<JoinHandle<()>>,
    /// Synchronously-updated mirror of the phase, used to guard `start`.
    /// The watch channel lags behind it by however long the reducer takes.
    phase: ConnectionPhase,
    events: mpsc::UnboundedSender<ControllerEvent>,
    status_rx: watch::Receiver<StatusSnapshot>,
}

impl SessionController {
    /// Builds a controller with the default agent profile.
    ///
    /// Must be called from within a tokio runtime; the status reducer is
    /// spawned here and runs until the controller and all listeners drop.
    pub fn new(
        tokens: Arc<dyn TokenSource>,
        factory: Arc<dyn SessionFactory>,
        model: impl Into<String>,
    ) -> Self {
        let (events, mut events_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(StatusSnapshot::default());
        tokio::spawn(async move {
            let mut state = StatusState::default();
            while let Some(event) = events_rx.recv().await {
                state.apply(event);
                if status_tx.send(state.snapshot()).is_err() {
                    break;
                }
            }
        });
        Self {
            profile: AgentProfile::default(),
            model: model.into(),
            tokens,
            factory,
            session: None,
            listener: None,
            phase: ConnectionPhase::Idle,
            events,
            status_rx,
        }
    }

    /// The latest derived status.
    pub fn status(&self) -> StatusSnapshot {
        self.status_rx.borrow().clone()
    }

    /// A watch receiver for the presentation layer to follow.
    pub fn watch_status(&self) -> watch::Receiver<StatusSnapshot> {
        self.status_rx.clone()
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    /// Replaces the agent persona. Inert while connecting or connected;
    /// edits apply to the next start's agent construction.
    pub fn set_profile(&mut self, profile: AgentProfile) {
        if self.profile_locked() {
            warn!("profile edit ignored while a session is connecting or connected");
            return;
        }
        self.profile = profile;
    }

    pub fn set_agent_name(&mut self, name: impl Into<String>) {
        if self.profile_locked() {
            warn!("agent name edit ignored while a session is connecting or connected");
            return;
        }
        self.profile.name = name.into();
    }

    pub fn set_agent_instructions(&mut self, instructions: impl Into<String>) {
        if self.profile_locked() {
            warn!("instruction edit ignored while a session is connecting or connected");
            return;
        }
        self.profile.instructions = instructions.into();
    }

    fn profile_locked(&self) -> bool {
        self.phase.is_in_flight() || self.phase == ConnectionPhase::Connected
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Runs the full start sequence: release any previous handle, fetch a
    /// token, freeze the profile into an agent descriptor, construct the
    /// session, wire its event stream, and connect.
    ///
    /// Every failure is converted to a status update; nothing propagates.
    pub async fn start(&mut self) {
        if self.phase.is_in_flight() {
            warn!("start requested while a start sequence is in flight; ignoring");
            return;
        }

        if self.session.is_some() {
            info!("an active session exists; releasing it before starting a new one");
            self.release_session().await;
        }
        let _ = self.events.send(ControllerEvent::TranscriptCleared);

        self.transition(ConnectionPhase::TokenRequested);
        let token = match self.tokens.fetch_token().await {
            Ok(token) => token,
            Err(e) => {
                self.fail(SessionFault::TokenAcquisition(e));
                return;
            }
        };

        self.transition(ConnectionPhase::AgentCreated);
        let agent = match AgentDescriptor::new(&self.profile) {
            Ok(agent) => agent,
            Err(e) => {
                self.fail(SessionFault::AgentConstruction(e));
                return;
            }
        };

        self.transition(ConnectionPhase::SessionCreated);
        let (session, session_events) = match self.factory.create(&agent, &self.model) {
            Ok(pair) => pair,
            Err(e) => {
                self.fail(SessionFault::SessionConstruction(e.message));
                return;
            }
        };

        // The slot is the only place a handle lives; the old one was taken
        // above, so this can never shadow a live session.
        let handle = self.session.insert(session);

        // Wire the runtime event stream before connecting, so faults raised
        // during the connect call itself are not lost.
        let forward = self.events.clone();
        self.listener = Some(tokio::spawn(forward_session_events(session_events, forward)));

        self.phase = ConnectionPhase::Connecting;
        let _ = self
            .events
            .send(ControllerEvent::Phase(ConnectionPhase::Connecting));

        match handle.connect(&token).await {
            Ok(()) => {
                info!(agent = %agent.name, "session connected");
                self.transition(ConnectionPhase::Connected);
            }
            Err(e) => {
                // The handle stays stored; it is simply not connected.
                self.fail(SessionFault::Connection(e.message));
            }
        }
    }

    /// Teardown: unconditionally releases any live handle and returns to
    /// idle. Safe to call with no session; release failures are logged,
    /// never surfaced.
    pub async fn shutdown(&mut self) {
        if self.session.is_some() {
            info!("releasing live session on teardown");
        }
        self.release_session().await;
        self.transition(ConnectionPhase::Idle);
    }

    async fn release_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.close().await {
                warn!(error = %e, "failed to close previous session");
            }
        }
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }

    fn transition(&mut self, phase: ConnectionPhase) {
        self.phase = phase;
        let _ = self.events.send(ControllerEvent::Phase(phase));
    }

    fn fail(&mut self, fault: SessionFault) {
        error!(%fault, "start sequence aborted");
        self.phase = ConnectionPhase::Failed;
        let _ = self.events.send(ControllerEvent::Fault(fault));
    }

    #[cfg(test)]
    fn force_phase(&mut self, phase: ConnectionPhase) {
        self.phase = phase;
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

/// Drains one session's event stream into the reducer. Runs for the whole
/// lifetime of the handle; ends when the session drops its sender or when
/// the handle is released.
async fn forward_session_events(
    mut events: mpsc::UnboundedReceiver<SessionEvent>,
    sink: mpsc::UnboundedSender<ControllerEvent>,
) {
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::Error(message) => {
                error!(%message, "session reported a runtime error");
                let _ = sink.send(ControllerEvent::Fault(SessionFault::Runtime(message)));
            }
            SessionEvent::Transcript { text, is_final } => {
                let _ = sink.send(ControllerEvent::Transcript { text, is_final });
            }
        }
    }
}
