//! Connection status model.
//!
//! All user-visible status is derived, never authoritative: the controller and
//! the per-session event forwarder both emit [`ControllerEvent`]s into a single
//! channel, and one reducer folds those events into a [`StatusSnapshot`]. The
//! presentation layer only ever observes snapshots, so the `connecting` and
//! `connected` flags can never disagree with the phase that produced them.

use crate::{profile::ProfileError, token::TokenError};

/// The phases of one session lifecycle.
///
/// `Failed` is absorbing with respect to the start sequence: any step that
/// fails reports the fault and abandons the remaining steps. A later `start`
/// or `shutdown` is the only way out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Idle,
    TokenRequested,
    AgentCreated,
    SessionCreated,
    Connecting,
    Connected,
    Failed,
}

impl ConnectionPhase {
    /// True while a start sequence is between its first step and its outcome.
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            Self::TokenRequested | Self::AgentCreated | Self::SessionCreated | Self::Connecting
        )
    }
}

/// Everything that can go wrong between pressing start and holding a live
/// session, plus runtime faults delivered after connection.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionFault {
    #[error("{0}")]
    TokenAcquisition(#[from] TokenError),
    #[error("Failed to create agent. {0}")]
    AgentConstruction(#[from] ProfileError),
    #[error("Failed to create session. {0}")]
    SessionConstruction(String),
    #[error("Connection failed. {0}")]
    Connection(String),
    #[error("A session error occurred. {0}")]
    Runtime(String),
}

/// Events fed into the status reducer.
#[derive(Debug, Clone)]
pub(crate) enum ControllerEvent {
    Phase(ConnectionPhase),
    Fault(SessionFault),
    TranscriptCleared,
    Transcript { text: String, is_final: bool },
}

/// The derived view handed to the presentation layer.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub phase: ConnectionPhase,
    pub status: String,
    pub connecting: bool,
    pub connected: bool,
    pub transcript: String,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        StatusState::default().snapshot()
    }
}

/// The reducer's accumulated state.
#[derive(Debug, Default)]
pub(crate) struct StatusState {
    phase: Option<ConnectionPhase>,
    fault: Option<SessionFault>,
    transcript: String,
    pending_line: String,
}

impl StatusState {
    /// Folds one event into the state. Last write wins: a runtime fault can
    /// overwrite `Connected` at any time, and a fresh start overwrites a
    /// stale fault.
    pub(crate) fn apply(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::Phase(phase) => {
                self.phase = Some(phase);
                if phase != ConnectionPhase::Failed {
                    self.fault = None;
                }
            }
            ControllerEvent::Fault(fault) => {
                self.fault = Some(fault);
                self.phase = Some(ConnectionPhase::Failed);
            }
            ControllerEvent::TranscriptCleared => {
                self.transcript.clear();
                self.pending_line.clear();
            }
            ControllerEvent::Transcript { text, is_final } => {
                if is_final {
                    // Finals replace the accumulated deltas for the turn.
                    self.transcript.push_str(&text);
                    self.transcript.push('\n');
                    self.pending_line.clear();
                } else {
                    self.pending_line.push_str(&text);
                }
            }
        }
    }

    pub(crate) fn snapshot(&self) -> StatusSnapshot {
        let phase = self.phase.unwrap_or(ConnectionPhase::Idle);
        let status = match phase {
            ConnectionPhase::Idle => "Not Connected".to_string(),
            ConnectionPhase::TokenRequested => "Requesting ephemeral token...".to_string(),
            ConnectionPhase::AgentCreated => "Token acquired. Creating agent...".to_string(),
            ConnectionPhase::SessionCreated => "Agent created. Creating session...".to_string(),
            ConnectionPhase::Connecting => "Connecting to session...".to_string(),
            ConnectionPhase::Connected => "Connected".to_string(),
            ConnectionPhase::Failed => match &self.fault {
                Some(fault) => format!("Error: {fault}"),
                None => "Error: unknown failure".to_string(),
            },
        };
        let mut transcript = self.transcript.clone();
        transcript.push_str(&self.pending_line);
        StatusSnapshot {
            phase,
            status,
            connecting: phase.is_in_flight(),
            connected: phase == ConnectionPhase::Connected,
            transcript,
        }
    }
}
