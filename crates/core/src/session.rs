//! The session transport seam.
//!
//! Everything the realtime SDK actually does (audio capture, playback, codecs,
//! turn-taking) lives behind [`RealtimeSession`]. The controller only needs
//! three things from a handle: connect with a token, close, and a stream of
//! asynchronous [`SessionEvent`]s that outlives the connect call.

use crate::{profile::AgentDescriptor, token::EphemeralToken};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Opaque failure reported by the session transport.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct SessionError {
    pub message: String,
}

impl SessionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Events a live session delivers outside the connect/close call sequence.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A runtime fault on the session. May arrive at any time after connect.
    Error(String),
    /// A transcription of the user's speech.
    Transcript { text: String, is_final: bool },
}

/// A single realtime session handle. At most one exists per controller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RealtimeSession: Send {
    /// Opens the realtime connection, authenticating with the ephemeral token.
    async fn connect(&mut self, token: &EphemeralToken) -> Result<(), SessionError>;

    /// Releases the session. Must be safe to call on a never-connected handle.
    async fn close(&mut self) -> Result<(), SessionError>;
}

/// Constructs session handles bound to an agent descriptor and model id.
///
/// The returned receiver is the handle's event stream; it stays live for the
/// whole lifetime of the handle and closes when the handle is dropped.
#[cfg_attr(test, mockall::automock)]
pub trait SessionFactory: Send + Sync {
    fn create(
        &self,
        agent: &AgentDescriptor,
        model: &str,
    ) -> Result<(Box<dyn RealtimeSession>, mpsc::UnboundedReceiver<SessionEvent>), SessionError>;
}
