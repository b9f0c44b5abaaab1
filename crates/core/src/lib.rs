//! Voxlink Core Library
//!
//! This crate contains the client-side half of the voice demo: the session
//! controller that drives a realtime voice session from token acquisition
//! through connection and teardown. The actual audio transport lives behind
//! the [`session::RealtimeSession`] trait; the credential relay is reached
//! through the [`token::TokenSource`] trait. Both seams exist so the
//! controller can be exercised deterministically without a network.

pub mod controller;
pub mod profile;
pub mod session;
pub mod status;
pub mod token;

pub use controller::SessionController;
pub use profile::{AgentDescriptor, AgentProfile, ProfileError};
pub use session::{RealtimeSession, SessionError, SessionEvent, SessionFactory};
pub use status::{ConnectionPhase, SessionFault, StatusSnapshot};
pub use token::{EphemeralToken, RelayTokenSource, TokenError, TokenSource};
