//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds all shared,
//! clonable resources. The issuer sits behind a trait object so tests can
//! swap in a canned implementation.

use crate::{config::Config, issuer::ClientSecretIssuer};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub issuer: Arc<dyn ClientSecretIssuer>,
    pub config: Arc<Config>,
}
