//! Voxlink API Library Crate
//!
//! This library contains the credential relay: a stateless web service whose
//! one job is to exchange the server-held OpenAI API key for a short-lived
//! client secret, so the browser never sees the long-lived credential. The
//! `api` binary is a thin wrapper around this library.

pub mod config;
pub mod handlers;
pub mod issuer;
pub mod models;
pub mod router;
pub mod state;
