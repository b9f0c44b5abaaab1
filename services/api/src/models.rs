//! API Models
//!
//! Wire-level request/response bodies for the relay, annotated for OpenAPI
//! generation with `utoipa`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Successful token exchange: the ephemeral client secret, ready for the
/// browser to use as its session credential.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct TokenResponse {
    #[schema(example = "ek_abc123")]
    pub token: String,
}

/// Generic failure body. Deliberately opaque: upstream diagnostics stay in
/// the server log.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct ErrorResponse {
    pub error: String,
}
