//! Axum Handlers for the REST API
//!
//! The relay has a single real route: exchange the server-held API key for an
//! ephemeral client secret. Failures are mapped to a generic 500 body; the
//! interesting detail is logged server-side and never echoed to the caller.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::error;

use crate::{
    issuer::IssuerError,
    models::{ErrorResponse, TokenResponse},
    state::AppState,
};

pub enum ApiError {
    /// The server-side secret is missing; the route cannot work until it is
    /// configured. No upstream call was attempted.
    Configuration(IssuerError),
    /// The upstream issuance call failed or returned an unusable body.
    Issuance(IssuerError),
}

impl From<IssuerError> for ApiError {
    fn from(err: IssuerError) -> Self {
        match err {
            IssuerError::MissingCredential => Self::Configuration(err),
            other => Self::Issuance(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Configuration(err) => {
                error!("Token route misconfigured: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: err.to_string(),
                    }),
                )
                    .into_response()
            }
            ApiError::Issuance(err) => {
                // Status and upstream body stay in the log only.
                match &err {
                    IssuerError::Upstream { status, body } => {
                        error!(status = *status, body = %body, "upstream issuance call failed")
                    }
                    other => error!(error = %other, "ephemeral key issuance failed"),
                }
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "Failed to fetch ephemeral key from OpenAI.".to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

/// Exchange the server-held API key for an ephemeral client token.
#[utoipa::path(
    post,
    path = "/api/get-token",
    responses(
        (status = 200, description = "Ephemeral token issued", body = TokenResponse),
        (status = 500, description = "Missing server credential or upstream failure", body = ErrorResponse)
    )
)]
pub async fn get_token(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state.issuer.issue().await?;
    Ok(Json(TokenResponse { token }))
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/healthz",
    responses((status = 200, description = "Service is up"))
)]
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}
