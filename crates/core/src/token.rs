//! Ephemeral token acquisition.
//!
//! The controller never sees the long-lived API key; it asks a [`TokenSource`]
//! for a short-lived credential minted by the relay. The production source is
//! [`RelayTokenSource`], a thin reqwest client for the relay's single route.

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;

/// A short-lived credential for one connection attempt.
///
/// The token is opaque and is dropped as soon as the connect call settles.
#[derive(Clone, PartialEq, Eq)]
pub struct EphemeralToken(String);

impl EphemeralToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw credential, for handing to the session transport.
    pub fn secret(&self) -> &str {
        &self.0
    }
}

// Keep the credential out of logs.
impl fmt::Debug for EphemeralToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EphemeralToken(..)")
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    /// The relay answered with a non-success status.
    #[error("Failed to fetch token from server ({0})")]
    Status(u16),
    /// The relay was unreachable.
    #[error("Failed to fetch token from server: {0}")]
    Transport(String),
    /// The relay answered 200 but the body carried no usable token.
    #[error("Token not found in server response.")]
    MissingToken,
}

/// Anything that can mint an ephemeral token for a connection attempt.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_token(&self) -> Result<EphemeralToken, TokenError>;
}

#[derive(Deserialize)]
struct TokenResponse {
    token: Option<String>,
}

/// Production [`TokenSource`] backed by the credential relay.
pub struct RelayTokenSource {
    http: reqwest::Client,
    endpoint: String,
}

impl RelayTokenSource {
    /// `base_url` is the relay's origin, e.g. `http://localhost:3001`.
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: format!("{}/api/get-token", base_url.as_ref().trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl TokenSource for RelayTokenSource {
    async fn fetch_token(&self) -> Result<EphemeralToken, TokenError> {
        let response = self
            .http
            .post(&self.endpoint)
            .send()
            .await
            .map_err(|e| TokenError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TokenError::Status(status.as_u16()));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|_| TokenError::MissingToken)?;
        match body.token {
            Some(token) if !token.is_empty() => Ok(EphemeralToken::new(token)),
            _ => Err(TokenError::MissingToken),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::post};
    use serde_json::{Value, json};

    /// Serves a stub relay on an ephemeral port and returns its origin.
    async fn serve_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn debug_never_prints_the_credential() {
        let token = EphemeralToken::new("ek_super_secret");
        assert_eq!(format!("{token:?}"), "EphemeralToken(..)");
    }

    #[tokio::test]
    async fn fetches_token_from_relay() {
        let router = Router::new().route(
            "/api/get-token",
            post(|| async { Json(json!({ "token": "ek_abc123" })) }),
        );
        let origin = serve_stub(router).await;

        let token = RelayTokenSource::new(&origin).fetch_token().await.unwrap();
        assert_eq!(token.secret(), "ek_abc123");
    }

    #[tokio::test]
    async fn non_success_status_is_reported_with_the_code() {
        let router = Router::new().route(
            "/api/get-token",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to fetch ephemeral key from OpenAI." })),
                )
            }),
        );
        let origin = serve_stub(router).await;

        let err = RelayTokenSource::new(&origin)
            .fetch_token()
            .await
            .unwrap_err();
        assert_eq!(err, TokenError::Status(500));
        assert_eq!(
            err.to_string(),
            "Failed to fetch token from server (500)"
        );
    }

    #[tokio::test]
    async fn missing_token_field_is_an_error() {
        let router = Router::new().route(
            "/api/get-token",
            post(|| async { Json(Value::Object(Default::default())) }),
        );
        let origin = serve_stub(router).await;

        let err = RelayTokenSource::new(&origin)
            .fetch_token()
            .await
            .unwrap_err();
        assert_eq!(err, TokenError::MissingToken);
    }

    #[tokio::test]
    async fn unreachable_relay_is_a_transport_error() {
        // Port 1 on localhost refuses connections.
        let err = RelayTokenSource::new("http://127.0.0.1:1")
            .fetch_token()
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::Transport(_)));
    }
}
