//! Upstream client secret issuance.
//!
//! The relay never mints credentials itself; it asks the upstream realtime
//! issuance endpoint for one, authenticating with the server-held API key.
//! The seam is a trait so handlers can be tested with a canned issuer and the
//! production implementation can be tested against a local stub server.

use crate::config::Config;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Errors from the issuance path. `Upstream` keeps the full upstream body for
/// server-side diagnostics; callers only ever see a generic message, and no
/// request header or credential content is echoed back to them.
#[derive(Debug, thiserror::Error)]
pub enum IssuerError {
    #[error("OPENAI_API_KEY is not set on the server.")]
    MissingCredential,
    #[error("client secret issuance failed with status {status}")]
    Upstream { status: u16, body: String },
    #[error("failed to reach the issuance endpoint: {0}")]
    Transport(String),
    #[error("malformed issuance response: {0}")]
    MalformedResponse(String),
}

/// Anything that can mint an ephemeral client secret.
#[async_trait]
pub trait ClientSecretIssuer: Send + Sync {
    async fn issue(&self) -> Result<String, IssuerError>;
}

#[derive(Serialize)]
struct IssuanceRequest<'a> {
    session: IssuanceSession<'a>,
}

#[derive(Serialize)]
struct IssuanceSession<'a> {
    r#type: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct IssuanceResponse {
    value: Option<String>,
}

/// Production issuer backed by the OpenAI realtime client-secret endpoint.
///
/// The model and session type are server-fixed; nothing from the caller is
/// forwarded upstream.
pub struct OpenAiSecretIssuer {
    http: reqwest::Client,
    api_key: Option<String>,
    issuer_url: String,
    model: String,
}

impl OpenAiSecretIssuer {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.openai_api_key.clone(),
            issuer_url: config.issuer_url.clone(),
            model: config.realtime_model.clone(),
        }
    }
}

#[async_trait]
impl ClientSecretIssuer for OpenAiSecretIssuer {
    async fn issue(&self) -> Result<String, IssuerError> {
        // Checked per request so the route degrades, not the process.
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(IssuerError::MissingCredential)?;

        let request = IssuanceRequest {
            session: IssuanceSession {
                r#type: "realtime",
                model: &self.model,
            },
        };

        let response = self
            .http
            .post(&self.issuer_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| IssuerError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IssuerError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let body: IssuanceResponse = response
            .json()
            .await
            .map_err(|e| IssuerError::MalformedResponse(e.to_string()))?;
        match body.value {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(IssuerError::MalformedResponse(
                "missing `value` field".to_string(),
            )),
        }
    }
}
