//! Handles the real-time WebSocket connection to OpenAI for voice sessions.
//!
//! This is the production [`SessionFactory`] behind the controller: each
//! handle opens the realtime WebSocket with the ephemeral token as its only
//! credential, pushes a `session.update` carrying the agent instructions, and
//! forwards upstream error and transcription events into the session event
//! stream.

use async_trait::async_trait;
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use tokio::{net::TcpStream, sync::mpsc, task::JoinHandle};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{client::IntoClientRequest, protocol::Message as WsMessage},
};
use tracing::{error, info, warn};
use voxlink_core::{
    AgentDescriptor, EphemeralToken, RealtimeSession, SessionError, SessionEvent, SessionFactory,
};

const REALTIME_URL: &str = "wss://api.openai.com/v1/realtime";

// --- Local OpenAI Realtime Wire Types (for encapsulation) ---
mod wire {
    use serde::{Deserialize, Serialize};

    #[derive(Serialize)]
    pub(super) struct SessionUpdate<'a> {
        pub r#type: &'static str,
        pub session: SessionConfig<'a>,
    }

    #[derive(Serialize)]
    pub(super) struct SessionConfig<'a> {
        pub instructions: &'a str,
    }

    impl<'a> SessionUpdate<'a> {
        pub fn new(instructions: &'a str) -> Self {
            Self {
                r#type: "session.update",
                session: SessionConfig { instructions },
            }
        }
    }

    #[derive(Deserialize, Debug)]
    #[serde(tag = "type")]
    pub(super) enum ServerEvent {
        #[serde(rename = "error")]
        Error { error: ErrorDetail },
        #[serde(rename = "conversation.item.input_audio_transcription.delta")]
        TranscriptionDelta { delta: String },
        #[serde(rename = "conversation.item.input_audio_transcription.completed")]
        TranscriptionCompleted { transcript: String },
        #[serde(other)]
        Other,
    }

    #[derive(Deserialize, Debug)]
    pub(super) struct ErrorDetail {
        pub message: String,
    }
}

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Produces OpenAI-backed session handles.
pub struct OpenAiRealtimeFactory {
    base_url: String,
}

impl Default for OpenAiRealtimeFactory {
    fn default() -> Self {
        Self {
            base_url: REALTIME_URL.to_string(),
        }
    }
}

impl OpenAiRealtimeFactory {
    /// Overrides the realtime endpoint, for pointing at a local stub.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl SessionFactory for OpenAiRealtimeFactory {
    fn create(
        &self,
        agent: &AgentDescriptor,
        model: &str,
    ) -> Result<(Box<dyn RealtimeSession>, mpsc::UnboundedReceiver<SessionEvent>), SessionError>
    {
        let (events, events_rx) = mpsc::unbounded_channel();
        let session = OpenAiRealtimeSession {
            agent: agent.clone(),
            model: model.to_string(),
            base_url: self.base_url.clone(),
            events,
            writer: None,
            reader: None,
        };
        Ok((Box::new(session), events_rx))
    }
}

/// One realtime connection. Created cold; `connect` performs the handshake.
pub struct OpenAiRealtimeSession {
    agent: AgentDescriptor,
    model: String,
    base_url: String,
    events: mpsc::UnboundedSender<SessionEvent>,
    writer: Option<WsSink>,
    reader: Option<JoinHandle<()>>,
}

#[async_trait]
impl RealtimeSession for OpenAiRealtimeSession {
    async fn connect(&mut self, token: &EphemeralToken) -> Result<(), SessionError> {
        let url = format!("{}?model={}", self.base_url, self.model);
        let mut request = url
            .into_client_request()
            .map_err(|e| SessionError::new(e.to_string()))?;
        request.headers_mut().insert(
            "Authorization",
            format!("Bearer {}", token.secret())
                .parse()
                .map_err(|_| SessionError::new("invalid token for Authorization header"))?,
        );
        request.headers_mut().insert(
            "OpenAI-Beta",
            "realtime=v1"
                .parse()
                .map_err(|_| SessionError::new("invalid OpenAI-Beta header"))?,
        );

        let (ws_stream, _) = connect_async(request)
            .await
            .map_err(|e| SessionError::new(e.to_string()))?;
        info!(model = %self.model, "connected to realtime endpoint");
        let (mut ws_tx, ws_rx) = ws_stream.split();

        // Apply the agent persona before anything else happens on the session.
        let update = wire::SessionUpdate::new(&self.agent.instructions);
        let payload =
            serde_json::to_string(&update).map_err(|e| SessionError::new(e.to_string()))?;
        ws_tx
            .send(WsMessage::Text(payload))
            .await
            .map_err(|e| SessionError::new(e.to_string()))?;

        self.writer = Some(ws_tx);
        self.reader = Some(tokio::spawn(read_loop(ws_rx, self.events.clone())));
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        if let Some(mut writer) = self.writer.take() {
            // Best effort; the peer may already be gone.
            if let Err(e) = writer.send(WsMessage::Close(None)).await {
                warn!(error = %e, "failed to send close frame");
            }
        }
        Ok(())
    }
}

/// Forwards upstream events into the session event stream until the
/// connection ends. Runs for the lifetime of the handle.
async fn read_loop(mut ws_rx: WsSource, events: mpsc::UnboundedSender<SessionEvent>) {
    while let Some(message) = ws_rx.next().await {
        match message {
            Ok(WsMessage::Text(text)) => {
                let event = match serde_json::from_str::<wire::ServerEvent>(&text) {
                    Ok(event) => event,
                    Err(e) => {
                        warn!(error = %e, "unparseable realtime event");
                        continue;
                    }
                };
                match event {
                    wire::ServerEvent::Error { error: detail } => {
                        error!(message = %detail.message, "realtime session error");
                        let _ = events.send(SessionEvent::Error(detail.message));
                    }
                    wire::ServerEvent::TranscriptionDelta { delta } => {
                        let _ = events.send(SessionEvent::Transcript {
                            text: delta,
                            is_final: false,
                        });
                    }
                    wire::ServerEvent::TranscriptionCompleted { transcript } => {
                        let _ = events.send(SessionEvent::Transcript {
                            text: transcript,
                            is_final: true,
                        });
                    }
                    wire::ServerEvent::Other => {}
                }
            }
            Ok(WsMessage::Close(_)) => {
                info!("realtime endpoint closed the connection");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                let _ = events.send(SessionEvent::Error(e.to_string()));
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn session_update_carries_the_instructions() {
        let update = wire::SessionUpdate::new("Speak like a pirate.");
        let value: Value = serde_json::from_str(&serde_json::to_string(&update).unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "session.update",
                "session": { "instructions": "Speak like a pirate." }
            })
        );
    }

    #[test]
    fn error_events_are_parsed() {
        let raw = json!({
            "type": "error",
            "error": { "message": "session expired", "code": "session_expired" }
        });
        let event: wire::ServerEvent = serde_json::from_value(raw).unwrap();
        match event {
            wire::ServerEvent::Error { error } => assert_eq!(error.message, "session expired"),
            other => panic!("expected error event, got {other:?}"),
        }
    }

    #[test]
    fn unknown_event_types_are_ignored() {
        let raw = json!({ "type": "response.audio.delta", "delta": "UklGR..." });
        let event: wire::ServerEvent = serde_json::from_value(raw).unwrap();
        assert!(matches!(event, wire::ServerEvent::Other));
    }

    #[tokio::test]
    async fn close_before_connect_is_a_noop() {
        let factory = OpenAiRealtimeFactory::default();
        let agent = AgentDescriptor {
            name: "Assistant".to_string(),
            instructions: "Be brief.".to_string(),
        };
        let (mut session, _events) = factory.create(&agent, "gpt-4o-mini-realtime-preview").unwrap();
        session.close().await.unwrap();
    }
}
