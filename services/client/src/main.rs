//! Native demo client for the realtime voice agent.
//!
//! Stands in for the browser frontend: it asks the relay for an ephemeral
//! token, drives the session controller through its connection sequence, and
//! prints every status transition until interrupted.

mod realtime;

use anyhow::Result;
use clap::Parser;
use realtime::OpenAiRealtimeFactory;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use voxlink_core::{
    RelayTokenSource, SessionController, controller::DEFAULT_REALTIME_MODEL,
};

#[derive(Parser, Debug)]
#[command(name = "voxlink", about = "Realtime voice agent demo client")]
struct Cli {
    /// Origin of the credential relay.
    #[arg(long, default_value = "http://localhost:3001")]
    relay_url: String,

    /// Agent persona name.
    #[arg(long, default_value = "Assistant")]
    agent_name: String,

    /// Agent persona instructions. Defaults to the built-in assistant persona.
    #[arg(long)]
    instructions: Option<String>,

    /// Realtime model to bind the session to.
    #[arg(long, default_value = DEFAULT_REALTIME_MODEL)]
    model: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let tokens = Arc::new(RelayTokenSource::new(&cli.relay_url));
    let factory = Arc::new(OpenAiRealtimeFactory::default());
    let mut controller = SessionController::new(tokens, factory, cli.model);
    controller.set_agent_name(cli.agent_name);
    if let Some(instructions) = cli.instructions {
        controller.set_agent_instructions(instructions);
    }

    // Follow the derived status the way the web UI renders its status bar.
    let mut status = controller.watch_status();
    let printer = tokio::spawn(async move {
        loop {
            {
                let snapshot = status.borrow_and_update();
                info!(connected = snapshot.connected, "Status: {}", snapshot.status);
                if !snapshot.transcript.is_empty() {
                    info!("Transcript: {}", snapshot.transcript.trim_end());
                }
            }
            if status.changed().await.is_err() {
                break;
            }
        }
    });

    controller.start().await;

    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal. Closing session...");
    controller.shutdown().await;
    printer.abort();
    Ok(())
}
