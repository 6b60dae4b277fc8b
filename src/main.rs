//! Relay Chat Client - Entry Point
//!
//! Starts the ChatClient actor and bridges it to the terminal:
//! stdin lines become intents, surface updates are printed to stdout.

use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use relay_chat::surface::spawn_line_reader;
use relay_chat::{ChatClient, Cli, ClientConfig, TerminalSurface};

/// Channel buffer size for client commands
const CHANNEL_BUFFER_SIZE: usize = 64;

/// Typed lines waiting to be routed
const INPUT_BUFFER_SIZE: usize = 16;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they do not interleave with chat output
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=relay_chat=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("relay_chat=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::from(Cli::parse()).with_env();

    // Create ChatClient actor channels and start
    let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
    let (surface_tx, surface_rx) = mpsc::unbounded_channel();
    let surface = TerminalSurface::new(config.output, config.color);
    let client = ChatClient::new(config, cmd_rx, &cmd_tx, surface_tx);
    let actor = tokio::spawn(client.run());

    info!("ChatClient actor started");
    println!("Welcome to the chat room! Enter your name to connect (/quit to exit).");

    // Detached: a read still blocked on stdin must not hold up exit
    let (input_tx, input_rx) = mpsc::channel(INPUT_BUFFER_SIZE);
    spawn_line_reader(std::io::BufReader::new(std::io::stdin()), input_tx);

    let mut stdout = std::io::stdout();
    surface.pump(input_rx, cmd_tx, surface_rx, &mut stdout).await?;

    actor.await?;
    Ok(())
}
