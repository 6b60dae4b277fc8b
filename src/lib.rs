//! Relay Chat Client Library
//!
//! A minimal real-time text chat client: pick a display name, open a TCP
//! connection to a broadcast relay, and exchange freeform text lines.
//!
//! # Features
//! - Name registration handshake (name is the first payload)
//! - Name validation (empty and `SERVER` are rejected locally)
//! - Classification of inbound text into system notices and user messages
//! - Deterministic per-sender colors
//! - Optional newline framing for relays that support it
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatClient` is the actor owning at most one `ChatSession`
//! - Each session's transport runs as a task feeding events to the actor
//! - The display surface receives `SurfaceUpdate`s on its own channel
//!
//! # Example
//! ```ignore
//! use tokio::sync::mpsc;
//! use relay_chat::{ChatClient, ClientCommand, ClientConfig, UserIntent};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (cmd_tx, cmd_rx) = mpsc::channel(64);
//!     let (surface_tx, mut surface_rx) = mpsc::unbounded_channel();
//!
//!     let client = ChatClient::new(ClientConfig::default(), cmd_rx, &cmd_tx, surface_tx);
//!     tokio::spawn(client.run());
//!
//!     cmd_tx
//!         .send(ClientCommand::Intent(UserIntent::Connect("bob".into())))
//!         .await
//!         .unwrap();
//!     while let Some(update) = surface_rx.recv().await {
//!         println!("{:?}", update);
//!     }
//! }
//! ```

pub mod client;
pub mod color;
pub mod config;
pub mod error;
pub mod event;
pub mod framing;
pub mod message;
pub mod session;
pub mod surface;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::{ChatClient, ClientCommand};
pub use color::{color_for, Color};
pub use config::{Cli, ClientConfig, OutputMode};
pub use error::{ConfigError, SendError, TransportError, ValidationError};
pub use event::{Controls, RenderedEvent, SurfaceUpdate, UserIntent};
pub use framing::Framing;
pub use message::{classify, InboundMessage};
pub use session::{ChatSession, SessionState};
pub use surface::TerminalSurface;
pub use transport::TransportEvent;
pub use types::{Identity, SessionId};
