//! Error types for the chat client
//!
//! Defines name validation, transport, configuration and channel errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Rejected identity at connect time
///
/// Recovered locally: the message is shown as a system notice and no
/// transport is opened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Name is empty after trimming
    #[error("Empty name is not allowed!")]
    Empty,

    /// Name equals the reserved `SERVER` token
    #[error("The name SERVER is not allowed!")]
    Reserved,
}

/// Transport-level failures
///
/// Never retried. Each one ends the current session; its `Display`
/// text is what the user sees.
#[derive(Debug, Error)]
pub enum TransportError {
    /// TCP connect failed
    #[error("Failed to connect: {0}")]
    Connect(#[source] std::io::Error),

    /// Writing the registration handshake failed
    #[error("Failed to register name: {0}")]
    Handshake(#[source] std::io::Error),

    /// Writing a chat message failed
    #[error("Failed to send message: {0}")]
    Write(#[source] std::io::Error),

    /// Reading from the relay failed mid-session
    #[error("Connection error: {0}")]
    Read(#[source] std::io::Error),
}

/// Relay address errors, reported through clap
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid port: {0}")]
    InvalidPort(String),
}

/// Message send errors
///
/// Occurs when attempting to send messages through closed channels.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}
