//! Events exchanged with the display surface
//!
//! The session pushes `SurfaceUpdate`s out; the surface sends
//! `UserIntent`s back. Updates serialize as tagged JSON for the
//! machine-readable output mode.

use serde::Serialize;

use crate::color::{color_for, Color};
use crate::message::InboundMessage;

/// An entry appended to the message log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderedEvent {
    /// Status or informational line
    System { text: String },
    /// Attributed chat line, colored by sender
    User {
        sender: String,
        body: String,
        color: Color,
    },
}

impl RenderedEvent {
    pub fn system(text: impl Into<String>) -> Self {
        Self::System { text: text.into() }
    }
}

impl From<InboundMessage> for RenderedEvent {
    fn from(message: InboundMessage) -> Self {
        match message {
            InboundMessage::SystemNotice(text) => Self::System { text },
            InboundMessage::UserMessage { sender, body } => {
                let color = color_for(&sender);
                Self::User {
                    sender,
                    body,
                    color,
                }
            }
        }
    }
}

/// Which input controls accept text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Controls {
    /// Name entry and connect
    pub identity_input: bool,
    /// Message entry and send
    pub message_input: bool,
}

impl Controls {
    /// Before connecting, and again after any session closes
    pub const DISCONNECTED: Self = Self {
        identity_input: true,
        message_input: false,
    };
    /// While the transport is being opened
    pub const CONNECTING: Self = Self {
        identity_input: false,
        message_input: false,
    };
    /// While the session is active
    pub const CHATTING: Self = Self {
        identity_input: false,
        message_input: true,
    };
}

impl Default for Controls {
    fn default() -> Self {
        Self::DISCONNECTED
    }
}

/// Session → display surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SurfaceUpdate {
    /// Append to the log and scroll it into view
    Render { event: RenderedEvent },
    /// Online/offline indicator
    Status { online: bool, text: String },
    /// Enable or disable the inputs
    Controls { controls: Controls },
}

/// Display surface → client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIntent {
    /// Start a session under the given name
    Connect(String),
    /// Send a chat line on the active session
    Send(String),
    /// Close the active session
    Disconnect,
}
