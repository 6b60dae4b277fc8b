//! Inbound message classification
//!
//! The relay sends freeform text. Lines shaped like `"<sender>: <body>"`
//! are attributed chat messages; everything else is a system notice.
//! There is no escaping, so a body that itself starts with `word:` is
//! indistinguishable from a sender prefix.

/// Classified inbound text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// Informational line with no identifiable sender
    SystemNotice(String),
    /// Line attributed to a user
    UserMessage { sender: String, body: String },
}

/// Classify raw inbound text
///
/// Splits at the first `:`. A missing colon, or a sender that is empty
/// after trimming, yields a `SystemNotice` carrying the full text.
pub fn classify(text: &str) -> InboundMessage {
    let Some((sender, body)) = text.split_once(':') else {
        return InboundMessage::SystemNotice(text.to_string());
    };

    let sender = sender.trim();
    if sender.is_empty() {
        return InboundMessage::SystemNotice(text.to_string());
    }

    InboundMessage::UserMessage {
        sender: sender.to_string(),
        body: body.trim().to_string(),
    }
}
