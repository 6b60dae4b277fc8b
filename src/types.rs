//! Basic type definitions for the chat client
//!
//! Provides newtype wrappers for type safety:
//! - `SessionId`: UUID-based identifier for one connection attempt
//! - `Identity`: a validated display name

use uuid::Uuid;

use crate::error::ValidationError;

/// Name reserved for relay-originated notices
pub const RESERVED_IDENTITY: &str = "SERVER";

/// Unique session identifier (newtype pattern)
///
/// Wraps a UUID v4. Transport events are tagged with the id of the
/// session that spawned them so late events can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display name chosen at connect time
///
/// Always trimmed, never empty, never the reserved `SERVER` token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    /// Validate user input and build an identity from it
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let name = input.trim();
        if name.is_empty() {
            return Err(ValidationError::Empty);
        }
        if name == RESERVED_IDENTITY {
            return Err(ValidationError::Reserved);
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
