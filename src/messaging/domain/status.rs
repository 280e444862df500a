//! Conversation lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Lifecycle status of a conversation.
///
/// This is an operational support label, not a strict workflow: any status
/// is reachable from any other status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    /// The conversation is open and exchanging messages.
    Active,
    /// The conversation awaits a follow-up, typically from support.
    Pending,
    /// The conversation has been closed out by support.
    Resolved,
}

impl ConversationStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Resolved => "resolved",
        }
    }
}

impl fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ConversationStatus {
    type Error = ParseConversationStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "active" => Ok(Self::Active),
            "pending" => Ok(Self::Pending),
            "resolved" => Ok(Self::Resolved),
            _ => Err(ParseConversationStatusError(value.to_owned())),
        }
    }
}

/// Error returned when parsing an unknown conversation status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown conversation status: '{0}'")]
pub struct ParseConversationStatusError(pub String);
