//! Sender roles captured on each message.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The role a sender held in the conversation at the time of sending.
///
/// Captured (denormalized) on every message, so later account changes do
/// not retroactively alter conversation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderRole {
    /// The buyer who opened the conversation.
    Buyer,
    /// The property owner listed on the thread.
    Seller,
    /// An estate agent acting on the seller's side.
    Agent,
    /// A support administrator posting via the override path.
    Admin,
}

impl SenderRole {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Seller => "seller",
            Self::Agent => "agent",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for SenderRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SenderRole {
    type Error = ParseSenderRoleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "buyer" => Ok(Self::Buyer),
            "seller" => Ok(Self::Seller),
            "agent" => Ok(Self::Agent),
            "admin" => Ok(Self::Admin),
            _ => Err(ParseSenderRoleError(value.to_owned())),
        }
    }
}

/// Error returned when parsing an unknown sender role.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sender role: '{0}'")]
pub struct ParseSenderRoleError(pub String);
