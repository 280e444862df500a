//! Account profiles as exposed by the wider marketplace.

use crate::messaging::domain::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The role attached to a marketplace account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    /// An ordinary buyer or private seller.
    User,
    /// An estate agent.
    Agent,
    /// A support administrator.
    Admin,
}

impl AccountRole {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Agent => "agent",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for AccountRole {
    type Error = ParseAccountRoleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "user" => Ok(Self::User),
            "agent" => Ok(Self::Agent),
            "admin" => Ok(Self::Admin),
            _ => Err(ParseAccountRoleError(value.to_owned())),
        }
    }
}

/// Error returned when parsing an unknown account role.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown account role: '{0}'")]
pub struct ParseAccountRoleError(pub String);

/// A marketplace account profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// The account identifier.
    pub id: UserId,
    /// Name shown alongside messages.
    pub display_name: String,
    /// The account's role.
    pub role: AccountRole,
}

impl UserProfile {
    /// Creates a new profile.
    #[must_use]
    pub fn new(id: UserId, display_name: impl Into<String>, role: AccountRole) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            role,
        }
    }

    /// Returns `true` if the account holds support-administrator powers.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == AccountRole::Admin
    }
}
