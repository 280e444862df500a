//! Lookup ports onto the wider marketplace.
//!
//! Properties, accounts, and sessions are owned by external systems; the
//! messaging core reads them through these traits and never writes.

use crate::directory::domain::{PropertyRecord, UserProfile};
use crate::messaging::domain::{PropertyId, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for directory lookups.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Errors that can occur during a directory lookup.
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    /// The backing lookup failed.
    #[error("directory lookup failed: {0}")]
    Lookup(Arc<dyn std::error::Error + Send + Sync>),

    /// The directory is unreachable.
    #[error("directory connection error: {0}")]
    Connection(String),
}

impl DirectoryError {
    /// Creates a lookup error from any error type.
    #[must_use]
    pub fn lookup(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Lookup(Arc::new(err))
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }
}

/// Read-only access to property listings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PropertyDirectory: Send + Sync {
    /// Retrieves a property record by id.
    ///
    /// Returns `None` if the property does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] if the lookup fails.
    async fn find_property(&self, id: &PropertyId) -> DirectoryResult<Option<PropertyRecord>>;
}

/// Read-only access to account profiles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Retrieves an account profile by id.
    ///
    /// Returns `None` if the account does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] if the lookup fails.
    async fn find_profile(&self, id: &UserId) -> DirectoryResult<Option<UserProfile>>;
}

/// Read-only access to issued sessions.
///
/// Session issuance itself stays external; this port only answers "whose
/// token is this".
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionDirectory: Send + Sync {
    /// Resolves a bearer token to the account it was issued to.
    ///
    /// Returns `None` for unknown or expired tokens.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] if the lookup fails.
    async fn resolve_token(&self, token: &str) -> DirectoryResult<Option<UserId>>;
}
