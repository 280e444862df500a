//! In-memory implementations of the directory ports.
//!
//! Used by tests and by single-process deployments where the marketplace
//! data is mirrored locally.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::directory::domain::{PropertyRecord, UserProfile};
use crate::directory::ports::{
    DirectoryError, DirectoryResult, PropertyDirectory, SessionDirectory, UserDirectory,
};
use crate::messaging::domain::{PropertyId, UserId};

/// In-memory implementation of [`PropertyDirectory`].
#[derive(Debug, Default, Clone)]
pub struct InMemoryPropertyDirectory {
    properties: Arc<RwLock<HashMap<PropertyId, PropertyRecord>>>,
}

impl InMemoryPropertyDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a property record.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Connection`] if the internal lock is
    /// poisoned.
    pub fn upsert(&self, record: PropertyRecord) -> DirectoryResult<()> {
        let mut guard = self
            .properties
            .write()
            .map_err(|e| DirectoryError::connection(format!("lock poisoned: {e}")))?;
        guard.insert(record.id.clone(), record);
        Ok(())
    }
}

#[async_trait]
impl PropertyDirectory for InMemoryPropertyDirectory {
    async fn find_property(&self, id: &PropertyId) -> DirectoryResult<Option<PropertyRecord>> {
        let guard = self
            .properties
            .read()
            .map_err(|e| DirectoryError::connection(format!("lock poisoned: {e}")))?;
        Ok(guard.get(id).cloned())
    }
}

/// In-memory implementation of [`UserDirectory`].
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserDirectory {
    profiles: Arc<RwLock<HashMap<UserId, UserProfile>>>,
}

impl InMemoryUserDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a profile.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Connection`] if the internal lock is
    /// poisoned.
    pub fn upsert(&self, profile: UserProfile) -> DirectoryResult<()> {
        let mut guard = self
            .profiles
            .write()
            .map_err(|e| DirectoryError::connection(format!("lock poisoned: {e}")))?;
        guard.insert(profile.id.clone(), profile);
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_profile(&self, id: &UserId) -> DirectoryResult<Option<UserProfile>> {
        let guard = self
            .profiles
            .read()
            .map_err(|e| DirectoryError::connection(format!("lock poisoned: {e}")))?;
        Ok(guard.get(id).cloned())
    }
}

/// In-memory implementation of [`SessionDirectory`].
#[derive(Debug, Default, Clone)]
pub struct InMemorySessionDirectory {
    tokens: Arc<RwLock<HashMap<String, UserId>>>,
}

impl InMemorySessionDirectory {
    /// Creates an empty session directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates a bearer token with an account.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Connection`] if the internal lock is
    /// poisoned.
    pub fn issue(&self, token: impl Into<String>, user: UserId) -> DirectoryResult<()> {
        let mut guard = self
            .tokens
            .write()
            .map_err(|e| DirectoryError::connection(format!("lock poisoned: {e}")))?;
        guard.insert(token.into(), user);
        Ok(())
    }
}

#[async_trait]
impl SessionDirectory for InMemorySessionDirectory {
    async fn resolve_token(&self, token: &str) -> DirectoryResult<Option<UserId>> {
        let guard = self
            .tokens
            .read()
            .map_err(|e| DirectoryError::connection(format!("lock poisoned: {e}")))?;
        Ok(guard.get(token).cloned())
    }
}
