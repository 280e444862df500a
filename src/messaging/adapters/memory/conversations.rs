//! In-memory implementation of the `ConversationRepository` port.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::messaging::{
    domain::{Conversation, ConversationId, PropertyId, UserId},
    error::{RepositoryError, RepositoryResult},
    ports::conversations::{ConversationRepository, FindOrCreate},
};

/// Uniqueness key for a conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TripleKey {
    property: PropertyId,
    buyer: UserId,
    seller: UserId,
}

impl TripleKey {
    fn of(conversation: &Conversation) -> Self {
        Self {
            property: conversation.property_id().clone(),
            buyer: conversation.buyer().clone(),
            seller: conversation.seller().clone(),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    by_id: HashMap<ConversationId, Conversation>,
    by_key: HashMap<TripleKey, ConversationId>,
}

/// In-memory implementation of [`ConversationRepository`].
///
/// Thread-safe via internal [`RwLock`]. The triple index and the id map are
/// kept consistent under one lock, making `create_if_absent` atomic.
///
/// # Example
///
/// ```
/// use veranda::messaging::adapters::memory::InMemoryConversationStore;
///
/// let store = InMemoryConversationStore::new();
/// assert!(store.is_empty());
/// ```
#[derive(Debug, Default, Clone)]
pub struct InMemoryConversationStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryConversationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored conversations.
    ///
    /// Returns `0` if the internal lock is poisoned, matching the fallback
    /// behaviour of an empty store. For error-propagating access, use the
    /// repository trait methods instead.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().map(|guard| guard.by_id.len()).unwrap_or(0)
    }

    /// Returns `true` if no conversations are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationStore {
    async fn create_if_absent(&self, candidate: Conversation) -> RepositoryResult<FindOrCreate> {
        let mut guard = self
            .inner
            .write()
            .map_err(|e| RepositoryError::connection(format!("lock poisoned: {e}")))?;

        let key = TripleKey::of(&candidate);
        if let Some(existing_id) = guard.by_key.get(&key) {
            let existing = guard.by_id.get(existing_id).cloned().ok_or_else(|| {
                RepositoryError::connection("triple index points at missing conversation")
            })?;
            return Ok(FindOrCreate::Existing(existing));
        }

        guard.by_key.insert(key, candidate.id());
        guard.by_id.insert(candidate.id(), candidate.clone());
        Ok(FindOrCreate::Created(candidate))
    }

    async fn find_by_id(&self, id: ConversationId) -> RepositoryResult<Option<Conversation>> {
        let guard = self
            .inner
            .read()
            .map_err(|e| RepositoryError::connection(format!("lock poisoned: {e}")))?;

        Ok(guard.by_id.get(&id).cloned())
    }

    async fn find_by_participant(&self, user: &UserId) -> RepositoryResult<Vec<Conversation>> {
        let guard = self
            .inner
            .read()
            .map_err(|e| RepositoryError::connection(format!("lock poisoned: {e}")))?;

        Ok(guard
            .by_id
            .values()
            .filter(|c| c.is_participant(user))
            .cloned()
            .collect())
    }

    async fn update(&self, conversation: &Conversation) -> RepositoryResult<()> {
        let mut guard = self
            .inner
            .write()
            .map_err(|e| RepositoryError::connection(format!("lock poisoned: {e}")))?;

        if !guard.by_id.contains_key(&conversation.id()) {
            return Err(RepositoryError::ConversationNotFound(conversation.id()));
        }

        guard.by_id.insert(conversation.id(), conversation.clone());
        Ok(())
    }

    async fn list_all(&self) -> RepositoryResult<Vec<Conversation>> {
        let guard = self
            .inner
            .read()
            .map_err(|e| RepositoryError::connection(format!("lock poisoned: {e}")))?;

        Ok(guard.by_id.values().cloned().collect())
    }
}
