//! In-memory implementation of the `MessageRepository` port.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::messaging::{
    domain::{ConversationId, Message, MessageId, SequenceNumber, UserId},
    error::{RepositoryError, RepositoryResult},
    ports::messages::{MessageRepository, Page},
};

/// In-memory implementation of [`MessageRepository`].
///
/// Messages are held per conversation in sequence order. Thread-safe via
/// internal [`RwLock`].
#[derive(Debug, Default, Clone)]
pub struct InMemoryMessageStore {
    by_conversation: Arc<RwLock<HashMap<ConversationId, Vec<Message>>>>,
}

impl InMemoryMessageStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored messages across all conversations.
    ///
    /// Returns `0` if the internal lock is poisoned, matching the fallback
    /// behaviour of an empty store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_conversation
            .read()
            .map(|guard| guard.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Returns `true` if no messages are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageStore {
    async fn append(&self, message: &Message) -> RepositoryResult<()> {
        let mut guard = self
            .by_conversation
            .write()
            .map_err(|e| RepositoryError::connection(format!("lock poisoned: {e}")))?;

        let log = guard.entry(message.conversation_id()).or_default();

        if log.iter().any(|m| m.id() == message.id()) {
            return Err(RepositoryError::DuplicateMessage(message.id()));
        }
        if log
            .iter()
            .any(|m| m.sequence_number() == message.sequence_number())
        {
            return Err(RepositoryError::DuplicateSequence {
                conversation_id: message.conversation_id(),
                sequence: message.sequence_number(),
            });
        }

        log.push(message.clone());
        log.sort_by_key(Message::sequence_number);
        Ok(())
    }

    async fn page_newest_first(
        &self,
        conversation_id: ConversationId,
        page: Page,
    ) -> RepositoryResult<Vec<Message>> {
        let guard = self
            .by_conversation
            .read()
            .map_err(|e| RepositoryError::connection(format!("lock poisoned: {e}")))?;

        let Some(log) = guard.get(&conversation_id) else {
            return Ok(Vec::new());
        };

        let offset = usize::try_from(page.offset())
            .map_err(|e| RepositoryError::serialization(e.to_string()))?;
        let size = usize::try_from(page.size())
            .map_err(|e| RepositoryError::serialization(e.to_string()))?;

        Ok(log
            .iter()
            .rev()
            .skip(offset)
            .take(size)
            .cloned()
            .collect())
    }

    async fn next_sequence_number(
        &self,
        conversation_id: ConversationId,
    ) -> RepositoryResult<SequenceNumber> {
        let guard = self
            .by_conversation
            .read()
            .map_err(|e| RepositoryError::connection(format!("lock poisoned: {e}")))?;

        let next = guard
            .get(&conversation_id)
            .and_then(|log| log.last())
            .map_or_else(|| SequenceNumber::new(1), |m| m.sequence_number().next());

        Ok(next)
    }

    async fn mark_read(
        &self,
        conversation_id: ConversationId,
        reader: &UserId,
        message_ids: &[MessageId],
        at: DateTime<Utc>,
    ) -> RepositoryResult<u64> {
        let mut guard = self
            .by_conversation
            .write()
            .map_err(|e| RepositoryError::connection(format!("lock poisoned: {e}")))?;

        let Some(log) = guard.get_mut(&conversation_id) else {
            return Ok(0);
        };

        let mut added = 0u64;
        for message in log.iter_mut() {
            if message_ids.contains(&message.id()) && message.mark_read(reader, at) {
                added = added.saturating_add(1);
            }
        }
        Ok(added)
    }

    async fn count_unread(
        &self,
        conversation_id: ConversationId,
        viewer: &UserId,
    ) -> RepositoryResult<u64> {
        let guard = self
            .by_conversation
            .read()
            .map_err(|e| RepositoryError::connection(format!("lock poisoned: {e}")))?;

        let count = guard
            .get(&conversation_id)
            .map(|log| {
                log.iter()
                    .filter(|m| m.sender() != viewer && !m.is_read_by(viewer))
                    .count()
            })
            .unwrap_or(0);

        u64::try_from(count).map_err(|e| RepositoryError::serialization(e.to_string()))
    }

    async fn latest(&self, conversation_id: ConversationId) -> RepositoryResult<Option<Message>> {
        let guard = self
            .by_conversation
            .read()
            .map_err(|e| RepositoryError::connection(format!("lock poisoned: {e}")))?;

        Ok(guard
            .get(&conversation_id)
            .and_then(|log| log.last().cloned()))
    }
}
