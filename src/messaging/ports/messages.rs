//! Repository port for message persistence.

use crate::messaging::{
    domain::{ConversationId, Message, MessageId, SequenceNumber, UserId},
    error::RepositoryResult,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Default number of messages per page.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Upper bound on the page size accepted from callers.
pub const MAX_PAGE_SIZE: u32 = 200;

/// A pagination window counted from the newest message.
///
/// # Examples
///
/// ```
/// use veranda::messaging::ports::Page;
///
/// let page = Page::new(2, 25);
/// assert_eq!(page.offset(), 25);
/// assert_eq!(Page::default().size(), 50);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    number: u32,
    size: u32,
}

impl Page {
    /// Creates a page window, clamping out-of-range values.
    ///
    /// Page numbers start at 1; sizes are clamped to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub const fn new(number: u32, size: u32) -> Self {
        let number = if number == 0 { 1 } else { number };
        let size = if size == 0 {
            DEFAULT_PAGE_SIZE
        } else if size > MAX_PAGE_SIZE {
            MAX_PAGE_SIZE
        } else {
            size
        };
        Self { number, size }
    }

    /// Returns the 1-based page number.
    #[must_use]
    pub const fn number(&self) -> u32 {
        self.number
    }

    /// Returns the page size.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Returns the number of records to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.number as u64).saturating_sub(1).saturating_mul(self.size as u64)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// Port for message persistence operations.
///
/// # Implementation Notes
///
/// Implementations must ensure:
/// - Message IDs are unique across the entire system
/// - Sequence numbers are unique within a conversation
/// - Messages are immutable after storage apart from receipt set-add
/// - [`mark_read`](MessageRepository::mark_read) is idempotent: a reader is
///   added at most once and an existing receipt timestamp is never changed
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Appends a new message to its conversation's log.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if:
    /// - A message with the same ID already exists
    /// - The sequence number is already taken within the conversation
    /// - The store is unavailable
    async fn append(&self, message: &Message) -> RepositoryResult<()>;

    /// Retrieves one page of a conversation's messages, newest first.
    ///
    /// Storage paginates from the newest end; callers that need display
    /// order reverse the page. Returns an empty vector past the end.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    async fn page_newest_first(
        &self,
        conversation_id: ConversationId,
        page: Page,
    ) -> RepositoryResult<Vec<Message>>;

    /// Returns the next sequence number for a conversation.
    ///
    /// For a conversation with no messages, returns `SequenceNumber::new(1)`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    async fn next_sequence_number(
        &self,
        conversation_id: ConversationId,
    ) -> RepositoryResult<SequenceNumber>;

    /// Adds a read receipt for the reader on each listed message that does
    /// not already carry one.
    ///
    /// Set-add semantics: existing receipts keep their original timestamp.
    /// Returns the number of receipts actually added.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the update fails.
    async fn mark_read(
        &self,
        conversation_id: ConversationId,
        reader: &UserId,
        message_ids: &[MessageId],
        at: DateTime<Utc>,
    ) -> RepositoryResult<u64>;

    /// Counts messages in the conversation not authored by the viewer and
    /// lacking a receipt from the viewer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    async fn count_unread(
        &self,
        conversation_id: ConversationId,
        viewer: &UserId,
    ) -> RepositoryResult<u64>;

    /// Retrieves the most recent message of a conversation, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    async fn latest(&self, conversation_id: ConversationId) -> RepositoryResult<Option<Message>>;
}
