//! Persistence error types for the messaging subsystem.
//!
//! Uses `thiserror` for ergonomic error handling with typed variants
//! that can be inspected by callers.

use super::domain::{ConversationId, MessageId, SequenceNumber};
use std::sync::Arc;
use thiserror::Error;

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors that can occur during conversation or message persistence.
///
/// Concurrent-creation conflicts on the (property, buyer, seller) uniqueness
/// key are deliberately absent: adapters absorb them by falling back to a
/// read of the winning record, so callers only ever observe success.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The conversation was not found.
    #[error("conversation not found: {0}")]
    ConversationNotFound(ConversationId),

    /// The message was not found.
    #[error("message not found: {0}")]
    MessageNotFound(MessageId),

    /// A message with this ID already exists.
    #[error("duplicate message: {0}")]
    DuplicateMessage(MessageId),

    /// A message with this sequence number already exists in the conversation.
    #[error("duplicate sequence number {sequence} in conversation {conversation_id}")]
    DuplicateSequence {
        /// The conversation containing the conflict.
        conversation_id: ConversationId,
        /// The conflicting sequence number.
        sequence: SequenceNumber,
    },

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(Arc<dyn std::error::Error + Send + Sync>),

    /// A serialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A connection error occurred.
    #[error("connection error: {0}")]
    Connection(String),
}

impl RepositoryError {
    /// Creates a database error from any error type.
    #[must_use]
    pub fn database(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Database(Arc::new(err))
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }
}

impl From<diesel::result::Error> for RepositoryError {
    fn from(err: diesel::result::Error) -> Self {
        // All Diesel errors are converted to database errors. Unique
        // constraint violations that need semantic handling (the
        // conversation triple, the per-conversation sequence) are detected
        // at the adapter by inspecting DatabaseErrorKind before conversion.
        Self::database(err)
    }
}
