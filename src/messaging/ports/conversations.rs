//! Repository port for conversation persistence.
//!
//! Defines the abstract interface for storing and retrieving conversation
//! threads, allowing different persistence implementations (`PostgreSQL`,
//! in-memory, etc.).

use crate::messaging::{
    domain::{Conversation, ConversationId, UserId},
    error::RepositoryResult,
};
use async_trait::async_trait;

/// Outcome of an atomic find-or-create operation.
///
/// Callers generally cannot and should not distinguish the two arms; both
/// carry the single conversation that now exists for the key. The
/// distinction is kept for logging and tests.
#[derive(Debug, Clone, PartialEq)]
pub enum FindOrCreate {
    /// The candidate was inserted; no conversation existed for the key.
    Created(Conversation),
    /// A conversation already existed for the key; the candidate was dropped.
    Existing(Conversation),
}

impl FindOrCreate {
    /// Returns the conversation regardless of which arm was taken.
    #[must_use]
    pub fn into_conversation(self) -> Conversation {
        match self {
            Self::Created(conversation) | Self::Existing(conversation) => conversation,
        }
    }

    /// Returns `true` if the candidate was newly inserted.
    #[must_use]
    pub const fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Port for conversation persistence operations.
///
/// # Implementation Notes
///
/// Implementations must ensure:
/// - At most one conversation exists per (property, buyer, seller) triple
/// - [`create_if_absent`](ConversationRepository::create_if_absent) is a
///   single atomic check-and-insert, never a read-then-write race
/// - Concurrent access is handled safely
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Inserts the candidate conversation unless one already exists for its
    /// (property, buyer, seller) triple.
    ///
    /// Under concurrent calls for the same triple, exactly one caller
    /// observes [`FindOrCreate::Created`]; every other caller receives the
    /// winner's record via [`FindOrCreate::Existing`]. A uniqueness-conflict
    /// during insert is absorbed by a fallback read, never surfaced.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store is unavailable.
    async fn create_if_absent(&self, candidate: Conversation) -> RepositoryResult<FindOrCreate>;

    /// Retrieves a conversation by its ID.
    ///
    /// Returns `None` if the conversation does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    async fn find_by_id(&self, id: ConversationId) -> RepositoryResult<Option<Conversation>>;

    /// Retrieves all conversations where the user appears in the participant
    /// set (buyer, seller, or enrolled admin), in no particular order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    async fn find_by_participant(&self, user: &UserId) -> RepositoryResult<Vec<Conversation>>;

    /// Persists mutated conversation state (status, last-message timestamp,
    /// participant enrolment).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::ConversationNotFound` if the conversation
    /// has never been stored, or another `RepositoryError` if the update
    /// fails.
    async fn update(&self, conversation: &Conversation) -> RepositoryResult<()>;

    /// Retrieves every conversation, for the support dashboard.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    async fn list_all(&self) -> RepositoryResult<Vec<Conversation>>;
}
