//! The Conversation aggregate root.
//!
//! A conversation is a thread scoped to exactly one property and one
//! buyer/seller pair, plus any support administrators enrolled by posting.

use super::{ConversationId, ConversationStatus, PropertyId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifying fields for a new conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationParams {
    /// The property the thread is about.
    pub property_id: PropertyId,
    /// The buyer opening the thread.
    pub buyer: UserId,
    /// The resolved owner of the property.
    pub seller: UserId,
}

impl ConversationParams {
    /// Creates new conversation parameters.
    #[must_use]
    pub const fn new(property_id: PropertyId, buyer: UserId, seller: UserId) -> Self {
        Self {
            property_id,
            buyer,
            seller,
        }
    }
}

/// A conversation thread between a buyer and a seller about one property.
///
/// # Invariants
///
/// - `buyer != seller` (enforced at construction)
/// - `participants` is an ordered, duplicate-free set starting as
///   `[buyer, seller]` and growing only by admin enrolment
/// - At most one conversation exists per (property, buyer, seller) triple;
///   the store layer enforces this with an atomic insert-if-absent
///
/// # Examples
///
/// ```
/// use veranda::messaging::domain::{Conversation, ConversationParams, PropertyId, UserId};
/// use mockable::DefaultClock;
///
/// let params = ConversationParams::new(
///     PropertyId::new("prop-1").expect("valid id"),
///     UserId::new("buyer-1").expect("valid id"),
///     UserId::new("seller-1").expect("valid id"),
/// );
/// let conversation = Conversation::new(params, &DefaultClock).expect("valid conversation");
/// assert_eq!(conversation.participants().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique identifier for this conversation.
    id: ConversationId,

    /// The property the thread is about.
    property_id: PropertyId,

    /// The buyer who opened the thread.
    buyer: UserId,

    /// The property owner at thread creation time.
    seller: UserId,

    /// Ordered set of identities allowed to read and write the thread.
    participants: Vec<UserId>,

    /// Operational lifecycle label.
    status: ConversationStatus,

    /// When the thread was created.
    created_at: DateTime<Utc>,

    /// When the most recent message was stored.
    last_message_at: DateTime<Utc>,
}

impl Conversation {
    /// Creates a new active conversation with both timestamps set to now.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::SelfConversation`] if buyer and seller
    /// are the same identity.
    pub fn new(params: ConversationParams, clock: &impl Clock) -> Result<Self, ConversationError> {
        let now = clock.utc();
        Self::from_persisted(PersistedConversation {
            id: ConversationId::new(),
            property_id: params.property_id,
            buyer: params.buyer.clone(),
            seller: params.seller.clone(),
            participants: vec![params.buyer, params.seller],
            status: ConversationStatus::Active,
            created_at: now,
            last_message_at: now,
        })
    }

    /// Reconstructs a conversation from persisted state.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::SelfConversation`] if the stored record
    /// violates the buyer/seller distinctness invariant.
    pub fn from_persisted(persisted: PersistedConversation) -> Result<Self, ConversationError> {
        if persisted.buyer == persisted.seller {
            return Err(ConversationError::SelfConversation(persisted.buyer));
        }

        let mut participants = Vec::with_capacity(persisted.participants.len().max(2));
        for participant in persisted.participants {
            if !participants.contains(&participant) {
                participants.push(participant);
            }
        }
        if !participants.contains(&persisted.buyer) {
            participants.insert(0, persisted.buyer.clone());
        }
        if !participants.contains(&persisted.seller) {
            participants.insert(1, persisted.seller.clone());
        }

        Ok(Self {
            id: persisted.id,
            property_id: persisted.property_id,
            buyer: persisted.buyer,
            seller: persisted.seller,
            participants,
            status: persisted.status,
            created_at: persisted.created_at,
            last_message_at: persisted.last_message_at,
        })
    }

    /// Returns the conversation identifier.
    #[must_use]
    pub const fn id(&self) -> ConversationId {
        self.id
    }

    /// Returns the property reference.
    #[must_use]
    pub const fn property_id(&self) -> &PropertyId {
        &self.property_id
    }

    /// Returns the buyer identity.
    #[must_use]
    pub const fn buyer(&self) -> &UserId {
        &self.buyer
    }

    /// Returns the seller identity.
    #[must_use]
    pub const fn seller(&self) -> &UserId {
        &self.seller
    }

    /// Returns the ordered participant set.
    #[must_use]
    pub fn participants(&self) -> &[UserId] {
        &self.participants
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> ConversationStatus {
        self.status
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the timestamp of the most recent message.
    #[must_use]
    pub const fn last_message_at(&self) -> DateTime<Utc> {
        self.last_message_at
    }

    /// Returns `true` if the identity may read and write this thread.
    #[must_use]
    pub fn is_participant(&self, user: &UserId) -> bool {
        self.participants.contains(user)
    }

    /// Returns the other side of the thread from the viewer's perspective.
    ///
    /// Enrolled admins see the buyer as the counterpart.
    #[must_use]
    pub fn counterpart(&self, viewer: &UserId) -> &UserId {
        if *viewer == self.buyer {
            &self.seller
        } else {
            &self.buyer
        }
    }

    /// Adds an identity to the participant set.
    ///
    /// Set-add semantics: returns `true` if the identity was newly enrolled,
    /// `false` if it was already a participant.
    pub fn enrol(&mut self, user: UserId) -> bool {
        if self.participants.contains(&user) {
            return false;
        }
        self.participants.push(user);
        true
    }

    /// Records message activity by bumping the last-message timestamp.
    pub fn touch(&mut self, clock: &impl Clock) {
        self.last_message_at = clock.utc();
    }

    /// Applies a new lifecycle status. Any transition is permitted.
    pub const fn set_status(&mut self, status: ConversationStatus) {
        self.status = status;
    }
}

/// Raw persisted fields used to rebuild a [`Conversation`].
#[derive(Debug, Clone)]
pub struct PersistedConversation {
    /// Unique conversation identifier.
    pub id: ConversationId,
    /// The property the thread is about.
    pub property_id: PropertyId,
    /// The buyer who opened the thread.
    pub buyer: UserId,
    /// The property owner at thread creation time.
    pub seller: UserId,
    /// Stored participant set (deduplicated on rebuild).
    pub participants: Vec<UserId>,
    /// Operational lifecycle label.
    pub status: ConversationStatus,
    /// When the thread was created.
    pub created_at: DateTime<Utc>,
    /// When the most recent message was stored.
    pub last_message_at: DateTime<Utc>,
}

/// Errors that can occur when constructing a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversationError {
    /// Buyer and seller resolved to the same identity.
    #[error("cannot open a conversation with yourself (identity {0})")]
    SelfConversation(UserId),
}
