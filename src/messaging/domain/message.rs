//! The Message aggregate root.
//!
//! Messages are immutable after creation except for the accumulation of
//! read receipts, which is an idempotent set-add.

use super::{ConversationId, MessageBody, MessageId, SenderRole, SequenceNumber, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Fields required to create a new message.
#[derive(Debug, Clone)]
pub struct NewMessageParams {
    /// The conversation this message belongs to.
    pub conversation_id: ConversationId,
    /// The sequence number within the conversation.
    pub sequence_number: SequenceNumber,
    /// The sender identity.
    pub sender: UserId,
    /// The sender's display name, captured at send time.
    pub sender_name: String,
    /// The sender's role in the conversation at send time.
    pub sender_role: SenderRole,
    /// The payload.
    pub body: MessageBody,
}

/// A message within a conversation.
///
/// # Invariants
///
/// - `body` is non-empty (enforced at construction)
/// - The sender is recorded in the read-receipt set from creation
/// - Read receipts are appended at most once per reader and an existing
///   receipt timestamp is never overwritten
///
/// # Examples
///
/// ```
/// use veranda::messaging::domain::{
///     ConversationId, Message, MessageBody, NewMessageParams, SenderRole, SequenceNumber, UserId,
/// };
/// use mockable::DefaultClock;
///
/// let sender = UserId::new("buyer-1").expect("valid id");
/// let message = Message::new(
///     NewMessageParams {
///         conversation_id: ConversationId::new(),
///         sequence_number: SequenceNumber::new(1),
///         sender: sender.clone(),
///         sender_name: "Ada".into(),
///         sender_role: SenderRole::Buyer,
///         body: MessageBody::text("Is this still available?"),
///     },
///     &DefaultClock,
/// ).expect("valid message");
///
/// assert!(message.is_read_by(&sender));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier for this message.
    id: MessageId,

    /// The conversation this message belongs to.
    conversation_id: ConversationId,

    /// The sequence number within the conversation.
    sequence_number: SequenceNumber,

    /// The sender identity.
    sender: UserId,

    /// The sender's display name, captured at send time.
    sender_name: String,

    /// The sender's role at send time.
    sender_role: SenderRole,

    /// The payload.
    body: MessageBody,

    /// When the message was created.
    created_at: DateTime<Utc>,

    /// Reader identity to read timestamp.
    read_receipts: BTreeMap<UserId, DateTime<Utc>>,
}

impl Message {
    /// Creates a new message with the current timestamp.
    ///
    /// The sender is seeded into the read-receipt set: authors have, by
    /// definition, read their own messages.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::EmptyBody`] if the payload is empty.
    pub fn new(params: NewMessageParams, clock: &impl Clock) -> Result<Self, MessageError> {
        if params.body.is_empty() {
            return Err(MessageError::EmptyBody);
        }

        let created_at = clock.utc();
        let mut read_receipts = BTreeMap::new();
        read_receipts.insert(params.sender.clone(), created_at);

        Ok(Self {
            id: MessageId::new(),
            conversation_id: params.conversation_id,
            sequence_number: params.sequence_number,
            sender: params.sender,
            sender_name: params.sender_name,
            sender_role: params.sender_role,
            body: params.body,
            created_at,
            read_receipts,
        })
    }

    /// Reconstructs a message from persisted state.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::EmptyBody`] if the stored payload is empty.
    pub fn from_persisted(
        id: MessageId,
        params: NewMessageParams,
        created_at: DateTime<Utc>,
        read_receipts: BTreeMap<UserId, DateTime<Utc>>,
    ) -> Result<Self, MessageError> {
        if params.body.is_empty() {
            return Err(MessageError::EmptyBody);
        }

        Ok(Self {
            id,
            conversation_id: params.conversation_id,
            sequence_number: params.sequence_number,
            sender: params.sender,
            sender_name: params.sender_name,
            sender_role: params.sender_role,
            body: params.body,
            created_at,
            read_receipts,
        })
    }

    /// Returns the message identifier.
    #[must_use]
    pub const fn id(&self) -> MessageId {
        self.id
    }

    /// Returns the conversation identifier.
    #[must_use]
    pub const fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    /// Returns the sequence number.
    #[must_use]
    pub const fn sequence_number(&self) -> SequenceNumber {
        self.sequence_number
    }

    /// Returns the sender identity.
    #[must_use]
    pub const fn sender(&self) -> &UserId {
        &self.sender
    }

    /// Returns the display name captured at send time.
    #[must_use]
    pub fn sender_name(&self) -> &str {
        &self.sender_name
    }

    /// Returns the sender role captured at send time.
    #[must_use]
    pub const fn sender_role(&self) -> SenderRole {
        self.sender_role
    }

    /// Returns the payload.
    #[must_use]
    pub const fn body(&self) -> &MessageBody {
        &self.body
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the read-receipt set.
    #[must_use]
    pub const fn read_receipts(&self) -> &BTreeMap<UserId, DateTime<Utc>> {
        &self.read_receipts
    }

    /// Returns `true` if the reader has a receipt on this message.
    #[must_use]
    pub fn is_read_by(&self, reader: &UserId) -> bool {
        self.read_receipts.contains_key(reader)
    }

    /// Returns the reader's receipt timestamp, if any.
    #[must_use]
    pub fn read_receipt(&self, reader: &UserId) -> Option<DateTime<Utc>> {
        self.read_receipts.get(reader).copied()
    }

    /// Records that the reader has viewed this message.
    ///
    /// Set-add semantics: returns `true` if a receipt was added, `false` if
    /// the reader already had one. An existing receipt timestamp is never
    /// changed.
    pub fn mark_read(&mut self, reader: &UserId, at: DateTime<Utc>) -> bool {
        if self.read_receipts.contains_key(reader) {
            return false;
        }
        self.read_receipts.insert(reader.clone(), at);
        true
    }
}

/// Errors that can occur when constructing a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// Neither text nor image content was provided.
    #[error("message body must contain text or an image reference")]
    EmptyBody,
}
