//! Diesel model types for conversation and message persistence.
//!
//! These types map database rows to Rust structs using Diesel's derive
//! macros. They serve as the boundary between the database and domain
//! layers; conversion helpers rebuild the aggregates via their
//! `from_persisted` constructors.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::schema::{conversations, messages};
use crate::messaging::{
    domain::{
        Conversation, ConversationId, ConversationStatus, Message, MessageBody, MessageId,
        NewMessageParams, PersistedConversation, PropertyId, SenderRole, SequenceNumber, UserId,
    },
    error::RepositoryError,
};

/// Database row representation of a conversation.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = conversations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ConversationRow {
    /// Unique conversation identifier.
    pub id: Uuid,
    /// External property identifier.
    pub property_id: String,
    /// External buyer identity.
    pub buyer_id: String,
    /// External seller identity.
    pub seller_id: String,
    /// Ordered participant set.
    pub participants: Value,
    /// Lifecycle status.
    pub status: String,
    /// When the thread was created.
    pub created_at: DateTime<Utc>,
    /// When the most recent message was stored.
    pub last_message_at: DateTime<Utc>,
}

/// Data for inserting a new conversation.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = conversations)]
pub struct NewConversationRow {
    /// Unique conversation identifier.
    pub id: Uuid,
    /// External property identifier.
    pub property_id: String,
    /// External buyer identity.
    pub buyer_id: String,
    /// External seller identity.
    pub seller_id: String,
    /// Ordered participant set.
    pub participants: Value,
    /// Lifecycle status.
    pub status: String,
    /// When the thread was created.
    pub created_at: DateTime<Utc>,
    /// When the most recent message was stored.
    pub last_message_at: DateTime<Utc>,
}

/// Converts a domain conversation to an insertable record.
///
/// # Errors
///
/// Returns `RepositoryError::Serialization` if the participant set cannot
/// be encoded.
pub fn conversation_to_insertable(
    conversation: &Conversation,
) -> Result<NewConversationRow, RepositoryError> {
    let participants = serde_json::to_value(conversation.participants())
        .map_err(|e| RepositoryError::serialization(e.to_string()))?;

    Ok(NewConversationRow {
        id: conversation.id().into_inner(),
        property_id: conversation.property_id().as_str().to_owned(),
        buyer_id: conversation.buyer().as_str().to_owned(),
        seller_id: conversation.seller().as_str().to_owned(),
        participants,
        status: conversation.status().as_str().to_owned(),
        created_at: conversation.created_at(),
        last_message_at: conversation.last_message_at(),
    })
}

/// Converts a database row to a domain conversation.
///
/// # Errors
///
/// Returns `RepositoryError::Serialization` if any stored field fails to
/// parse back into its domain type.
pub fn row_to_conversation(row: ConversationRow) -> Result<Conversation, RepositoryError> {
    let status = ConversationStatus::try_from(row.status.as_str())
        .map_err(|e| RepositoryError::serialization(e.to_string()))?;
    let participants: Vec<UserId> = serde_json::from_value(row.participants)
        .map_err(|e| RepositoryError::serialization(e.to_string()))?;
    let property_id =
        PropertyId::new(row.property_id).map_err(|e| RepositoryError::serialization(e.to_string()))?;
    let buyer =
        UserId::new(row.buyer_id).map_err(|e| RepositoryError::serialization(e.to_string()))?;
    let seller =
        UserId::new(row.seller_id).map_err(|e| RepositoryError::serialization(e.to_string()))?;

    Conversation::from_persisted(PersistedConversation {
        id: ConversationId::from_uuid(row.id),
        property_id,
        buyer,
        seller,
        participants,
        status,
        created_at: row.created_at,
        last_message_at: row.last_message_at,
    })
    .map_err(|e| RepositoryError::serialization(e.to_string()))
}

/// Database row representation of a message.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MessageRow {
    /// Unique message identifier.
    pub id: Uuid,
    /// Owning conversation.
    pub conversation_id: Uuid,
    /// Monotonic order within the conversation.
    pub sequence_number: i64,
    /// External sender identity.
    pub sender_id: String,
    /// Display name captured at send time.
    pub sender_name: String,
    /// Sender role captured at send time.
    pub sender_role: String,
    /// Payload as JSONB.
    pub body: Value,
    /// When the message was created.
    pub created_at: DateTime<Utc>,
    /// Reader identity to read timestamp.
    pub read_receipts: Value,
}

/// Data for inserting a new message.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessageRow {
    /// Unique message identifier.
    pub id: Uuid,
    /// Owning conversation.
    pub conversation_id: Uuid,
    /// Monotonic order within the conversation.
    pub sequence_number: i64,
    /// External sender identity.
    pub sender_id: String,
    /// Display name captured at send time.
    pub sender_name: String,
    /// Sender role captured at send time.
    pub sender_role: String,
    /// Payload as JSONB.
    pub body: Value,
    /// When the message was created.
    pub created_at: DateTime<Utc>,
    /// Reader identity to read timestamp.
    pub read_receipts: Value,
}

/// Converts a domain message to an insertable record.
///
/// # Errors
///
/// Returns `RepositoryError::Serialization` if the payload or receipt set
/// cannot be encoded, or the sequence number exceeds the storage range.
pub fn message_to_insertable(message: &Message) -> Result<NewMessageRow, RepositoryError> {
    let body = serde_json::to_value(message.body())
        .map_err(|e| RepositoryError::serialization(e.to_string()))?;
    let read_receipts = serde_json::to_value(message.read_receipts())
        .map_err(|e| RepositoryError::serialization(e.to_string()))?;

    Ok(NewMessageRow {
        id: message.id().into_inner(),
        conversation_id: message.conversation_id().into_inner(),
        sequence_number: i64::try_from(message.sequence_number().value())
            .map_err(|e| RepositoryError::serialization(e.to_string()))?,
        sender_id: message.sender().as_str().to_owned(),
        sender_name: message.sender_name().to_owned(),
        sender_role: message.sender_role().as_str().to_owned(),
        body,
        created_at: message.created_at(),
        read_receipts,
    })
}

/// Converts a database row to a domain message.
///
/// # Errors
///
/// Returns `RepositoryError::Serialization` if any stored field fails to
/// parse back into its domain type.
pub fn row_to_message(row: MessageRow) -> Result<Message, RepositoryError> {
    let sender_role = SenderRole::try_from(row.sender_role.as_str())
        .map_err(|e| RepositoryError::serialization(e.to_string()))?;
    let body: MessageBody = serde_json::from_value(row.body)
        .map_err(|e| RepositoryError::serialization(e.to_string()))?;
    let read_receipts: BTreeMap<UserId, DateTime<Utc>> = serde_json::from_value(row.read_receipts)
        .map_err(|e| RepositoryError::serialization(e.to_string()))?;
    let sender =
        UserId::new(row.sender_id).map_err(|e| RepositoryError::serialization(e.to_string()))?;
    let sequence_number = u64::try_from(row.sequence_number)
        .map_err(|e| RepositoryError::serialization(e.to_string()))?;

    Message::from_persisted(
        MessageId::from_uuid(row.id),
        NewMessageParams {
            conversation_id: ConversationId::from_uuid(row.conversation_id),
            sequence_number: SequenceNumber::new(sequence_number),
            sender,
            sender_name: row.sender_name,
            sender_role,
            body,
        },
        row.created_at,
        read_receipts,
    )
    .map_err(|e| RepositoryError::serialization(e.to_string()))
}
