//! Domain types for the messaging subsystem.
//!
//! This module contains pure domain types with no infrastructure dependencies.
//! All types are serialisable via serde; conversations and messages are
//! immutable after construction apart from the explicitly modelled
//! transitions (status changes, participant enrolment, read-receipt set-add).

mod body;
mod conversation;
mod ids;
mod message;
mod role;
mod status;

pub use body::{ImageRef, MessageBody, TextBody};
pub use conversation::{
    Conversation, ConversationError, ConversationParams, PersistedConversation,
};
pub use ids::{ConversationId, MessageId, ParseIdError, PropertyId, SequenceNumber, UserId};
pub use message::{Message, MessageError, NewMessageParams};
pub use role::{ParseSenderRoleError, SenderRole};
pub use status::{ConversationStatus, ParseConversationStatusError};
