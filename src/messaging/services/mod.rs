//! Orchestration services for the messaging subsystem.
//!
//! [`ConversationService`] is the single authority for conversation
//! existence and access control; [`MessagingService`] owns the message
//! read/write path including the mark-as-read side effect and the
//! best-effort real-time emit.

mod conversations;
mod messages;

pub use conversations::{
    ConversationService, ConversationServiceError, ConversationServiceResult, ConversationSummary,
};
pub use messages::{MessagingService, MessagingServiceError, MessagingServiceResult};
