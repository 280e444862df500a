//! Port contracts for the messaging subsystem.

pub mod broadcast;
pub mod conversations;
pub mod messages;

pub use broadcast::{BroadcastError, BroadcastResult, MessageBroadcast};
pub use conversations::{ConversationRepository, FindOrCreate};
pub use messages::{MessageRepository, Page};
