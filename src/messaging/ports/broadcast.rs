//! Port for real-time fan-out of newly stored messages.
//!
//! The send path treats delivery through this port as best-effort: emit
//! failures are logged and swallowed by the caller because the message is
//! already durable before the emit is attempted.

use crate::messaging::domain::Message;
use async_trait::async_trait;
use thiserror::Error;

/// Result type for broadcast operations.
pub type BroadcastResult<T> = Result<T, BroadcastError>;

/// Errors that can occur while emitting to a room.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BroadcastError {
    /// The broadcaster's internal registry is unusable.
    #[error("room registry unavailable: {0}")]
    Registry(String),
}

/// Port for pushing a stored message to subscribers of its conversation's
/// room.
///
/// Delivery guarantee: at-most-once per currently subscribed connection per
/// message. Connections not in the room receive nothing from this channel
/// and converge through polling instead.
#[async_trait]
pub trait MessageBroadcast: Send + Sync {
    /// Emits the message to current members of its conversation's room.
    ///
    /// Returns the number of subscribers the message was handed to; zero
    /// when the room has no members.
    ///
    /// # Errors
    ///
    /// Returns [`BroadcastError`] if the registry itself is unusable. An
    /// empty room is not an error.
    async fn emit(&self, message: &Message) -> BroadcastResult<usize>;
}
