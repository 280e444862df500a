//! The room registry and its subscriptions.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::messaging::domain::{ConversationId, Message};
use crate::messaging::ports::broadcast::{BroadcastError, BroadcastResult, MessageBroadcast};

/// Default per-room channel capacity.
///
/// A subscriber that lags beyond this many undelivered messages starts
/// losing the oldest ones; delivery on this channel is at-most-once and
/// polling is the correctness backstop.
const DEFAULT_ROOM_CAPACITY: usize = 64;

/// A live subscription to one conversation's room.
///
/// Dropping the subscription leaves the room; leaving is idempotent.
#[derive(Debug)]
pub struct RoomSubscription {
    conversation_id: ConversationId,
    receiver: broadcast::Receiver<Message>,
}

impl RoomSubscription {
    /// Returns the conversation this subscription is joined to.
    #[must_use]
    pub const fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    /// Waits for the next message emitted to the room.
    ///
    /// Returns `None` when the room is gone or the subscriber lagged past
    /// the channel capacity and chose not to continue; lag skips to the
    /// oldest retained message rather than ending the subscription.
    pub async fn recv(&mut self) -> Option<Message> {
        loop {
            match self.receiver.recv().await {
                Ok(message) => return Some(message),
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    // Dropped messages are recovered by the polling path.
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Process-scoped registry of conversation rooms.
///
/// Cloning shares the same registry. Rooms are created lazily on first
/// join and pruned when their last subscriber is gone.
///
/// # Example
///
/// ```
/// use veranda::realtime::RoomRegistry;
/// use veranda::messaging::domain::ConversationId;
///
/// let registry = RoomRegistry::new();
/// let conversation = ConversationId::new();
/// let subscription = registry.join(conversation);
/// assert_eq!(registry.subscriber_count(conversation), 1);
/// drop(subscription);
/// ```
#[derive(Debug, Clone)]
pub struct RoomRegistry {
    rooms: Arc<RwLock<HashMap<ConversationId, broadcast::Sender<Message>>>>,
    capacity: usize,
}

impl RoomRegistry {
    /// Creates a registry with the default per-room capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_ROOM_CAPACITY)
    }

    /// Creates a registry with a custom per-room capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Joins the conversation's room, creating it if needed.
    ///
    /// A poisoned lock is recovered by taking the inner value, as room
    /// state is reconstructible from re-joins.
    #[must_use]
    pub fn join(&self, conversation_id: ConversationId) -> RoomSubscription {
        let mut rooms = self.rooms.write().unwrap_or_else(std::sync::PoisonError::into_inner);

        let sender = rooms
            .entry(conversation_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0);

        RoomSubscription {
            conversation_id,
            receiver: sender.subscribe(),
        }
    }

    /// Drops the room for a conversation when nobody is subscribed.
    ///
    /// Called opportunistically; emitting to a missing room is a no-op, so
    /// pruning is purely a memory concern.
    pub fn prune(&self, conversation_id: ConversationId) {
        let mut rooms = self.rooms.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        if rooms
            .get(&conversation_id)
            .is_some_and(|sender| sender.receiver_count() == 0)
        {
            rooms.remove(&conversation_id);
        }
    }

    /// Returns the number of live subscribers in a conversation's room.
    #[must_use]
    pub fn subscriber_count(&self, conversation_id: ConversationId) -> usize {
        self.rooms
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&conversation_id)
            .map_or(0, broadcast::Sender::receiver_count)
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageBroadcast for RoomRegistry {
    async fn emit(&self, message: &Message) -> BroadcastResult<usize> {
        let rooms = self
            .rooms
            .read()
            .map_err(|e| BroadcastError::Registry(format!("lock poisoned: {e}")))?;

        let Some(sender) = rooms.get(&message.conversation_id()) else {
            return Ok(0);
        };

        // send only fails when the room has no receivers; that is the
        // no-subscriber case, not an error.
        Ok(sender.send(message.clone()).unwrap_or(0))
    }
}

/// A broadcaster that delivers nothing.
///
/// For wiring without a realtime channel; every client then converges via
/// polling.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBroadcast;

#[async_trait]
impl MessageBroadcast for NoopBroadcast {
    async fn emit(&self, _message: &Message) -> BroadcastResult<usize> {
        Ok(0)
    }
}
