//! Shared handler state.

use std::sync::Arc;

use mockable::Clock;

use crate::directory::ports::{PropertyDirectory, SessionDirectory, UserDirectory};
use crate::messaging::ports::{ConversationRepository, MessageBroadcast, MessageRepository};
use crate::messaging::services::{ConversationService, MessagingService};
use crate::realtime::RoomRegistry;

/// Application state shared by every handler.
///
/// Generic over the storage, directory, and broadcast ports so the same
/// router serves the in-memory wiring in tests and the Postgres wiring in
/// production.
pub struct AppState<C, M, P, U, S, B, K>
where
    C: ConversationRepository + 'static,
    M: MessageRepository + 'static,
    P: PropertyDirectory + 'static,
    U: UserDirectory + 'static,
    S: SessionDirectory + 'static,
    B: MessageBroadcast + 'static,
    K: Clock + Send + Sync + 'static,
{
    /// Conversation existence and access control.
    pub conversations: ConversationService<C, M, P, U, K>,
    /// Message read/write path.
    pub messaging: MessagingService<C, M, U, B, K>,
    /// Session token resolution.
    pub sessions: Arc<S>,
    /// Room registry backing WebSocket subscriptions.
    pub rooms: RoomRegistry,
}

impl<C, M, P, U, S, B, K> Clone for AppState<C, M, P, U, S, B, K>
where
    C: ConversationRepository + 'static,
    M: MessageRepository + 'static,
    P: PropertyDirectory + 'static,
    U: UserDirectory + 'static,
    S: SessionDirectory + 'static,
    B: MessageBroadcast + 'static,
    K: Clock + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            conversations: self.conversations.clone(),
            messaging: self.messaging.clone(),
            sessions: Arc::clone(&self.sessions),
            rooms: self.rooms.clone(),
        }
    }
}
