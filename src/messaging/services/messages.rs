//! Messaging operations service.
//!
//! Owns the message read/write path: paginated listing with the
//! mark-as-read side effect, and the send path with admin override,
//! denormalized sender details, and the best-effort real-time emit.

use std::sync::Arc;

use mockable::Clock;
use thiserror::Error;
use tracing::{debug, warn};

use crate::directory::domain::{AccountRole, UserProfile};
use crate::directory::ports::{DirectoryError, UserDirectory};
use crate::messaging::{
    domain::{
        Conversation, ConversationId, Message, MessageBody, MessageError, MessageId,
        NewMessageParams, SenderRole, UserId,
    },
    error::RepositoryError,
    ports::broadcast::MessageBroadcast,
    ports::conversations::ConversationRepository,
    ports::messages::{MessageRepository, Page},
};

/// Service-level errors for messaging operations.
#[derive(Debug, Error)]
pub enum MessagingServiceError {
    /// The conversation does not exist.
    #[error("conversation not found: {0}")]
    NotFound(ConversationId),

    /// The identity is not a participant of the conversation.
    #[error("identity {user} is not a participant of conversation {conversation_id}")]
    Forbidden {
        /// The rejected identity.
        user: UserId,
        /// The conversation that was accessed.
        conversation_id: ConversationId,
    },

    /// The sender's account could not be found.
    #[error("unknown sender: {0}")]
    UnknownSender(UserId),

    /// The message payload failed validation.
    #[error(transparent)]
    Validation(#[from] MessageError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Directory lookup failed.
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// Result type for messaging operations.
pub type MessagingServiceResult<T> = Result<T, MessagingServiceError>;

/// Appends retried after losing a sequence-number race before giving up.
const SEQUENCE_RETRY_LIMIT: u32 = 3;

/// Message read/write orchestration service.
pub struct MessagingService<C, M, U, B, K>
where
    C: ConversationRepository,
    M: MessageRepository,
    U: UserDirectory,
    B: MessageBroadcast,
    K: Clock + Send + Sync,
{
    conversations: Arc<C>,
    messages: Arc<M>,
    users: Arc<U>,
    broadcast: Arc<B>,
    clock: Arc<K>,
}

impl<C, M, U, B, K> Clone for MessagingService<C, M, U, B, K>
where
    C: ConversationRepository,
    M: MessageRepository,
    U: UserDirectory,
    B: MessageBroadcast,
    K: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            conversations: Arc::clone(&self.conversations),
            messages: Arc::clone(&self.messages),
            users: Arc::clone(&self.users),
            broadcast: Arc::clone(&self.broadcast),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C, M, U, B, K> MessagingService<C, M, U, B, K>
where
    C: ConversationRepository,
    M: MessageRepository,
    U: UserDirectory,
    B: MessageBroadcast,
    K: Clock + Send + Sync,
{
    /// Creates a new messaging service.
    #[must_use]
    pub const fn new(
        conversations: Arc<C>,
        messages: Arc<M>,
        users: Arc<U>,
        broadcast: Arc<B>,
        clock: Arc<K>,
    ) -> Self {
        Self {
            conversations,
            messages,
            users,
            broadcast,
            clock,
        }
    }

    /// Lists one page of a conversation's messages in ascending
    /// chronological order (oldest first).
    ///
    /// Storage paginates from the newest end; the page is reversed before
    /// returning so the externally observable contract is always ascending.
    ///
    /// Side effect: every returned message authored by someone else and not
    /// yet read by the viewer gains a read receipt at call time. The
    /// operation is idempotent: repeating it neither duplicates receipts
    /// nor changes already-recorded read timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`MessagingServiceError::NotFound`] for an unknown
    /// conversation and [`MessagingServiceError::Forbidden`] when the
    /// viewer is neither a participant nor an admin.
    pub async fn list_messages(
        &self,
        viewer: &UserId,
        conversation_id: ConversationId,
        page: Page,
    ) -> MessagingServiceResult<Vec<Message>> {
        let conversation = self.load_authorized(viewer, conversation_id).await?.0;

        let mut messages = self
            .messages
            .page_newest_first(conversation.id(), page)
            .await?;

        let unread_ids: Vec<MessageId> = messages
            .iter()
            .filter(|m| m.sender() != viewer && !m.is_read_by(viewer))
            .map(Message::id)
            .collect();

        if !unread_ids.is_empty() {
            let now = self.clock.utc();
            self.messages
                .mark_read(conversation.id(), viewer, &unread_ids, now)
                .await?;
            for message in &mut messages {
                if unread_ids.contains(&message.id()) {
                    message.mark_read(viewer, now);
                }
            }
        }

        messages.reverse();
        Ok(messages)
    }

    /// Appends a message to the conversation and pushes it to room
    /// subscribers.
    ///
    /// The sender's display name and role are captured at send time, so
    /// later account changes do not rewrite history. Admin senders bypass
    /// the participant check and are enrolled into the participant set on
    /// success. Concurrent sends into one conversation all land: a lost
    /// sequence-number race is retried with a fresh number instead of
    /// surfacing. The real-time emit happens only after the message is
    /// durably stored and is best-effort: a failed emit is logged and
    /// swallowed.
    ///
    /// # Errors
    ///
    /// Returns [`MessagingServiceError::Forbidden`] for a non-participant
    /// sender, [`MessagingServiceError::Validation`] for an empty body, or
    /// [`MessagingServiceError::UnknownSender`] when the sender's account
    /// cannot be resolved.
    pub async fn send_message(
        &self,
        sender: &UserId,
        conversation_id: ConversationId,
        body: MessageBody,
    ) -> MessagingServiceResult<Message> {
        let (mut conversation, maybe_profile) =
            self.load_authorized(sender, conversation_id).await?;
        let profile =
            maybe_profile.ok_or_else(|| MessagingServiceError::UnknownSender(sender.clone()))?;

        if body.is_empty() {
            return Err(MessageError::EmptyBody.into());
        }

        let message = self
            .append_with_next_sequence(&conversation, sender, &profile, body)
            .await?;

        conversation.touch(&*self.clock);
        if profile.is_admin() && conversation.enrol(sender.clone()) {
            debug!(%sender, %conversation_id, "admin enrolled as participant");
        }
        self.conversations.update(&conversation).await?;

        match self.broadcast.emit(&message).await {
            Ok(subscribers) => {
                debug!(message_id = %message.id(), subscribers, "message emitted");
            }
            Err(err) => {
                // Durability does not depend on live delivery; polling
                // clients converge on the stored message.
                warn!(message_id = %message.id(), error = %err, "real-time emit failed");
            }
        }

        Ok(message)
    }

    /// Assigns the next sequence number and appends in one retried step.
    ///
    /// Two concurrent senders can read the same next sequence; the loser's
    /// append is refused by the per-conversation uniqueness constraint, so
    /// the assignment is repeated with a fresh read rather than surfaced.
    /// The message is rebuilt each attempt and keeps its body; only the
    /// sequence number and id differ between attempts.
    async fn append_with_next_sequence(
        &self,
        conversation: &Conversation,
        sender: &UserId,
        profile: &UserProfile,
        body: MessageBody,
    ) -> MessagingServiceResult<Message> {
        let mut attempt = 0;
        loop {
            let sequence_number = self.messages.next_sequence_number(conversation.id()).await?;
            let message = Message::new(
                NewMessageParams {
                    conversation_id: conversation.id(),
                    sequence_number,
                    sender: sender.clone(),
                    sender_name: profile.display_name.clone(),
                    sender_role: sender_position(conversation, profile),
                    body: body.clone(),
                },
                &*self.clock,
            )?;

            match self.messages.append(&message).await {
                Ok(()) => return Ok(message),
                Err(RepositoryError::DuplicateSequence { sequence, .. })
                    if attempt < SEQUENCE_RETRY_LIMIT =>
                {
                    attempt += 1;
                    debug!(%sequence, attempt, "sequence contention, retrying append");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Loads the conversation and checks access in one step.
    ///
    /// Returns the sender's profile alongside, when one exists, so callers
    /// avoid a second directory round trip.
    async fn load_authorized(
        &self,
        user: &UserId,
        conversation_id: ConversationId,
    ) -> MessagingServiceResult<(Conversation, Option<UserProfile>)> {
        let conversation = self
            .conversations
            .find_by_id(conversation_id)
            .await?
            .ok_or(MessagingServiceError::NotFound(conversation_id))?;

        let profile = self.users.find_profile(user).await?;
        let is_admin = profile.as_ref().is_some_and(UserProfile::is_admin);

        if !conversation.is_participant(user) && !is_admin {
            warn!(%user, %conversation_id, "access denied: not a participant");
            return Err(MessagingServiceError::Forbidden {
                user: user.clone(),
                conversation_id,
            });
        }

        Ok((conversation, profile))
    }
}

fn sender_position(conversation: &Conversation, profile: &UserProfile) -> SenderRole {
    if profile.is_admin() {
        return SenderRole::Admin;
    }
    if &profile.id == conversation.buyer() {
        return SenderRole::Buyer;
    }
    if profile.role == AccountRole::Agent {
        return SenderRole::Agent;
    }
    SenderRole::Seller
}
