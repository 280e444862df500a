//! Conversation management service.
//!
//! The single authority for conversation existence and access control:
//! find-or-create, participant listing, authorization, and the
//! administrative status path all go through here.

use std::sync::Arc;

use mockable::Clock;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::directory::domain::{AccountRole, PropertySummary, UserProfile};
use crate::directory::ports::{DirectoryError, PropertyDirectory, UserDirectory};
use crate::directory::services::{IdentityResolver, ResolveError};
use crate::messaging::{
    domain::{
        Conversation, ConversationError, ConversationId, ConversationParams, ConversationStatus,
        Message, PropertyId, SenderRole, UserId,
    },
    error::RepositoryError,
    ports::conversations::ConversationRepository,
    ports::messages::MessageRepository,
};

/// A conversation enriched for list display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationSummary {
    /// The conversation itself.
    pub conversation: Conversation,
    /// Property details, when the listing still exists.
    pub property: Option<PropertySummary>,
    /// Display name of the other side, when their account still exists.
    pub counterpart_name: Option<String>,
    /// Role of the other side from the viewer's perspective.
    pub counterpart_role: SenderRole,
    /// The most recent message, if any.
    pub latest_message: Option<Message>,
    /// Number of messages the viewer has not read.
    pub unread: u64,
}

/// Service-level errors for conversation operations.
#[derive(Debug, Error)]
pub enum ConversationServiceError {
    /// Seller resolution failed (property missing or ownerless).
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Domain validation failed (buyer equals seller).
    #[error(transparent)]
    Domain(#[from] ConversationError),

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

    /// The operation requires a support administrator.
    #[error("identity {0} is not a support administrator")]
    AdminRequired(UserId),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Directory lookup failed.
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// Result type for conversation service operations.
pub type ConversationServiceResult<T> = Result<T, ConversationServiceError>;

/// Conversation existence and access-control orchestration service.
pub struct ConversationService<C, M, P, U, K>
where
    C: ConversationRepository,
    M: MessageRepository,
    P: PropertyDirectory,
    U: UserDirectory,
    K: Clock + Send + Sync,
{
    conversations: Arc<C>,
    messages: Arc<M>,
    resolver: IdentityResolver<P>,
    users: Arc<U>,
    clock: Arc<K>,
}

impl<C, M, P, U, K> Clone for ConversationService<C, M, P, U, K>
where
    C: ConversationRepository,
    M: MessageRepository,
    P: PropertyDirectory,
    U: UserDirectory,
    K: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            conversations: Arc::clone(&self.conversations),
            messages: Arc::clone(&self.messages),
            resolver: self.resolver.clone(),
            users: Arc::clone(&self.users),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C, M, P, U, K> ConversationService<C, M, P, U, K>
where
    C: ConversationRepository,
    M: MessageRepository,
    P: PropertyDirectory,
    U: UserDirectory,
    K: Clock + Send + Sync,
{
    /// Creates a new conversation service.
    #[must_use]
    pub const fn new(
        conversations: Arc<C>,
        messages: Arc<M>,
        resolver: IdentityResolver<P>,
        users: Arc<U>,
        clock: Arc<K>,
    ) -> Self {
        Self {
            conversations,
            messages,
            resolver,
            users,
            clock,
        }
    }

    /// Returns the existing conversation for (property, buyer, resolved
    /// seller), or atomically creates one.
    ///
    /// Callers cannot distinguish creation from retrieval, by design. Two
    /// simultaneous calls for the same triple converge on one conversation:
    /// the store performs a single atomic insert-if-absent and the losing
    /// writer receives the winner's record.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationServiceError::Resolve`] when the property is
    /// missing or has no owner, [`ConversationServiceError::Domain`] when
    /// the buyer owns the property, or a repository error when the store is
    /// unavailable.
    pub async fn find_or_create(
        &self,
        buyer: UserId,
        property_id: PropertyId,
    ) -> ConversationServiceResult<Conversation> {
        let seller = self.resolver.resolve_seller(&property_id).await?;

        let candidate = Conversation::new(
            ConversationParams::new(property_id, buyer, seller),
            &*self.clock,
        )?;

        let outcome = self.conversations.create_if_absent(candidate).await?;
        let created = outcome.was_created();
        let conversation = outcome.into_conversation();
        if created {
            info!(conversation_id = %conversation.id(), "conversation created");
        }
        Ok(conversation)
    }

    /// Lists the user's conversations, newest activity first, each enriched
    /// with property summary, counterpart details, the latest message, and
    /// the viewer's unread count.
    ///
    /// Viewing this list does not record read receipts; only listing a full
    /// thread does.
    ///
    /// # Errors
    ///
    /// Returns a repository or directory error when enrichment lookups fail.
    pub async fn list_for_user(
        &self,
        user: &UserId,
    ) -> ConversationServiceResult<Vec<ConversationSummary>> {
        let mut conversations = self.conversations.find_by_participant(user).await?;
        conversations.sort_by(|a, b| b.last_message_at().cmp(&a.last_message_at()));

        let mut summaries = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            summaries.push(self.summarize(conversation, user).await?);
        }
        Ok(summaries)
    }

    /// Checks that the identity may read and write the conversation.
    ///
    /// Admin identities pass unconditionally but are not enrolled here;
    /// enrolment is an explicit transition triggered only by a successful
    /// admin send.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationServiceError::NotFound`] for an unknown
    /// conversation and [`ConversationServiceError::Forbidden`] for a
    /// non-participant. Forbidden outcomes are logged, as repeated denials
    /// from one identity may indicate probing.
    pub async fn authorize(
        &self,
        user: &UserId,
        conversation_id: ConversationId,
    ) -> ConversationServiceResult<Conversation> {
        let conversation = self
            .conversations
            .find_by_id(conversation_id)
            .await?
            .ok_or(ConversationServiceError::NotFound(conversation_id))?;

        if conversation.is_participant(user) || self.is_admin(user).await? {
            return Ok(conversation);
        }

        warn!(%user, %conversation_id, "access denied: not a participant");
        Err(ConversationServiceError::Forbidden {
            user: user.clone(),
            conversation_id,
        })
    }

    /// Applies a new lifecycle status. Restricted to support
    /// administrators; any transition is permitted.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationServiceError::AdminRequired`] for a
    /// non-admin actor or [`ConversationServiceError::NotFound`] for an
    /// unknown conversation.
    pub async fn update_status(
        &self,
        actor: &UserId,
        conversation_id: ConversationId,
        status: ConversationStatus,
    ) -> ConversationServiceResult<Conversation> {
        self.require_admin(actor).await?;

        let mut conversation = self
            .conversations
            .find_by_id(conversation_id)
            .await?
            .ok_or(ConversationServiceError::NotFound(conversation_id))?;

        conversation.set_status(status);
        self.conversations.update(&conversation).await?;
        info!(%conversation_id, %status, "conversation status updated");
        Ok(conversation)
    }

    /// Lists every conversation for the support dashboard, newest activity
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationServiceError::AdminRequired`] for a non-admin
    /// actor.
    pub async fn list_all(&self, actor: &UserId) -> ConversationServiceResult<Vec<Conversation>> {
        self.require_admin(actor).await?;

        let mut conversations = self.conversations.list_all().await?;
        conversations.sort_by(|a, b| b.last_message_at().cmp(&a.last_message_at()));
        Ok(conversations)
    }

    /// Checks that the actor holds a support-administrator account.
    ///
    /// Ordinary participants do not pass; participancy grants access to a
    /// conversation's content, never to the administrative surface.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationServiceError::AdminRequired`] for any
    /// non-admin actor.
    pub async fn require_admin(&self, actor: &UserId) -> ConversationServiceResult<()> {
        if self.is_admin(actor).await? {
            Ok(())
        } else {
            warn!(%actor, "access denied: administrator required");
            Err(ConversationServiceError::AdminRequired(actor.clone()))
        }
    }

    async fn is_admin(&self, user: &UserId) -> Result<bool, DirectoryError> {
        Ok(self
            .users
            .find_profile(user)
            .await?
            .is_some_and(|profile| profile.is_admin()))
    }

    async fn summarize(
        &self,
        conversation: Conversation,
        viewer: &UserId,
    ) -> ConversationServiceResult<ConversationSummary> {
        let property = match self.resolver.find_record(conversation.property_id()).await {
            Ok(record) => Some(record.summary()),
            Err(ResolveError::PropertyNotFound(_)) => None,
            Err(err) => return Err(err.into()),
        };

        let counterpart = conversation.counterpart(viewer).clone();
        let counterpart_profile = self.users.find_profile(&counterpart).await?;
        let counterpart_role = counterpart_position(&conversation, &counterpart, counterpart_profile.as_ref());

        let latest_message = self.messages.latest(conversation.id()).await?;
        let unread = self.messages.count_unread(conversation.id(), viewer).await?;

        Ok(ConversationSummary {
            conversation,
            property,
            counterpart_name: counterpart_profile.map(|p| p.display_name),
            counterpart_role,
            latest_message,
            unread,
        })
    }
}

fn counterpart_position(
    conversation: &Conversation,
    counterpart: &UserId,
    profile: Option<&UserProfile>,
) -> SenderRole {
    if profile.is_some_and(UserProfile::is_admin) {
        return SenderRole::Admin;
    }
    if counterpart == conversation.buyer() {
        return SenderRole::Buyer;
    }
    if profile.is_some_and(|p| p.role == AccountRole::Agent) {
        return SenderRole::Agent;
    }
    SenderRole::Seller
}
