//! `PostgreSQL` implementation of the `ConversationRepository` port.

use async_trait::async_trait;
use diesel::PgJsonbExpressionMethods;
use diesel::prelude::*;

use super::PgPool;
use super::models::{ConversationRow, conversation_to_insertable, row_to_conversation};
use super::schema::conversations;
use crate::messaging::{
    domain::{Conversation, ConversationId, UserId},
    error::{RepositoryError, RepositoryResult},
    ports::conversations::{ConversationRepository, FindOrCreate},
};

/// `PostgreSQL` implementation of [`ConversationRepository`].
///
/// Uses Diesel ORM with connection pooling via r2d2. The unique index over
/// `(property_id, buyer_id, seller_id)` makes `create_if_absent` atomic:
/// the insert runs `ON CONFLICT DO NOTHING` and the losing writer falls
/// back to reading the winner's row.
///
/// # Example
///
/// ```ignore
/// use diesel::r2d2::{ConnectionManager, Pool};
/// use diesel::PgConnection;
/// use veranda::messaging::adapters::postgres::PostgresConversationStore;
///
/// let manager = ConnectionManager::<PgConnection>::new("postgres://...");
/// let pool = Pool::builder().build(manager)?;
/// let store = PostgresConversationStore::new(pool);
/// ```
#[derive(Debug, Clone)]
pub struct PostgresConversationStore {
    pool: PgPool,
}

impl PostgresConversationStore {
    /// Creates a new store with the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn conn(
        &self,
    ) -> RepositoryResult<
        diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<PgConnection>>,
    > {
        self.pool
            .get()
            .map_err(|e| RepositoryError::connection(e.to_string()))
    }

    fn find_row_by_triple(
        conn: &mut PgConnection,
        candidate: &Conversation,
    ) -> RepositoryResult<Option<ConversationRow>> {
        conversations::table
            .filter(conversations::property_id.eq(candidate.property_id().as_str()))
            .filter(conversations::buyer_id.eq(candidate.buyer().as_str()))
            .filter(conversations::seller_id.eq(candidate.seller().as_str()))
            .select(ConversationRow::as_select())
            .first::<ConversationRow>(conn)
            .optional()
            .map_err(RepositoryError::database)
    }
}

#[async_trait]
impl ConversationRepository for PostgresConversationStore {
    async fn create_if_absent(&self, candidate: Conversation) -> RepositoryResult<FindOrCreate> {
        let mut conn = self.conn()?;

        let row = conversation_to_insertable(&candidate)?;
        let inserted = diesel::insert_into(conversations::table)
            .values(&row)
            .on_conflict((
                conversations::property_id,
                conversations::buyer_id,
                conversations::seller_id,
            ))
            .do_nothing()
            .execute(&mut conn)
            .map_err(RepositoryError::database)?;

        if inserted == 1 {
            return Ok(FindOrCreate::Created(candidate));
        }

        // Lost the race: read the winner's row.
        let existing = Self::find_row_by_triple(&mut conn, &candidate)?.ok_or_else(|| {
            RepositoryError::connection("conflict reported but no conversation row found")
        })?;
        Ok(FindOrCreate::Existing(row_to_conversation(existing)?))
    }

    async fn find_by_id(&self, id: ConversationId) -> RepositoryResult<Option<Conversation>> {
        let mut conn = self.conn()?;

        let result = conversations::table
            .filter(conversations::id.eq(id.into_inner()))
            .select(ConversationRow::as_select())
            .first::<ConversationRow>(&mut conn)
            .optional()
            .map_err(RepositoryError::database)?;

        match result {
            Some(row) => Ok(Some(row_to_conversation(row)?)),
            None => Ok(None),
        }
    }

    async fn find_by_participant(&self, user: &UserId) -> RepositoryResult<Vec<Conversation>> {
        let mut conn = self.conn()?;

        // Participant membership lives in the JSONB array; buyer and seller
        // columns cover the common cases without deserialising every row.
        let rows = conversations::table
            .filter(
                conversations::buyer_id
                    .eq(user.as_str())
                    .or(conversations::seller_id.eq(user.as_str()))
                    .or(conversations::participants
                        .contains(serde_json::json!([user.as_str()]))),
            )
            .select(ConversationRow::as_select())
            .load::<ConversationRow>(&mut conn)
            .map_err(RepositoryError::database)?;

        rows.into_iter().map(row_to_conversation).collect()
    }

    async fn update(&self, conversation: &Conversation) -> RepositoryResult<()> {
        let mut conn = self.conn()?;

        let participants = serde_json::to_value(conversation.participants())
            .map_err(|e| RepositoryError::serialization(e.to_string()))?;

        let updated = diesel::update(
            conversations::table.filter(conversations::id.eq(conversation.id().into_inner())),
        )
        .set((
            conversations::participants.eq(participants),
            conversations::status.eq(conversation.status().as_str()),
            conversations::last_message_at.eq(conversation.last_message_at()),
        ))
        .execute(&mut conn)
        .map_err(RepositoryError::database)?;

        if updated == 0 {
            return Err(RepositoryError::ConversationNotFound(conversation.id()));
        }
        Ok(())
    }

    async fn list_all(&self) -> RepositoryResult<Vec<Conversation>> {
        let mut conn = self.conn()?;

        let rows = conversations::table
            .order(conversations::last_message_at.desc())
            .select(ConversationRow::as_select())
            .load::<ConversationRow>(&mut conn)
            .map_err(RepositoryError::database)?;

        rows.into_iter().map(row_to_conversation).collect()
    }
}
