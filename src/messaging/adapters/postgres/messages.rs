//! `PostgreSQL` implementation of the `MessageRepository` port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::PgJsonbExpressionMethods;
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;

use super::PgPool;
use super::models::{MessageRow, message_to_insertable, row_to_message};
use super::schema::messages;
use crate::messaging::{
    domain::{ConversationId, Message, MessageId, SequenceNumber, UserId},
    error::{RepositoryError, RepositoryResult},
    ports::messages::{MessageRepository, Page},
};

/// `PostgreSQL` implementation of [`MessageRepository`].
///
/// Message payloads and read-receipt sets are stored as JSONB. The unique
/// index over `(conversation_id, sequence_number)` backs the per-thread
/// ordering contract; receipt set-add runs inside a transaction so two
/// concurrent viewers never clobber each other's receipts.
#[derive(Debug, Clone)]
pub struct PostgresMessageStore {
    pool: PgPool,
}

impl PostgresMessageStore {
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

    fn map_insert_error(message: &Message, err: diesel::result::Error) -> RepositoryError {
        if let diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info) =
            err
        {
            if info
                .constraint_name()
                .is_some_and(|name| name.contains("sequence"))
            {
                return RepositoryError::DuplicateSequence {
                    conversation_id: message.conversation_id(),
                    sequence: message.sequence_number(),
                };
            }
            return RepositoryError::DuplicateMessage(message.id());
        }
        RepositoryError::database(err)
    }
}

#[async_trait]
impl MessageRepository for PostgresMessageStore {
    async fn append(&self, message: &Message) -> RepositoryResult<()> {
        let mut conn = self.conn()?;

        let row = message_to_insertable(message)?;
        diesel::insert_into(messages::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Self::map_insert_error(message, e))?;

        Ok(())
    }

    async fn page_newest_first(
        &self,
        conversation_id: ConversationId,
        page: Page,
    ) -> RepositoryResult<Vec<Message>> {
        let mut conn = self.conn()?;

        let offset = i64::try_from(page.offset())
            .map_err(|e| RepositoryError::serialization(e.to_string()))?;

        let rows = messages::table
            .filter(messages::conversation_id.eq(conversation_id.into_inner()))
            .order(messages::sequence_number.desc())
            .offset(offset)
            .limit(i64::from(page.size()))
            .select(MessageRow::as_select())
            .load::<MessageRow>(&mut conn)
            .map_err(RepositoryError::database)?;

        rows.into_iter().map(row_to_message).collect()
    }

    async fn next_sequence_number(
        &self,
        conversation_id: ConversationId,
    ) -> RepositoryResult<SequenceNumber> {
        let mut conn = self.conn()?;

        let max_seq: Option<i64> = messages::table
            .filter(messages::conversation_id.eq(conversation_id.into_inner()))
            .select(diesel::dsl::max(messages::sequence_number))
            .first(&mut conn)
            .map_err(RepositoryError::database)?;

        let next = max_seq.unwrap_or(0).saturating_add(1);
        let next_u64 =
            u64::try_from(next).map_err(|e| RepositoryError::serialization(e.to_string()))?;

        Ok(SequenceNumber::new(next_u64))
    }

    async fn mark_read(
        &self,
        conversation_id: ConversationId,
        reader: &UserId,
        message_ids: &[MessageId],
        at: DateTime<Utc>,
    ) -> RepositoryResult<u64> {
        let mut conn = self.conn()?;

        let ids: Vec<uuid::Uuid> = message_ids.iter().map(|id| id.into_inner()).collect();

        conn.transaction::<u64, RepositoryError, _>(|tx_conn| {
            let rows = messages::table
                .filter(messages::conversation_id.eq(conversation_id.into_inner()))
                .filter(messages::id.eq_any(&ids))
                .select(MessageRow::as_select())
                .for_update()
                .load::<MessageRow>(tx_conn)
                .map_err(RepositoryError::database)?;

            let mut added = 0u64;
            for row in rows {
                let mut message = row_to_message(row)?;
                if message.mark_read(reader, at) {
                    let receipts = serde_json::to_value(message.read_receipts())
                        .map_err(|e| RepositoryError::serialization(e.to_string()))?;
                    diesel::update(
                        messages::table.filter(messages::id.eq(message.id().into_inner())),
                    )
                    .set(messages::read_receipts.eq(receipts))
                    .execute(tx_conn)
                    .map_err(RepositoryError::database)?;
                    added = added.saturating_add(1);
                }
            }
            Ok(added)
        })
    }

    async fn count_unread(
        &self,
        conversation_id: ConversationId,
        viewer: &UserId,
    ) -> RepositoryResult<u64> {
        let mut conn = self.conn()?;

        let count: i64 = messages::table
            .filter(messages::conversation_id.eq(conversation_id.into_inner()))
            .filter(messages::sender_id.ne(viewer.as_str()))
            .filter(diesel::dsl::not(
                messages::read_receipts.has_key(viewer.as_str()),
            ))
            .count()
            .get_result(&mut conn)
            .map_err(RepositoryError::database)?;

        u64::try_from(count).map_err(|e| RepositoryError::serialization(e.to_string()))
    }

    async fn latest(&self, conversation_id: ConversationId) -> RepositoryResult<Option<Message>> {
        let mut conn = self.conn()?;

        let result = messages::table
            .filter(messages::conversation_id.eq(conversation_id.into_inner()))
            .order(messages::sequence_number.desc())
            .select(MessageRow::as_select())
            .first::<MessageRow>(&mut conn)
            .optional()
            .map_err(RepositoryError::database)?;

        match result {
            Some(row) => Ok(Some(row_to_message(row)?)),
            None => Ok(None),
        }
    }
}
