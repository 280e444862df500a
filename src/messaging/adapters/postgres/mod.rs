//! `PostgreSQL` implementations of the messaging persistence ports using
//! Diesel ORM.
//!
//! Provides production-grade persistence: the conversation table carries a
//! unique index over (property, buyer, seller) so find-or-create is an
//! `ON CONFLICT DO NOTHING` insert with a fallback read, and the message
//! table is unique over (conversation, sequence) to back the per-thread
//! ordering contract. Receipts live in a JSONB column and are merged inside
//! a transaction.

mod conversations;
mod messages;
mod models;
mod schema;

use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};

pub use conversations::PostgresConversationStore;
pub use messages::PostgresMessageStore;

/// `PostgreSQL` connection pool type.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;
