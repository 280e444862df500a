//! In-memory implementations of the messaging persistence ports.
//!
//! Thread-safe stores suitable for tests and single-process deployments
//! without a database. The conversation store performs its find-or-create
//! check-and-insert under a single write-lock acquisition, so the
//! per-triple uniqueness invariant holds under concurrent calls.

mod conversations;
mod messages;

pub use conversations::InMemoryConversationStore;
pub use messages::InMemoryMessageStore;
