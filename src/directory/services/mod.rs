//! Orchestration services for marketplace lookups.

mod resolver;

pub use resolver::{IdentityResolver, ResolveError};
