//! Domain types for marketplace lookups.

mod profile;
mod property;

pub use profile::{AccountRole, ParseAccountRoleError, UserProfile};
pub use property::{OwnerRef, PropertyRecord, PropertySummary};
