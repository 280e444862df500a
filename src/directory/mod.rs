//! Identity resolution against the wider marketplace.
//!
//! The messaging core does not own properties, accounts, or sessions; it
//! consumes them through the lookup ports defined here. The one piece of
//! real logic is the [`services::IdentityResolver`], which encapsulates the
//! historical inconsistency in how a property's owner was recorded so that
//! no caller re-implements the fallback chain.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
