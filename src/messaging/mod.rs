//! Conversation threads and durable messaging for Veranda.
//!
//! This module implements the core of the marketplace messaging subsystem:
//! find-or-create conversation threads scoped to a (property, buyer, seller)
//! triple, an append-only message log with read-receipt tracking, per-viewer
//! unread counts, and the administrative support override path. The module
//! follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
