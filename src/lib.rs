//! Veranda: conversation and messaging core for a property-classifieds
//! marketplace.
//!
//! This crate implements the buyer/seller messaging subsystem: idempotent
//! per-property conversation threads, durable message storage with
//! read-receipt tracking, real-time room-based delivery with a polling
//! fallback, and an administrative support override path.
//!
//! # Architecture
//!
//! Veranda follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, in-memory)
//!
//! # Modules
//!
//! - [`messaging`]: Conversation and message aggregates, stores, and services
//! - [`directory`]: Identity resolution against the wider marketplace
//! - [`realtime`]: Room-based fan-out of newly stored messages
//! - [`client`]: Polling fallback for clients without a push subscription
//! - [`api`]: REST and WebSocket surface

pub mod api;
pub mod client;
pub mod directory;
pub mod messaging;
pub mod realtime;
