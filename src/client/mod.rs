//! Polling fallback for clients without an active real-time subscription.
//!
//! Polling is the correctness backstop and push is the latency
//! optimization; both are consumers of the same idempotent thread read.
//! The poller holds no server-side state: it repeats the read on a fixed
//! interval and reconciles its local view by message id.

mod poller;

pub use poller::{FetchError, MessageFetcher, ThreadPoller};

#[cfg(test)]
mod tests;
