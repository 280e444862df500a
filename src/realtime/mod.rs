//! Room-based real-time fan-out of newly stored messages.
//!
//! Each conversation maps to a room; connections join and leave rooms and
//! receive every message emitted while they are members. The registry is an
//! explicit, process-scoped object owned by whoever wires the application
//! together; it is never ambient global state. Room membership is not
//! durable: on process restart clients re-join and converge through
//! polling.

mod registry;

pub use registry::{NoopBroadcast, RoomRegistry, RoomSubscription};
