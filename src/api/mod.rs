//! REST and WebSocket surface for the messaging core.
//!
//! Handlers stay thin: they translate HTTP shapes to service calls and
//! service errors to status codes. All policy (authorization, validation,
//! the mark-as-read side effect) lives in the services.

mod auth;
mod error;
mod routes;
mod state;
mod ws;

pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
