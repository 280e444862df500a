//! Standalone messaging server.
//!
//! Serves the REST and WebSocket API over either the `PostgreSQL` stores
//! (when `DATABASE_URL` is set) or the in-memory stores. Directory lookups
//! are in-memory in both modes; property, account, and session data are
//! owned by external systems and this binary carries no copy of them.
//!
//! Configuration is read from the environment:
//!
//! - `BIND_ADDR` - socket address to listen on (default `127.0.0.1:8080`)
//! - `DATABASE_URL` - `PostgreSQL` connection string (optional)
//! - `RUST_LOG` - tracing filter (default `info`)

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use mockable::DefaultClock;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use veranda::api::{AppState, router};
use veranda::directory::adapters::memory::{
    InMemoryPropertyDirectory, InMemorySessionDirectory, InMemoryUserDirectory,
};
use veranda::directory::services::IdentityResolver;
use veranda::messaging::adapters::memory::{InMemoryConversationStore, InMemoryMessageStore};
use veranda::messaging::adapters::postgres::{
    PgPool, PostgresConversationStore, PostgresMessageStore,
};
use veranda::messaging::ports::{ConversationRepository, MessageRepository};
use veranda::messaging::services::{ConversationService, MessagingService};
use veranda::realtime::RoomRegistry;

/// Errors that can occur while starting or running the server.
#[derive(Debug, Error)]
enum ServerError {
    #[error("invalid bind address: {0}")]
    BindAddr(#[from] std::net::AddrParseError),
    #[error("failed to build connection pool: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error("failed to bind listener: {0}")]
    Listen(#[source] std::io::Error),
    #[error("server terminated: {0}")]
    Serve(#[source] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let bind_addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8080".to_owned())
        .parse()?;

    if let Ok(url) = env::var("DATABASE_URL") {
        info!("messaging store: postgresql");
        let manager = diesel::r2d2::ConnectionManager::new(url);
        let pool: PgPool = diesel::r2d2::Pool::builder().build(manager)?;
        let conversations = Arc::new(PostgresConversationStore::new(pool.clone()));
        let messages = Arc::new(PostgresMessageStore::new(pool));
        serve(conversations, messages, bind_addr).await
    } else {
        info!("messaging store: in-memory");
        let conversations = Arc::new(InMemoryConversationStore::new());
        let messages = Arc::new(InMemoryMessageStore::new());
        serve(conversations, messages, bind_addr).await
    }
}

async fn serve<C, M>(
    conversations: Arc<C>,
    messages: Arc<M>,
    addr: SocketAddr,
) -> Result<(), ServerError>
where
    C: ConversationRepository + 'static,
    M: MessageRepository + 'static,
{
    let properties = Arc::new(InMemoryPropertyDirectory::new());
    let users = Arc::new(InMemoryUserDirectory::new());
    let sessions = Arc::new(InMemorySessionDirectory::new());
    let clock = Arc::new(DefaultClock);
    let rooms = RoomRegistry::new();

    let resolver = IdentityResolver::new(Arc::clone(&properties));
    let conversation_service = ConversationService::new(
        Arc::clone(&conversations),
        Arc::clone(&messages),
        resolver,
        Arc::clone(&users),
        Arc::clone(&clock),
    );
    let messaging_service = MessagingService::new(
        conversations,
        messages,
        users,
        Arc::new(rooms.clone()),
        clock,
    );

    let state = AppState {
        conversations: conversation_service,
        messaging: messaging_service,
        sessions,
        rooms,
    };

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(ServerError::Listen)?;
    info!(%addr, "listening");
    axum::serve(listener, router(state))
        .await
        .map_err(ServerError::Serve)
}
