//! Integration tests for the HTTP surface, driven over a real listener.

#![expect(
    clippy::expect_used,
    reason = "Test code uses expect for assertion clarity"
)]

use std::net::SocketAddr;
use std::sync::Arc;

use mockable::DefaultClock;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use veranda::api::{AppState, router};
use veranda::directory::adapters::memory::{
    InMemoryPropertyDirectory, InMemorySessionDirectory, InMemoryUserDirectory,
};
use veranda::directory::domain::{AccountRole, OwnerRef, PropertyRecord, UserProfile};
use veranda::directory::services::IdentityResolver;
use veranda::messaging::adapters::memory::{InMemoryConversationStore, InMemoryMessageStore};
use veranda::messaging::domain::{ConversationId, PropertyId, UserId};
use veranda::messaging::services::{ConversationService, MessagingService};
use veranda::realtime::RoomRegistry;

fn user(id: &str) -> UserId {
    UserId::new(id).expect("valid user id")
}

fn property(id: &str) -> PropertyId {
    PropertyId::new(id).expect("valid property id")
}

/// Serves the full router over an ephemeral port with an open thread
/// between buyer-1 and seller-1. Tokens: `buyer-token` and `admin-token`.
async fn serve_marketplace() -> (SocketAddr, ConversationId) {
    let conversation_store = Arc::new(InMemoryConversationStore::new());
    let message_store = Arc::new(InMemoryMessageStore::new());
    let properties = Arc::new(InMemoryPropertyDirectory::new());
    let users = Arc::new(InMemoryUserDirectory::new());
    let sessions = Arc::new(InMemorySessionDirectory::new());
    let rooms = RoomRegistry::new();
    let clock = Arc::new(DefaultClock);

    properties
        .upsert(PropertyRecord {
            id: property("prop-9"),
            title: "Garden maisonette".to_owned(),
            owner: Some(OwnerRef::Id("seller-1".to_owned())),
            seller: None,
            user: None,
        })
        .expect("seed property");
    users
        .upsert(UserProfile::new(user("buyer-1"), "Ada", AccountRole::User))
        .expect("seed buyer");
    users
        .upsert(UserProfile::new(user("seller-1"), "Bertil", AccountRole::User))
        .expect("seed seller");
    users
        .upsert(UserProfile::new(user("admin-1"), "Support", AccountRole::Admin))
        .expect("seed admin");
    sessions
        .issue("buyer-token", user("buyer-1"))
        .expect("issue buyer token");
    sessions
        .issue("admin-token", user("admin-1"))
        .expect("issue admin token");

    let conversations = ConversationService::new(
        Arc::clone(&conversation_store),
        Arc::clone(&message_store),
        IdentityResolver::new(properties),
        Arc::clone(&users),
        Arc::clone(&clock),
    );
    let messaging = MessagingService::new(
        conversation_store,
        message_store,
        users,
        Arc::new(rooms.clone()),
        clock,
    );

    let thread = conversations
        .find_or_create(user("buyer-1"), property("prop-9"))
        .await
        .expect("open thread");

    let state = AppState {
        conversations,
        messaging,
        sessions,
        rooms,
    };
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.expect("server runs");
    });
    (addr, thread.id())
}

/// Issues one POST and returns the response status code.
async fn post(addr: SocketAddr, path: &str, token: Option<&str>, body: &str) -> u16 {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    let authorization = token.map_or_else(String::new, |t| format!("Authorization: Bearer {t}\r\n"));
    let request = format!(
        "POST {path} HTTP/1.1\r\nHost: localhost\r\n{authorization}Content-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream
        .write_all(request.as_bytes())
        .await
        .expect("write request");
    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .await
        .expect("read response");
    let text = String::from_utf8_lossy(&response);
    let status_line = text.lines().next().expect("status line");
    status_line
        .split(' ')
        .nth(1)
        .expect("status code")
        .parse()
        .expect("numeric status")
}

/// A plain participant's token does not open the admin send route.
#[tokio::test(flavor = "multi_thread")]
async fn admin_send_route_refuses_non_admin_participants() {
    let (addr, thread_id) = serve_marketplace().await;
    let path = format!("/admin/conversations/{thread_id}/messages");

    let status = post(addr, &path, Some("buyer-token"), r#"{"text":"let me in"}"#).await;
    assert_eq!(status, 403);
}

/// The same route admits an administrator and stores the message.
#[tokio::test(flavor = "multi_thread")]
async fn admin_send_route_admits_administrators() {
    let (addr, thread_id) = serve_marketplace().await;
    let path = format!("/admin/conversations/{thread_id}/messages");

    let status = post(addr, &path, Some("admin-token"), r#"{"text":"support here"}"#).await;
    assert_eq!(status, 201);
}

/// The ordinary send route keeps accepting participants.
#[tokio::test(flavor = "multi_thread")]
async fn participant_send_route_still_accepts_participants() {
    let (addr, thread_id) = serve_marketplace().await;
    let path = format!("/conversations/{thread_id}/messages");

    let status = post(addr, &path, Some("buyer-token"), r#"{"text":"hello"}"#).await;
    assert_eq!(status, 201);
}

/// Requests without a bearer token never reach a handler body.
#[tokio::test(flavor = "multi_thread")]
async fn missing_tokens_are_unauthorized() {
    let (addr, thread_id) = serve_marketplace().await;
    let path = format!("/conversations/{thread_id}/messages");

    let status = post(addr, &path, None, r#"{"text":"anonymous"}"#).await;
    assert_eq!(status, 401);
}
