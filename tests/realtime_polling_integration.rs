//! Integration tests for real-time fan-out and the polling fallback
//! converging on the same durable thread state.

#![expect(
    clippy::expect_used,
    reason = "Test code uses expect for assertion clarity"
)]
#![expect(
    clippy::indexing_slicing,
    reason = "Test code uses indexing after length checks"
)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::DefaultClock;

use veranda::client::{FetchError, MessageFetcher, ThreadPoller};
use veranda::directory::adapters::memory::{InMemoryPropertyDirectory, InMemoryUserDirectory};
use veranda::directory::domain::{AccountRole, OwnerRef, PropertyRecord, UserProfile};
use veranda::directory::services::IdentityResolver;
use veranda::messaging::adapters::memory::{InMemoryConversationStore, InMemoryMessageStore};
use veranda::messaging::domain::{ConversationId, Message, MessageBody, PropertyId, UserId};
use veranda::messaging::ports::Page;
use veranda::messaging::services::{ConversationService, MessagingService};
use veranda::realtime::RoomRegistry;

type Conversations = ConversationService<
    InMemoryConversationStore,
    InMemoryMessageStore,
    InMemoryPropertyDirectory,
    InMemoryUserDirectory,
    DefaultClock,
>;

type Messaging = MessagingService<
    InMemoryConversationStore,
    InMemoryMessageStore,
    InMemoryUserDirectory,
    RoomRegistry,
    DefaultClock,
>;

fn user(id: &str) -> UserId {
    UserId::new(id).expect("valid user id")
}

fn property(id: &str) -> PropertyId {
    PropertyId::new(id).expect("valid property id")
}

fn marketplace() -> (Conversations, Messaging, RoomRegistry) {
    let conversation_store = Arc::new(InMemoryConversationStore::new());
    let message_store = Arc::new(InMemoryMessageStore::new());
    let properties = Arc::new(InMemoryPropertyDirectory::new());
    let users = Arc::new(InMemoryUserDirectory::new());
    let rooms = RoomRegistry::new();
    let clock = Arc::new(DefaultClock);

    properties
        .upsert(PropertyRecord {
            id: property("prop-7"),
            title: "Canal-side studio".to_owned(),
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
    (conversations, messaging, rooms)
}

/// Adapts the messaging service's thread read to the poller's port.
struct ServiceFetcher {
    messaging: Messaging,
}

#[async_trait]
impl MessageFetcher for ServiceFetcher {
    async fn fetch(
        &self,
        conversation_id: ConversationId,
        viewer: &UserId,
    ) -> Result<Vec<Message>, FetchError> {
        self.messaging
            .list_messages(viewer, conversation_id, Page::default())
            .await
            .map_err(|err| FetchError(err.to_string()))
    }
}

/// Sixteen simultaneous openers of the same thread all land on one record.
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_openers_converge_on_one_thread() {
    let (conversations, _messaging, _rooms) = marketplace();
    let service = Arc::new(conversations);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service
                .find_or_create(user("buyer-1"), property("prop-7"))
                .await
                .expect("find-or-create should succeed")
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.expect("task should complete").id());
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);
}

/// A room subscriber sees a message the moment it is durably stored.
#[tokio::test(flavor = "multi_thread")]
async fn live_subscribers_receive_stored_messages() {
    let (conversations, messaging, rooms) = marketplace();
    let thread = conversations
        .find_or_create(user("buyer-1"), property("prop-7"))
        .await
        .expect("open thread");

    let mut subscription = rooms.join(thread.id());
    let sent = messaging
        .send_message(&user("buyer-1"), thread.id(), MessageBody::text("ping"))
        .await
        .expect("send should succeed");

    let received = subscription.recv().await.expect("live delivery");
    assert_eq!(received.id(), sent.id());
    assert_eq!(received.sequence_number(), sent.sequence_number());
}

/// A poller without any push channel converges on the durable thread.
#[tokio::test(flavor = "multi_thread")]
async fn polling_alone_converges_on_the_thread() {
    let (conversations, messaging, _rooms) = marketplace();
    let thread = conversations
        .find_or_create(user("buyer-1"), property("prop-7"))
        .await
        .expect("open thread");

    let fetcher = Arc::new(ServiceFetcher {
        messaging: messaging.clone(),
    });
    let poller = ThreadPoller::start(
        fetcher,
        thread.id(),
        user("seller-1"),
        Duration::from_millis(10),
    );

    messaging
        .send_message(
            &user("buyer-1"),
            thread.id(),
            MessageBody::text("Are viewings still on?"),
        )
        .await
        .expect("send should succeed");
    tokio::time::sleep(Duration::from_millis(80)).await;

    let snapshot = poller.messages();
    assert_eq!(snapshot.len(), 1);
    // Polling the thread as the seller also records their read receipt.
    assert!(snapshot[0].is_read_by(&user("seller-1")));
    poller.stop();
}

/// Push delivery and a subsequent poll of the same message do not
/// duplicate it in the client's view.
#[tokio::test(flavor = "multi_thread")]
async fn push_and_poll_agree_without_duplicates() {
    let (conversations, messaging, rooms) = marketplace();
    let thread = conversations
        .find_or_create(user("buyer-1"), property("prop-7"))
        .await
        .expect("open thread");

    let mut subscription = rooms.join(thread.id());
    let fetcher = Arc::new(ServiceFetcher {
        messaging: messaging.clone(),
    });
    let poller = ThreadPoller::start(
        fetcher,
        thread.id(),
        user("seller-1"),
        Duration::from_millis(10),
    );

    let sent = messaging
        .send_message(&user("buyer-1"), thread.id(), MessageBody::text("hello"))
        .await
        .expect("send should succeed");

    // The push channel delivers first; the next poll sees the same message.
    let pushed = subscription.recv().await.expect("live delivery");
    poller.push(pushed);
    tokio::time::sleep(Duration::from_millis(80)).await;

    let snapshot = poller.messages();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id(), sent.id());
    poller.stop();
}
