//! Tests for the polling fallback.

#![expect(
    clippy::expect_used,
    reason = "Test code uses expect for assertion clarity"
)]
#![expect(
    clippy::indexing_slicing,
    reason = "Test code uses indexing after length checks"
)]

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use mockable::DefaultClock;
use rstest::rstest;

use crate::client::{FetchError, MessageFetcher, ThreadPoller};
use crate::messaging::domain::{
    ConversationId, Message, MessageBody, NewMessageParams, SenderRole, SequenceNumber, UserId,
};

fn message_for(conversation_id: ConversationId, sequence: u64) -> Message {
    Message::new(
        NewMessageParams {
            conversation_id,
            sequence_number: SequenceNumber::new(sequence),
            sender: UserId::new("seller-1").expect("valid user id"),
            sender_name: "Bertil".into(),
            sender_role: SenderRole::Seller,
            body: MessageBody::text(format!("message {sequence}")),
        },
        &DefaultClock,
    )
    .expect("valid message")
}

/// Serves a scripted thread snapshot; batches can be swapped between ticks.
struct ScriptedFetcher {
    batch: Mutex<Result<Vec<Message>, FetchError>>,
}

impl ScriptedFetcher {
    fn serving(messages: Vec<Message>) -> Arc<Self> {
        Arc::new(Self {
            batch: Mutex::new(Ok(messages)),
        })
    }

    fn swap(&self, next: Result<Vec<Message>, FetchError>) {
        *self.batch.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }
}

#[async_trait]
impl MessageFetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        _conversation_id: ConversationId,
        _viewer: &UserId,
    ) -> Result<Vec<Message>, FetchError> {
        self.batch
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(80)).await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn polling_picks_up_the_served_thread() {
    let conversation_id = ConversationId::new();
    let fetcher = ScriptedFetcher::serving(vec![
        message_for(conversation_id, 1),
        message_for(conversation_id, 2),
    ]);

    let poller = ThreadPoller::start(
        Arc::clone(&fetcher),
        conversation_id,
        UserId::new("buyer-1").expect("valid user id"),
        Duration::from_millis(10),
    );
    settle().await;

    let snapshot = poller.messages();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].sequence_number(), SequenceNumber::new(1));
    assert_eq!(snapshot[1].sequence_number(), SequenceNumber::new(2));
    poller.stop();
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn repeated_polls_do_not_duplicate_messages() {
    let conversation_id = ConversationId::new();
    let fetcher = ScriptedFetcher::serving(vec![message_for(conversation_id, 1)]);

    let poller = ThreadPoller::start(
        Arc::clone(&fetcher),
        conversation_id,
        UserId::new("buyer-1").expect("valid user id"),
        Duration::from_millis(10),
    );
    settle().await;

    assert_eq!(poller.messages().len(), 1);
    poller.stop();
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pushed_messages_merge_with_polled_ones_in_sequence_order() {
    let conversation_id = ConversationId::new();
    let polled = message_for(conversation_id, 2);
    let pushed = message_for(conversation_id, 1);
    let fetcher = ScriptedFetcher::serving(vec![polled.clone()]);

    let poller = ThreadPoller::start(
        Arc::clone(&fetcher),
        conversation_id,
        UserId::new("buyer-1").expect("valid user id"),
        Duration::from_millis(10),
    );
    settle().await;
    poller.push(pushed.clone());
    // The next poll returns the pushed message too; it must not duplicate.
    fetcher.swap(Ok(vec![pushed.clone(), polled.clone()]));
    settle().await;

    let snapshot = poller.messages();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].id(), pushed.id());
    assert_eq!(snapshot[1].id(), polled.id());
    poller.stop();
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_ticks_keep_the_last_good_snapshot() {
    let conversation_id = ConversationId::new();
    let fetcher = ScriptedFetcher::serving(vec![message_for(conversation_id, 1)]);

    let poller = ThreadPoller::start(
        Arc::clone(&fetcher),
        conversation_id,
        UserId::new("buyer-1").expect("valid user id"),
        Duration::from_millis(10),
    );
    settle().await;
    fetcher.swap(Err(FetchError("thread endpoint unreachable".into())));
    settle().await;

    assert_eq!(poller.messages().len(), 1);
    poller.stop();
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stop_halts_polling() {
    let conversation_id = ConversationId::new();
    let fetcher = ScriptedFetcher::serving(Vec::new());

    let poller = ThreadPoller::start(
        Arc::clone(&fetcher),
        conversation_id,
        UserId::new("buyer-1").expect("valid user id"),
        Duration::from_millis(10),
    );
    poller.stop();
    settle().await;

    fetcher.swap(Ok(vec![message_for(conversation_id, 1)]));
    settle().await;
    assert!(poller.messages().is_empty());
}
