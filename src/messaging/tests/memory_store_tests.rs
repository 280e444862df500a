//! Behavioural tests for the in-memory store adapters.

use std::sync::Arc;

use chrono::Utc;
use mockable::DefaultClock;
use rstest::{fixture, rstest};

use crate::messaging::adapters::memory::{InMemoryConversationStore, InMemoryMessageStore};
use crate::messaging::domain::{
    Conversation, ConversationId, ConversationParams, Message, MessageBody, NewMessageParams,
    PropertyId, SenderRole, SequenceNumber, UserId,
};
use crate::messaging::error::RepositoryError;
use crate::messaging::ports::conversations::ConversationRepository;
use crate::messaging::ports::messages::{MessageRepository, Page};

fn user(id: &str) -> UserId {
    UserId::new(id).expect("valid user id")
}

fn candidate(property: &str, buyer: &str, seller: &str) -> Conversation {
    Conversation::new(
        ConversationParams::new(
            PropertyId::new(property).expect("valid property id"),
            user(buyer),
            user(seller),
        ),
        &DefaultClock,
    )
    .expect("valid conversation")
}

fn text_message(conversation_id: ConversationId, sender: &str, sequence: u64) -> Message {
    Message::new(
        NewMessageParams {
            conversation_id,
            sequence_number: SequenceNumber::new(sequence),
            sender: user(sender),
            sender_name: sender.to_owned(),
            sender_role: SenderRole::Buyer,
            body: MessageBody::text(format!("message {sequence}")),
        },
        &DefaultClock,
    )
    .expect("valid message")
}

#[fixture]
fn conversations() -> InMemoryConversationStore {
    InMemoryConversationStore::new()
}

#[fixture]
fn messages() -> InMemoryMessageStore {
    InMemoryMessageStore::new()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn second_create_for_the_same_triple_returns_the_first(
    conversations: InMemoryConversationStore,
) {
    let first = conversations
        .create_if_absent(candidate("prop-1", "buyer-1", "seller-1"))
        .await
        .expect("first create should succeed");
    assert!(first.was_created());
    let first = first.into_conversation();

    let second = conversations
        .create_if_absent(candidate("prop-1", "buyer-1", "seller-1"))
        .await
        .expect("second create should succeed");
    assert!(!second.was_created());
    assert_eq!(second.into_conversation().id(), first.id());
    assert_eq!(conversations.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn distinct_triples_create_distinct_threads(conversations: InMemoryConversationStore) {
    for conversation in [
        candidate("prop-1", "buyer-1", "seller-1"),
        candidate("prop-2", "buyer-1", "seller-1"),
        candidate("prop-1", "buyer-2", "seller-1"),
    ] {
        let outcome = conversations
            .create_if_absent(conversation)
            .await
            .expect("create should succeed");
        assert!(outcome.was_created());
    }
    assert_eq!(conversations.len(), 3);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_creates_converge_on_one_conversation(
    conversations: InMemoryConversationStore,
) {
    let store = Arc::new(conversations);
    let mut handles = Vec::new();
    for _ in 0..16 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .create_if_absent(candidate("prop-1", "buyer-1", "seller-1"))
                .await
                .expect("create should succeed")
        }));
    }

    let mut created = 0;
    let mut ids = Vec::new();
    for handle in handles {
        let outcome = handle.await.expect("task should complete");
        if outcome.was_created() {
            created += 1;
        }
        ids.push(outcome.into_conversation().id());
    }

    assert_eq!(created, 1);
    assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(store.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_of_unknown_conversation_is_refused(conversations: InMemoryConversationStore) {
    let stray = candidate("prop-9", "buyer-9", "seller-9");
    let result = conversations.update(&stray).await;
    assert!(matches!(
        result,
        Err(RepositoryError::ConversationNotFound(id)) if id == stray.id()
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn find_by_participant_sees_enrolled_admins(conversations: InMemoryConversationStore) {
    let mut conversation = candidate("prop-1", "buyer-1", "seller-1");
    conversation.enrol(user("admin-1"));
    conversations
        .create_if_absent(conversation)
        .await
        .expect("create should succeed");

    let for_admin = conversations
        .find_by_participant(&user("admin-1"))
        .await
        .expect("lookup should succeed");
    assert_eq!(for_admin.len(), 1);

    let for_stranger = conversations
        .find_by_participant(&user("stranger"))
        .await
        .expect("lookup should succeed");
    assert!(for_stranger.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_sequence_numbers_are_refused(messages: InMemoryMessageStore) {
    let conversation_id = ConversationId::new();
    messages
        .append(&text_message(conversation_id, "buyer-1", 1))
        .await
        .expect("first append should succeed");

    let rival = text_message(conversation_id, "seller-1", 1);
    let result = messages.append(&rival).await;
    assert!(matches!(
        result,
        Err(RepositoryError::DuplicateSequence { sequence, .. })
            if sequence == SequenceNumber::new(1)
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_message_ids_are_refused(messages: InMemoryMessageStore) {
    let conversation_id = ConversationId::new();
    let message = text_message(conversation_id, "buyer-1", 1);
    messages
        .append(&message)
        .await
        .expect("first append should succeed");

    let result = messages.append(&message).await;
    assert!(matches!(result, Err(RepositoryError::DuplicateMessage(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pages_count_backwards_from_the_newest_message(messages: InMemoryMessageStore) {
    let conversation_id = ConversationId::new();
    for sequence in 1..=5 {
        messages
            .append(&text_message(conversation_id, "buyer-1", sequence))
            .await
            .expect("append should succeed");
    }

    let first_page = messages
        .page_newest_first(conversation_id, Page::new(1, 2))
        .await
        .expect("page should succeed");
    let sequences: Vec<u64> = first_page
        .iter()
        .map(|m| m.sequence_number().value())
        .collect();
    assert_eq!(sequences, vec![5, 4]);

    let last_page = messages
        .page_newest_first(conversation_id, Page::new(3, 2))
        .await
        .expect("page should succeed");
    assert_eq!(last_page.len(), 1);
    assert_eq!(last_page[0].sequence_number().value(), 1);

    let past_the_end = messages
        .page_newest_first(conversation_id, Page::new(4, 2))
        .await
        .expect("page should succeed");
    assert!(past_the_end.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sequence_numbers_start_at_one_and_follow_the_tail(messages: InMemoryMessageStore) {
    let conversation_id = ConversationId::new();
    assert_eq!(
        messages
            .next_sequence_number(conversation_id)
            .await
            .expect("next should succeed"),
        SequenceNumber::new(1)
    );

    messages
        .append(&text_message(conversation_id, "buyer-1", 1))
        .await
        .expect("append should succeed");
    assert_eq!(
        messages
            .next_sequence_number(conversation_id)
            .await
            .expect("next should succeed"),
        SequenceNumber::new(2)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn mark_read_adds_each_receipt_at_most_once(messages: InMemoryMessageStore) {
    let conversation_id = ConversationId::new();
    let reader = user("seller-1");
    let stored: Vec<_> = {
        let mut out = Vec::new();
        for sequence in 1..=3 {
            let message = text_message(conversation_id, "buyer-1", sequence);
            messages
                .append(&message)
                .await
                .expect("append should succeed");
            out.push(message.id());
        }
        out
    };

    let now = Utc::now();
    let added = messages
        .mark_read(conversation_id, &reader, &stored, now)
        .await
        .expect("mark should succeed");
    assert_eq!(added, 3);

    let repeat = messages
        .mark_read(conversation_id, &reader, &stored, Utc::now())
        .await
        .expect("repeat mark should succeed");
    assert_eq!(repeat, 0);

    let page = messages
        .page_newest_first(conversation_id, Page::default())
        .await
        .expect("page should succeed");
    assert!(page.iter().all(|m| m.read_receipt(&reader) == Some(now)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unread_counts_exclude_own_and_read_messages(messages: InMemoryMessageStore) {
    let conversation_id = ConversationId::new();
    let buyer = user("buyer-1");
    let seller_message = text_message(conversation_id, "seller-1", 1);
    messages
        .append(&seller_message)
        .await
        .expect("append should succeed");
    messages
        .append(&text_message(conversation_id, "buyer-1", 2))
        .await
        .expect("append should succeed");
    messages
        .append(&text_message(conversation_id, "seller-1", 3))
        .await
        .expect("append should succeed");

    assert_eq!(
        messages
            .count_unread(conversation_id, &buyer)
            .await
            .expect("count should succeed"),
        2
    );

    messages
        .mark_read(conversation_id, &buyer, &[seller_message.id()], Utc::now())
        .await
        .expect("mark should succeed");
    assert_eq!(
        messages
            .count_unread(conversation_id, &buyer)
            .await
            .expect("count should succeed"),
        1
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn latest_returns_the_highest_sequence(messages: InMemoryMessageStore) {
    let conversation_id = ConversationId::new();
    assert!(
        messages
            .latest(conversation_id)
            .await
            .expect("latest should succeed")
            .is_none()
    );

    // Appended out of order; the store keeps the log sorted by sequence.
    messages
        .append(&text_message(conversation_id, "buyer-1", 2))
        .await
        .expect("append should succeed");
    messages
        .append(&text_message(conversation_id, "buyer-1", 1))
        .await
        .expect("append should succeed");

    let latest = messages
        .latest(conversation_id)
        .await
        .expect("latest should succeed")
        .expect("log is non-empty");
    assert_eq!(latest.sequence_number(), SequenceNumber::new(2));
}
