//! Interval-driven thread polling and reconciliation.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::messaging::domain::{ConversationId, Message, UserId};

/// Error returned by a fetch attempt.
///
/// The poller does not distinguish causes: any failed tick is logged and
/// retried on the next interval.
#[derive(Debug, Clone, Error)]
#[error("fetch failed: {0}")]
pub struct FetchError(pub String);

/// The idempotent thread read the poller repeats.
///
/// Implementations typically delegate to the messaging service's
/// `list_messages` (server side) or the corresponding HTTP call (browser
/// side); either way the read is idempotent, so repeating it is safe.
#[async_trait]
pub trait MessageFetcher: Send + Sync + 'static {
    /// Fetches the conversation's messages in ascending order.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the read fails; the poller retries on
    /// the next tick.
    async fn fetch(
        &self,
        conversation_id: ConversationId,
        viewer: &UserId,
    ) -> Result<Vec<Message>, FetchError>;
}

/// A fixed-interval poller for one viewed conversation.
///
/// Started when the client opens a thread view, stopped when it leaves;
/// there is no background polling for unviewed conversations. The local
/// message list is reconciled by id, so messages that already arrived over
/// the push channel are not duplicated.
#[derive(Debug)]
pub struct ThreadPoller {
    messages: Arc<Mutex<Vec<Message>>>,
    handle: JoinHandle<()>,
}

impl ThreadPoller {
    /// Starts polling the conversation on the given interval.
    pub fn start<F>(
        fetcher: Arc<F>,
        conversation_id: ConversationId,
        viewer: UserId,
        interval: Duration,
    ) -> Self
    where
        F: MessageFetcher,
    {
        let messages = Arc::new(Mutex::new(Vec::new()));
        let shared = Arc::clone(&messages);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match fetcher.fetch(conversation_id, &viewer).await {
                    Ok(fetched) => reconcile(&shared, fetched),
                    Err(err) => {
                        debug!(%conversation_id, error = %err, "poll tick failed");
                    }
                }
            }
        });

        Self { messages, handle }
    }

    /// Records a message delivered over the push channel.
    ///
    /// Reconciled by id like any polled batch, so a subsequent poll of the
    /// same message is a no-op.
    pub fn push(&self, message: Message) {
        reconcile(&self.messages, vec![message]);
    }

    /// Returns a snapshot of the reconciled message list, ascending.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stops polling. Idempotent; also invoked on drop.
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for ThreadPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Merges a fetched batch into the local list, skipping ids already
/// present and keeping ascending sequence order.
fn reconcile(local: &Arc<Mutex<Vec<Message>>>, fetched: Vec<Message>) {
    let mut guard = local.lock().unwrap_or_else(PoisonError::into_inner);
    let mut added = false;
    for message in fetched {
        if !guard.iter().any(|m| m.id() == message.id()) {
            guard.push(message);
            added = true;
        }
    }
    if added {
        guard.sort_by_key(Message::sequence_number);
    }
}
