//! WebSocket channel for room subscriptions.
//!
//! The connection is a thin veneer over the room registry: clients
//! authenticate, then join and leave conversation rooms, and receive
//! `new-message` frames pushed after each durable append. Delivery is
//! at-most-once; clients reconcile gaps through the polling endpoint.

use std::collections::HashMap;

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::api::auth;
use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::directory::ports::{PropertyDirectory, SessionDirectory, UserDirectory};
use crate::messaging::domain::{ConversationId, Message, UserId};
use crate::messaging::ports::{ConversationRepository, MessageBroadcast, MessageRepository};

/// Optional query parameters on the upgrade request.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Bearer token; connections without one must authenticate in-band.
    token: Option<String>,
}

/// Frames accepted from the client.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum ClientFrame {
    Authenticate {
        token: String,
    },
    JoinConversation {
        #[serde(rename = "conversationId")]
        conversation_id: Uuid,
    },
    LeaveConversation {
        #[serde(rename = "conversationId")]
        conversation_id: Uuid,
    },
}

/// Frames pushed to the client.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum ServerFrame {
    Authenticated {
        #[serde(rename = "userId")]
        user_id: UserId,
    },
    Joined {
        #[serde(rename = "conversationId")]
        conversation_id: ConversationId,
    },
    Left {
        #[serde(rename = "conversationId")]
        conversation_id: ConversationId,
    },
    NewMessage {
        message: Message,
    },
    Error {
        message: String,
    },
}

/// Connection lifecycle: credentials first, subscriptions after.
enum Phase {
    Unauthenticated,
    Authenticated(UserId),
}

/// Upgrades the request to a WebSocket connection.
///
/// A token passed as a query parameter is resolved before the upgrade;
/// otherwise the first in-band frame must be `authenticate`.
///
/// # Errors
///
/// Returns 401 when the query token is present but invalid.
pub async fn upgrade<C, M, P, U, S, B, K>(
    State(state): State<AppState<C, M, P, U, S, B, K>>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError>
where
    C: ConversationRepository + 'static,
    M: MessageRepository + 'static,
    P: PropertyDirectory + 'static,
    U: UserDirectory + 'static,
    S: SessionDirectory + 'static,
    B: MessageBroadcast + 'static,
    K: Clock + Send + Sync + 'static,
{
    let identity = match query.token {
        Some(token) => Some(auth::resolve(&*state.sessions, &token).await?),
        None => None,
    };
    Ok(ws.on_upgrade(move |socket| drive(socket, state, identity)))
}

/// One live connection's subscription state.
struct Session<C, M, P, U, S, B, K>
where
    C: ConversationRepository + 'static,
    M: MessageRepository + 'static,
    P: PropertyDirectory + 'static,
    U: UserDirectory + 'static,
    S: SessionDirectory + 'static,
    B: MessageBroadcast + 'static,
    K: Clock + Send + Sync + 'static,
{
    state: AppState<C, M, P, U, S, B, K>,
    phase: Phase,
    forward_tx: mpsc::UnboundedSender<Message>,
    joined: HashMap<ConversationId, JoinHandle<()>>,
}

impl<C, M, P, U, S, B, K> Session<C, M, P, U, S, B, K>
where
    C: ConversationRepository + 'static,
    M: MessageRepository + 'static,
    P: PropertyDirectory + 'static,
    U: UserDirectory + 'static,
    S: SessionDirectory + 'static,
    B: MessageBroadcast + 'static,
    K: Clock + Send + Sync + 'static,
{
    async fn handle(&mut self, frame: ClientFrame) -> ServerFrame {
        match frame {
            ClientFrame::Authenticate { token } => self.authenticate(&token).await,
            ClientFrame::JoinConversation { conversation_id } => {
                self.join(ConversationId::from_uuid(conversation_id)).await
            }
            ClientFrame::LeaveConversation { conversation_id } => {
                self.leave(ConversationId::from_uuid(conversation_id))
            }
        }
    }

    async fn authenticate(&mut self, token: &str) -> ServerFrame {
        match auth::resolve(&*self.state.sessions, token).await {
            Ok(user) => {
                let frame = ServerFrame::Authenticated {
                    user_id: user.clone(),
                };
                self.phase = Phase::Authenticated(user);
                frame
            }
            Err(err) => ServerFrame::Error {
                message: err.message().to_owned(),
            },
        }
    }

    /// Joins a room after re-validating participancy.
    ///
    /// Membership may have changed since any earlier check, so the join is
    /// authorized against current state, not connection history.
    async fn join(&mut self, conversation_id: ConversationId) -> ServerFrame {
        let Phase::Authenticated(user) = &self.phase else {
            return ServerFrame::Error {
                message: "authenticate before joining a conversation".to_owned(),
            };
        };

        if self.joined.contains_key(&conversation_id) {
            return ServerFrame::Joined { conversation_id };
        }

        if let Err(err) = self.state.conversations.authorize(user, conversation_id).await {
            let mapped = ApiError::from(err);
            return ServerFrame::Error {
                message: mapped.message().to_owned(),
            };
        }

        let mut subscription = self.state.rooms.join(conversation_id);
        let tx = self.forward_tx.clone();
        let handle = tokio::spawn(async move {
            while let Some(message) = subscription.recv().await {
                if tx.send(message).is_err() {
                    break;
                }
            }
        });
        self.joined.insert(conversation_id, handle);
        debug!(%conversation_id, "room joined");
        ServerFrame::Joined { conversation_id }
    }

    /// Leaves a room. Leaving a room never joined is a no-op.
    fn leave(&mut self, conversation_id: ConversationId) -> ServerFrame {
        if let Some(handle) = self.joined.remove(&conversation_id) {
            handle.abort();
            self.state.rooms.prune(conversation_id);
            debug!(%conversation_id, "room left");
        }
        ServerFrame::Left { conversation_id }
    }

    fn teardown(self) {
        for (conversation_id, handle) in self.joined {
            handle.abort();
            self.state.rooms.prune(conversation_id);
        }
    }
}

async fn drive<C, M, P, U, S, B, K>(
    socket: WebSocket,
    state: AppState<C, M, P, U, S, B, K>,
    identity: Option<UserId>,
) where
    C: ConversationRepository + 'static,
    M: MessageRepository + 'static,
    P: PropertyDirectory + 'static,
    U: UserDirectory + 'static,
    S: SessionDirectory + 'static,
    B: MessageBroadcast + 'static,
    K: Clock + Send + Sync + 'static,
{
    let (mut sink, mut stream) = socket.split();
    let (forward_tx, mut forward_rx) = mpsc::unbounded_channel();
    let mut session = Session {
        state,
        phase: identity.map_or(Phase::Unauthenticated, Phase::Authenticated),
        forward_tx,
        joined: HashMap::new(),
    };

    if let Phase::Authenticated(user) = &session.phase {
        let frame = ServerFrame::Authenticated {
            user_id: user.clone(),
        };
        if send_frame(&mut sink, &frame).await.is_err() {
            session.teardown();
            return;
        }
    }

    loop {
        tokio::select! {
            incoming = next_frame(&mut stream) => {
                match incoming {
                    Incoming::Frame(frame) => {
                        let reply = session.handle(frame).await;
                        if send_frame(&mut sink, &reply).await.is_err() {
                            break;
                        }
                    }
                    Incoming::Malformed(description) => {
                        let reply = ServerFrame::Error {
                            message: description,
                        };
                        if send_frame(&mut sink, &reply).await.is_err() {
                            break;
                        }
                    }
                    Incoming::Ignored => {}
                    Incoming::Closed => break,
                }
            }
            Some(message) = forward_rx.recv() => {
                let frame = ServerFrame::NewMessage { message };
                if send_frame(&mut sink, &frame).await.is_err() {
                    break;
                }
            }
        }
    }

    session.teardown();
}

/// One step of the inbound half of the connection.
enum Incoming {
    Frame(ClientFrame),
    Malformed(String),
    Ignored,
    Closed,
}

async fn next_frame(stream: &mut SplitStream<WebSocket>) -> Incoming {
    match stream.next().await {
        Some(Ok(WsMessage::Text(text))) => {
            match serde_json::from_str::<ClientFrame>(text.as_str()) {
                Ok(frame) => Incoming::Frame(frame),
                Err(err) => Incoming::Malformed(format!("unrecognized frame: {err}")),
            }
        }
        // Ping/pong is handled by the transport layer.
        Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Binary(_))) => {
            Incoming::Ignored
        }
        Some(Ok(WsMessage::Close(_))) | Some(Err(_)) | None => Incoming::Closed,
    }
}

async fn send_frame(
    sink: &mut SplitSink<WebSocket, WsMessage>,
    frame: &ServerFrame,
) -> Result<(), ()> {
    let Ok(text) = serde_json::to_string(frame) else {
        warn!("failed to serialize outbound frame");
        return Ok(());
    };
    sink.send(WsMessage::Text(text.into())).await.map_err(|err| {
        debug!(error = %err, "socket closed while sending");
    })
}
