//! HTTP route table and handlers.

#![expect(
    clippy::needless_pass_by_value,
    reason = "axum handlers receive extractors by value"
)]

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use mockable::Clock;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::auth::authenticate;
use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::api::ws;
use crate::directory::ports::{PropertyDirectory, SessionDirectory, UserDirectory};
use crate::messaging::domain::{
    Conversation, ConversationId, ConversationStatus, Message, MessageBody, PropertyId,
};
use crate::messaging::ports::{ConversationRepository, MessageBroadcast, MessageRepository, Page};
use crate::messaging::services::ConversationSummary;

/// Query parameters for the find-or-create entry point.
#[derive(Debug, Deserialize)]
struct FindOrCreateQuery {
    #[serde(rename = "propertyId")]
    property_id: String,
}

/// JSON body for explicit conversation creation.
#[derive(Debug, Deserialize)]
struct CreateConversationRequest {
    #[serde(rename = "propertyId")]
    property_id: String,
}

/// Query parameters for message pagination.
#[derive(Debug, Default, Deserialize)]
struct PageQuery {
    page: Option<u32>,
    #[serde(rename = "pageSize")]
    page_size: Option<u32>,
}

impl PageQuery {
    fn window(&self) -> Page {
        match (self.page, self.page_size) {
            (None, None) => Page::default(),
            (page, size) => Page::new(
                page.unwrap_or(1),
                size.unwrap_or_else(|| Page::default().size()),
            ),
        }
    }
}

/// JSON body for sending a message. Text and image are mutually exclusive.
#[derive(Debug, Deserialize)]
struct SendMessageRequest {
    text: Option<String>,
    #[serde(rename = "imageUrl")]
    image_url: Option<String>,
}

impl SendMessageRequest {
    fn into_body(self) -> Result<MessageBody, ApiError> {
        match (self.text, self.image_url) {
            (Some(_), Some(_)) => Err(ApiError::bad_request(
                "message must carry either text or an image, not both",
            )),
            (Some(text), None) => Ok(MessageBody::text(text)),
            (None, Some(url)) => Ok(MessageBody::image(url)),
            (None, None) => Err(ApiError::bad_request("message body must not be empty")),
        }
    }
}

/// JSON body for the administrative status update.
#[derive(Debug, Deserialize)]
struct UpdateStatusRequest {
    status: String,
}

/// Builds the full route table over the given state.
pub fn router<C, M, P, U, S, B, K>(state: AppState<C, M, P, U, S, B, K>) -> Router
where
    C: ConversationRepository + 'static,
    M: MessageRepository + 'static,
    P: PropertyDirectory + 'static,
    U: UserDirectory + 'static,
    S: SessionDirectory + 'static,
    B: MessageBroadcast + 'static,
    K: Clock + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/conversations/find-or-create",
            post(find_or_create::<C, M, P, U, S, B, K>),
        )
        .route("/conversations", post(create_conversation::<C, M, P, U, S, B, K>))
        .route("/conversations/my", get(list_my_conversations::<C, M, P, U, S, B, K>))
        .route(
            "/conversations/{id}/messages",
            get(list_messages::<C, M, P, U, S, B, K>)
                .post(send_message::<C, M, P, U, S, B, K>),
        )
        .route("/admin/conversations", get(list_all_conversations::<C, M, P, U, S, B, K>))
        .route(
            "/admin/conversations/{id}/messages",
            post(send_admin_message::<C, M, P, U, S, B, K>),
        )
        .route(
            "/admin/conversations/{id}/status",
            put(update_status::<C, M, P, U, S, B, K>),
        )
        .route("/ws", get(ws::upgrade::<C, M, P, U, S, B, K>))
        .with_state(state)
}

async fn find_or_create<C, M, P, U, S, B, K>(
    State(state): State<AppState<C, M, P, U, S, B, K>>,
    headers: HeaderMap,
    Query(query): Query<FindOrCreateQuery>,
) -> Result<Json<Conversation>, ApiError>
where
    C: ConversationRepository + 'static,
    M: MessageRepository + 'static,
    P: PropertyDirectory + 'static,
    U: UserDirectory + 'static,
    S: SessionDirectory + 'static,
    B: MessageBroadcast + 'static,
    K: Clock + Send + Sync + 'static,
{
    let buyer = authenticate(&*state.sessions, &headers).await?;
    let property_id = PropertyId::new(query.property_id)?;
    let conversation = state.conversations.find_or_create(buyer, property_id).await?;
    Ok(Json(conversation))
}

async fn create_conversation<C, M, P, U, S, B, K>(
    State(state): State<AppState<C, M, P, U, S, B, K>>,
    headers: HeaderMap,
    Json(request): Json<CreateConversationRequest>,
) -> Result<Json<Conversation>, ApiError>
where
    C: ConversationRepository + 'static,
    M: MessageRepository + 'static,
    P: PropertyDirectory + 'static,
    U: UserDirectory + 'static,
    S: SessionDirectory + 'static,
    B: MessageBroadcast + 'static,
    K: Clock + Send + Sync + 'static,
{
    let buyer = authenticate(&*state.sessions, &headers).await?;
    let property_id = PropertyId::new(request.property_id)?;
    let conversation = state.conversations.find_or_create(buyer, property_id).await?;
    Ok(Json(conversation))
}

async fn list_my_conversations<C, M, P, U, S, B, K>(
    State(state): State<AppState<C, M, P, U, S, B, K>>,
    headers: HeaderMap,
) -> Result<Json<Vec<ConversationSummary>>, ApiError>
where
    C: ConversationRepository + 'static,
    M: MessageRepository + 'static,
    P: PropertyDirectory + 'static,
    U: UserDirectory + 'static,
    S: SessionDirectory + 'static,
    B: MessageBroadcast + 'static,
    K: Clock + Send + Sync + 'static,
{
    let user = authenticate(&*state.sessions, &headers).await?;
    let summaries = state.conversations.list_for_user(&user).await?;
    Ok(Json(summaries))
}

async fn list_messages<C, M, P, U, S, B, K>(
    State(state): State<AppState<C, M, P, U, S, B, K>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Message>>, ApiError>
where
    C: ConversationRepository + 'static,
    M: MessageRepository + 'static,
    P: PropertyDirectory + 'static,
    U: UserDirectory + 'static,
    S: SessionDirectory + 'static,
    B: MessageBroadcast + 'static,
    K: Clock + Send + Sync + 'static,
{
    let viewer = authenticate(&*state.sessions, &headers).await?;
    let conversation_id = ConversationId::from_uuid(id);
    let messages = state
        .messaging
        .list_messages(&viewer, conversation_id, query.window())
        .await?;
    Ok(Json(messages))
}

async fn send_message<C, M, P, U, S, B, K>(
    State(state): State<AppState<C, M, P, U, S, B, K>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError>
where
    C: ConversationRepository + 'static,
    M: MessageRepository + 'static,
    P: PropertyDirectory + 'static,
    U: UserDirectory + 'static,
    S: SessionDirectory + 'static,
    B: MessageBroadcast + 'static,
    K: Clock + Send + Sync + 'static,
{
    let sender = authenticate(&*state.sessions, &headers).await?;
    let conversation_id = ConversationId::from_uuid(id);
    let body = request.into_body()?;
    let message = state
        .messaging
        .send_message(&sender, conversation_id, body)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

async fn send_admin_message<C, M, P, U, S, B, K>(
    State(state): State<AppState<C, M, P, U, S, B, K>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError>
where
    C: ConversationRepository + 'static,
    M: MessageRepository + 'static,
    P: PropertyDirectory + 'static,
    U: UserDirectory + 'static,
    S: SessionDirectory + 'static,
    B: MessageBroadcast + 'static,
    K: Clock + Send + Sync + 'static,
{
    let sender = authenticate(&*state.sessions, &headers).await?;
    state.conversations.require_admin(&sender).await?;
    let conversation_id = ConversationId::from_uuid(id);
    let body = request.into_body()?;
    let message = state
        .messaging
        .send_message(&sender, conversation_id, body)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

async fn list_all_conversations<C, M, P, U, S, B, K>(
    State(state): State<AppState<C, M, P, U, S, B, K>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Conversation>>, ApiError>
where
    C: ConversationRepository + 'static,
    M: MessageRepository + 'static,
    P: PropertyDirectory + 'static,
    U: UserDirectory + 'static,
    S: SessionDirectory + 'static,
    B: MessageBroadcast + 'static,
    K: Clock + Send + Sync + 'static,
{
    let actor = authenticate(&*state.sessions, &headers).await?;
    let conversations = state.conversations.list_all(&actor).await?;
    Ok(Json(conversations))
}

async fn update_status<C, M, P, U, S, B, K>(
    State(state): State<AppState<C, M, P, U, S, B, K>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Conversation>, ApiError>
where
    C: ConversationRepository + 'static,
    M: MessageRepository + 'static,
    P: PropertyDirectory + 'static,
    U: UserDirectory + 'static,
    S: SessionDirectory + 'static,
    B: MessageBroadcast + 'static,
    K: Clock + Send + Sync + 'static,
{
    let actor = authenticate(&*state.sessions, &headers).await?;
    let conversation_id = ConversationId::from_uuid(id);
    let status = ConversationStatus::try_from(request.status.as_str())?;
    let conversation = state
        .conversations
        .update_status(&actor, conversation_id, status)
        .await?;
    Ok(Json(conversation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, None, 1, 50)]
    #[case(Some(3), Some(20), 3, 20)]
    #[case(Some(0), Some(0), 1, 50)]
    #[case(Some(2), Some(500), 2, 200)]
    fn page_query_clamps_into_valid_window(
        #[case] page: Option<u32>,
        #[case] page_size: Option<u32>,
        #[case] expected_number: u32,
        #[case] expected_size: u32,
    ) {
        let query = PageQuery { page, page_size };
        let window = query.window();
        assert_eq!(window.number(), expected_number);
        assert_eq!(window.size(), expected_size);
    }

    #[rstest]
    fn send_request_rejects_both_payload_kinds() {
        let request = SendMessageRequest {
            text: Some("hello".into()),
            image_url: Some("https://cdn.example/a.jpg".into()),
        };
        assert!(request.into_body().is_err());
    }

    #[rstest]
    fn send_request_rejects_missing_payload() {
        let request = SendMessageRequest {
            text: None,
            image_url: None,
        };
        assert!(request.into_body().is_err());
    }

    #[rstest]
    #[expect(
        clippy::expect_used,
        reason = "Test code uses expect for assertion clarity"
    )]
    fn send_request_builds_text_body() {
        let request = SendMessageRequest {
            text: Some("is this still available?".into()),
            image_url: None,
        };
        let body = request.into_body().expect("text body");
        assert_eq!(body.preview(), "is this still available?");
    }
}
