//! Maps service-layer failures onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::directory::ports::DirectoryError;
use crate::directory::services::ResolveError;
use crate::messaging::domain::{
    ConversationError, MessageError, ParseConversationStatusError, ParseIdError,
};
use crate::messaging::services::{ConversationServiceError, MessagingServiceError};

/// JSON body returned for every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// An HTTP-mapped error carrying the status and a client-safe message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Builds an error with an explicit status code.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// 400 Bad Request.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 401 Unauthorized.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// 403 Forbidden.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// 404 Not Found.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// 500 Internal Server Error with a generic message.
    ///
    /// Internal detail is logged at the call site, never echoed to clients.
    #[must_use]
    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
    }

    /// The mapped status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// The client-safe message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ConversationServiceError> for ApiError {
    fn from(err: ConversationServiceError) -> Self {
        match err {
            ConversationServiceError::Resolve(resolve) => resolve.into(),
            ConversationServiceError::Domain(ConversationError::SelfConversation(user)) => {
                Self::bad_request(format!("user {user} cannot converse with themselves"))
            }
            ConversationServiceError::NotFound(id) => {
                Self::not_found(format!("conversation {id} not found"))
            }
            ConversationServiceError::Forbidden { .. } => {
                tracing::warn!(error = %err, "access denied");
                Self::forbidden("not a participant in this conversation")
            }
            ConversationServiceError::AdminRequired(_) => {
                tracing::warn!(error = %err, "access denied");
                Self::forbidden("administrator access required")
            }
            ConversationServiceError::Repository(err) => {
                tracing::error!(error = %err, "repository failure");
                Self::internal()
            }
            ConversationServiceError::Directory(err) => {
                tracing::error!(error = %err, "directory failure");
                Self::internal()
            }
        }
    }
}

impl From<MessagingServiceError> for ApiError {
    fn from(err: MessagingServiceError) -> Self {
        match err {
            MessagingServiceError::NotFound(id) => {
                Self::not_found(format!("conversation {id} not found"))
            }
            MessagingServiceError::Forbidden { .. } => {
                tracing::warn!(error = %err, "access denied");
                Self::forbidden("not a participant in this conversation")
            }
            MessagingServiceError::UnknownSender(user) => {
                Self::forbidden(format!("no profile found for sender {user}"))
            }
            MessagingServiceError::Validation(MessageError::EmptyBody) => {
                Self::bad_request("message body must not be empty")
            }
            MessagingServiceError::Repository(err) => {
                tracing::error!(error = %err, "repository failure");
                Self::internal()
            }
            MessagingServiceError::Directory(err) => {
                tracing::error!(error = %err, "directory failure");
                Self::internal()
            }
        }
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::PropertyNotFound(id) => {
                Self::not_found(format!("property {id} not found"))
            }
            ResolveError::MissingOwner(id) => {
                Self::bad_request(format!("property {id} has no resolvable owner"))
            }
            ResolveError::Directory(err) => err.into(),
        }
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        tracing::error!(error = %err, "directory failure");
        Self::internal()
    }
}

impl From<ParseIdError> for ApiError {
    fn from(err: ParseIdError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<ParseConversationStatusError> for ApiError {
    fn from(err: ParseConversationStatusError) -> Self {
        Self::bad_request(err.to_string())
    }
}
