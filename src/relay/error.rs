use axum::http::StatusCode;
use axum::response::{ IntoResponse, Response };
use axum::Json;
use thiserror::Error;

use crate::llm::LlmError;
use crate::models::relay::ErrorBody;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Request body is missing")]
    MissingBody,
    #[error("Invalid JSON body")]
    InvalidJson(#[source] serde_json::Error),
    #[error("Message cannot be empty")]
    EmptyMessage,
    #[error("chatHistory must be an array of {{ sender, text }} entries")]
    InvalidHistory,
    #[error("Gemini API key not configured")]
    MissingCredential,
    #[error("Method Not Allowed")]
    MethodNotAllowed,
    #[error("Upstream request timed out")]
    UpstreamTimeout,
    #[error("{0}")]
    Upstream(#[source] LlmError),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MissingBody
            | RelayError::InvalidJson(_)
            | RelayError::EmptyMessage
            | RelayError::InvalidHistory => StatusCode::BAD_REQUEST,
            RelayError::MissingCredential => StatusCode::UNAUTHORIZED,
            RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            RelayError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<LlmError> for RelayError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::MissingApiKey => RelayError::MissingCredential,
            LlmError::Timeout => RelayError::UpstreamTimeout,
            other => RelayError::Upstream(other),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody { error: self.to_string() });
        (self.status(), body).into_response()
    }
}
