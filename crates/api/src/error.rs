//! API error handling
//!
//! Webhook rejections are short plain-text bodies, matching what GitHub shows
//! in its delivery log.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// Reasons a webhook delivery is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookError {
    MethodNotAllowed,
    UnreadableBody,
    InvalidSignature,
    InvalidJson,
}

impl WebhookError {
    pub fn status(self) -> StatusCode {
        match self {
            WebhookError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            WebhookError::UnreadableBody | WebhookError::InvalidJson => StatusCode::BAD_REQUEST,
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            WebhookError::MethodNotAllowed => "Method not allowed",
            WebhookError::UnreadableBody => "Error reading request body",
            WebhookError::InvalidSignature => "Invalid signature",
            WebhookError::InvalidJson => "Error parsing JSON",
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        match self {
            WebhookError::MethodNotAllowed => {
                (self.status(), [(header::ALLOW, "POST")], self.message()).into_response()
            }
            _ => (self.status(), self.message()).into_response(),
        }
    }
}
