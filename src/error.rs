//! Error taxonomy shared by the blog operations and the web layer.
//!
//! Every operation normalizes transport and decode failures into one of
//! these kinds before they reach a handler; nothing is retried and nothing
//! is swallowed.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// A post preventing a label from being deleted.
#[derive(Debug, Clone, Serialize)]
pub struct BlockingPost {
    pub number: u64,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum Error {
    /// Required credentials are missing or empty. Fatal, no retry possible.
    #[error("{0}")]
    Configuration(String),

    /// Input failed a shape, length, or reserved-name check. No remote call
    /// was made.
    #[error("{0}")]
    Validation(String),

    /// The action needs an authenticated identity.
    #[error("{0}")]
    AuthRequired(String),

    /// The referenced post or label does not exist upstream.
    #[error("{0}")]
    NotFound(String),

    /// A label deletion blocked by posts still carrying the label.
    #[error("{message}")]
    Conflict {
        message: String,
        posts: Vec<BlockingPost>,
    },

    /// The remote token lacks a required scope.
    #[error("{0}")]
    Permission(String),

    /// Any other non-2xx response or transport failure from the tracker.
    /// The upstream message is passed through for diagnostics.
    #[error("remote operation failed: {message}")]
    Remote {
        status: Option<u16>,
        message: String,
    },
}

impl Error {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Validation(_) | Error::Conflict { .. } => StatusCode::BAD_REQUEST,
            Error::AuthRequired(_) => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Permission(_) => StatusCode::FORBIDDEN,
            Error::Remote { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut body = serde_json::json!({ "error": self.to_string() });
        if let Error::Conflict { posts, .. } = &self {
            body["posts"] = serde_json::to_value(posts).unwrap_or_default();
        }
        (status, Json(body)).into_response()
    }
}
