//! Client error types.

use std::collections::BTreeMap;

use thiserror::Error;

/// Errors surfaced to client callers.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with an error body.
    #[error("{code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// The form failed local validation; keyed by field path.
    #[error("Invalid form: {0:?}")]
    InvalidForm(BTreeMap<String, String>),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Invalid payload: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// Whether the server rejected the call for lack of a session.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401, .. })
    }
}

/// Result type alias for client calls.
pub type ClientResult<T> = Result<T, ClientError>;
