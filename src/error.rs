//! Error types returned by every client operation

use thiserror::Error;

/// Classified failure of an API call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure: no response was received.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The session could not be authorized. The auth-failed listener
    /// has already been notified when this is returned.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The server answered with a non-success status.
    #[error("{message}")]
    Request { status: u16, message: String },

    /// A success response carried a body that could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Result alias for client operations.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// HTTP status attached to the failure, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            ApiError::Request { status, .. } => Some(*status),
            ApiError::Unauthorized(_) | ApiError::Decode(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    /// Build a request failure from a status code and the raw error body.
    pub(crate) fn from_status(status: u16, body: &[u8]) -> Self {
        let message = error_message(body)
            .unwrap_or_else(|| format!("request failed with status {}", status));
        ApiError::Request { status, message }
    }
}

/// Best-effort human-readable message from a JSON error body.
///
/// Looks at `message` first, then `error`. Returns `None` for empty,
/// non-JSON or message-less bodies.
pub(crate) fn error_message(body: &[u8]) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
}
