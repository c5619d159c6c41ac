//! Client error types and HTTP failure classification

use serde::Deserialize;
use steward_core::StoreError;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors raised while building a client
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP client could not be built
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Map a non-success response to the store failure taxonomy
///
/// 404 is not-found, 409 and 412 are conflicts, 401/403 are forbidden,
/// 408, 429 and 5xx are transient, and any other status is a malformed
/// request.
pub fn from_status(status: u16, body: &str) -> StoreError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                body.trim().to_string()
            }
        });

    match status {
        404 => StoreError::NotFound(message),
        409 | 412 => StoreError::Conflict(message),
        401 | 403 => StoreError::Forbidden(message),
        408 | 429 | 500..=599 => StoreError::Server { status, message },
        _ => StoreError::InvalidRequest(message),
    }
}

/// Map a transport-level failure to the store failure taxonomy
pub fn from_transport(err: reqwest::Error) -> StoreError {
    if err.is_decode() {
        StoreError::Decode(err.to_string())
    } else if err.is_builder() {
        StoreError::InvalidRequest(err.to_string())
    } else {
        StoreError::Transport(err.to_string())
    }
}
