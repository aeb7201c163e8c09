//! Typed errors for the HTTP, storage and recommend boundaries.

use thiserror::Error;

/// No HTTP response was obtained at all (DNS, connect, timeout, unreadable body)
#[derive(Debug, Clone, Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

/// Durable storage could not be read or written
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("could not encode storage contents: {0}")]
    Encode(String),
}

/// A recommend call that could not produce recommendations.
///
/// `Display` is the human-readable message shown in the inline error area.
#[derive(Debug, Clone, Error)]
pub enum RequestError {
    /// Server answered with a non-success status
    #[error("{message}")]
    Status { status: u16, message: String },

    /// Success status, but the body is not a recommendation list
    #[error("Unexpected response from server: {0}")]
    Decode(String),

    #[error("Could not reach the server: {0}")]
    Transport(String),
}

impl RequestError {
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<TransportError> for RequestError {
    fn from(e: TransportError) -> Self {
        RequestError::Transport(e.0)
    }
}

/// Pull a readable message out of an error response body.
///
/// Looks at the JSON fields `detail`, `message` and `error` in that order, then falls
/// back to the raw body text, then to a status-based message.
pub fn extract_error_message(status: u16, body: &str) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "message", "error"] {
            match map.get(key) {
                Some(serde_json::Value::String(s)) if !s.trim().is_empty() => {
                    return s.trim().to_string();
                }
                // FastAPI validation errors put a list under `detail`
                Some(value) if !value.is_null() && !value.is_string() => {
                    return value.to_string();
                }
                _ => {}
            }
        }
    }

    let text = body.trim();
    if !text.is_empty() {
        return text.to_string();
    }

    format!("Request failed with status {status}")
}
