//! Protocol error definitions.

use std::time::Duration;
use thiserror::Error;

use crate::protocol::request::RequestKind;

/// Errors decoding an inbound request. All of them are answered with a
/// `type: "error"` response and leave stored state untouched.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid JSON format: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Invalid request type: {0:?}")]
    InvalidType(String),

    #[error("Missing field '{field}' for '{kind}' request")]
    MissingField {
        kind: RequestKind,
        field: &'static str,
    },

    #[error("Invalid item for '{kind}' request: {source}")]
    InvalidItem {
        kind: RequestKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("Empty request")]
    Empty,

    #[error("Request too large (limit {limit} bytes)")]
    TooLarge { limit: usize },

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Connection error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// Message reported to the client.
    pub fn client_message(&self) -> String {
        match self {
            Self::InvalidJson(_) => "Invalid JSON format".to_string(),
            Self::InvalidType(_) => "Invalid request type".to_string(),
            other => other.to_string(),
        }
    }
}
