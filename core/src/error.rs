//! Error types for the dispatcher.
//!
//! # Design
//! Every failed call lands in exactly one `DispatchError` variant, so callers
//! can branch on the failure mode rather than sniffing JSON. `to_value`
//! renders the `{success: false, error: {message}}` shape expected by handlers
//! that forward the outcome to their own clients. A missing base URL is not an
//! error: `Dispatcher::make` returns `None` for it.

use serde_json::{json, Value};

use crate::response::ApiResponse;

/// Message used when the remote API returns an empty body.
pub const EMPTY_RESPONSE_MESSAGE: &str = "Empty response";

/// Errors raised while reading startup settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown log category: {0}")]
    UnknownLogCategory(String),

    #[error("invalid API URL {url}: {reason}")]
    InvalidApiUrl { url: String, reason: String },
}

/// Errors raised by the transport before a response body is available.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connection failure, timeout, TLS failure, or an unreadable body.
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("invalid multipart part: {0}")]
    InvalidMultipart(#[source] reqwest::Error),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Request(e) if e.is_timeout())
    }
}

/// The ways a dispatched call can fail.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The body carried a known remote failure marker.
    #[error("{message}")]
    Sentinel { message: String },

    #[error("Empty response")]
    EmptyResponse,

    /// A JSON response body could not be parsed.
    #[error("invalid JSON response: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
        status: u16,
    },

    /// The parsed body declared an `error` itself.
    #[error("remote error: {}", remote_message(.0))]
    Remote(ApiResponse),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

fn remote_message(body: &ApiResponse) -> String {
    match body.get("error") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(obj)) => obj
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| Value::Object(obj.clone()).to_string()),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

impl DispatchError {
    /// Human-readable failure message.
    pub fn message(&self) -> String {
        match self {
            DispatchError::Remote(body) => remote_message(body),
            other => other.to_string(),
        }
    }

    /// The JSON failure shape. A remote-declared error is returned as the
    /// remote body itself.
    pub fn to_value(&self) -> Value {
        match self {
            DispatchError::Remote(body) => Value::Object(body.as_map().clone()),
            DispatchError::Parse { source, status } => json!({
                "success": false,
                "error": { "message": source.to_string() },
                "status": status,
            }),
            other => json!({
                "success": false,
                "error": { "message": other.message() },
            }),
        }
    }
}
