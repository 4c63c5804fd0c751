//! Error normalization for the remote API.
//!
//! Every failure the client can observe (a transport failure with no
//! response, or a non-2xx status) is folded into a single [`ApiError`]
//! carrying a kind, the HTTP status when there was one, and a
//! human-readable message. The kind decides the retry policy.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use super::RawResponse;

/// Classification of an API failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// No response was received. Retryable.
    Network,
    /// HTTP 4xx other than 401. Surfaced immediately.
    Client,
    /// HTTP 401. Triggers the global session invalidation.
    Auth,
    /// HTTP 5xx. Retryable up to the retry budget.
    Server,
    /// A 2xx response whose body did not have the expected shape.
    Decode,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ApiErrorKind::Network => "network",
            ApiErrorKind::Client => "client",
            ApiErrorKind::Auth => "auth",
            ApiErrorKind::Server => "server",
            ApiErrorKind::Decode => "decode",
        };
        f.write_str(name)
    }
}

/// A normalized API failure.
///
/// `Clone` so a single failed request can be handed to every caller that
/// was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    kind: ApiErrorKind,
    status: Option<u16>,
    message: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
        }
    }

    /// Transport failure before any response arrived.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Network, None, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Decode, None, message)
    }

    /// Classify a status code.
    ///
    /// Returns `None` for 2xx and other non-error codes.
    pub fn from_status(status: u16, message: impl Into<String>) -> Option<Self> {
        let kind = match status {
            401 => ApiErrorKind::Auth,
            400..=499 => ApiErrorKind::Client,
            500..=599 => ApiErrorKind::Server,
            _ => return None,
        };
        Some(Self::new(kind, Some(status), message))
    }

    /// Build the error for a non-2xx response.
    ///
    /// Prefers the server-provided `message` (or `error`) field of a JSON
    /// body, falling back to `HTTP <code>: <reason>`.
    pub fn from_response(response: &RawResponse) -> Option<Self> {
        let message = server_message(&response.body).unwrap_or_else(|| {
            format!(
                "HTTP {}: {}",
                response.status,
                response.reason.as_deref().unwrap_or("Unknown")
            )
        });
        Self::from_status(response.status, message)
    }

    pub fn kind(&self) -> ApiErrorKind {
        self.kind
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Network and server failures are retried; everything else is terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, ApiErrorKind::Network | ApiErrorKind::Server)
    }

    pub fn is_auth(&self) -> bool {
        self.kind == ApiErrorKind::Auth
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }
}

fn server_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    ["message", "error"].iter().find_map(|field| {
        value
            .get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    })
}
