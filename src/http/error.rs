//! Errors surfaced by outbound HTTP calls.

use reqwest::StatusCode;
use std::fmt;

/// How a call failed before any response arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// The connection could not be established (refused, reset, DNS).
    Connect,
    /// The per-call timeout elapsed.
    Timeout,
    /// Anything else that prevented a response, e.g. a failed request body.
    Other,
}

impl TransportKind {
    pub fn of(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            TransportKind::Timeout
        } else if error.is_connect() {
            TransportKind::Connect
        } else {
            TransportKind::Other
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Connect => write!(f, "connection failed"),
            TransportKind::Timeout => write!(f, "timed out"),
            TransportKind::Other => write!(f, "request failed"),
        }
    }
}

/// The last observed failure of a call, returned to the caller once retrying stops.
#[derive(Debug)]
pub enum HttpError {
    /// No response was received.
    Transport {
        url: String,
        kind: TransportKind,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// The server answered with a non-success status.
    Status {
        url: String,
        status: StatusCode,
        /// Raw `retry-after` value in seconds, when the header was numeric.
        retry_after: Option<f64>,
        /// Message extracted from the error body, if any.
        message: Option<String>,
    },
}

impl HttpError {
    pub fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        HttpError::Transport {
            url: url.to_string(),
            kind: TransportKind::of(&error),
            source: Box::new(error),
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            HttpError::Transport { .. } => None,
        }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpError::Transport { url, kind, source } => {
                write!(f, "Request to {} {}: {}", url, kind, source)
            }
            HttpError::Status {
                status, message, ..
            } => {
                let detail = message
                    .as_deref()
                    .or_else(|| status.canonical_reason())
                    .unwrap_or("no details");
                match *status {
                    StatusCode::UNAUTHORIZED => write!(
                        f,
                        "Authentication failed (HTTP 401): {}. Check your access token or run `telescope refresh`.",
                        detail
                    ),
                    StatusCode::FORBIDDEN => write!(
                        f,
                        "Access forbidden (HTTP 403): {}. The token may lack a required scope; run `telescope authorize` again.",
                        detail
                    ),
                    StatusCode::NOT_FOUND => write!(f, "Not found (HTTP 404): {}", detail),
                    StatusCode::TOO_MANY_REQUESTS => write!(
                        f,
                        "Rate limit exceeded (HTTP 429): {}. Try again later.",
                        detail
                    ),
                    s => write!(f, "HTTP {} error: {}", s.as_u16(), detail),
                }
            }
        }
    }
}

impl std::error::Error for HttpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HttpError::Transport { source, .. } => Some(source.as_ref()),
            HttpError::Status { .. } => None,
        }
    }
}

/// Pulls a human-readable message out of a Spotify error body.
///
/// The Web API answers `{"error": {"status": 401, "message": "..."}}` while the
/// accounts service answers `{"error": "invalid_grant", "error_description": "..."}`.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value.pointer("/error/message").and_then(|m| m.as_str()) {
            return Some(message.to_string());
        }
        if let Some(description) = value.get("error_description").and_then(|d| d.as_str()) {
            return Some(description.to_string());
        }
        if let Some(code) = value.get("error").and_then(|e| e.as_str()) {
            return Some(code.to_string());
        }
    }

    // Plain text bodies: keep the first line only
    let line = body.lines().next().unwrap_or_default();
    let truncated: String = line.chars().take(200).collect();
    Some(truncated)
}
