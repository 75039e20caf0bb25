//! Client error types

use reqwest::StatusCode;
use thiserror::Error;

/// Collaborator call error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ClientError {
    pub kind: ClientErrorKind,
    pub message: String,
}

impl ClientError {
    pub fn new(kind: ClientErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Network, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::NotFound, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Server, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::InvalidRequest, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Decode, message)
    }

    /// Classify a non-success HTTP response
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let detail = detail_from_body(body).unwrap_or_else(|| body.trim().to_string());
        let message = if detail.is_empty() {
            format!("HTTP {status}")
        } else {
            format!("HTTP {status}: {detail}")
        };
        match status.as_u16() {
            401 | 403 => Self::unauthorized(message),
            404 => Self::not_found(message),
            408 | 429 => Self::network(message),
            400..=499 => Self::invalid_request(message),
            _ => Self::server(message),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::decode(e.to_string())
        } else if let Some(status) = e.status() {
            ClientError::from_status(status, "")
        } else {
            ClientError::network(e.to_string())
        }
    }
}

/// The backend reports errors as `{"detail": "..."}`
fn detail_from_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("detail")?.as_str().map(String::from)
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
    /// Connection failures, timeouts - transient
    Network,
    /// Missing or rejected credentials (401, 403)
    Unauthorized,
    /// Unknown room or session (404)
    NotFound,
    /// Other 4xx
    InvalidRequest,
    /// 5xx
    Server,
    /// Response body did not match the expected shape
    Decode,
}

impl ClientErrorKind {
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Network | Self::Server)
    }
}
