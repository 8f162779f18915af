use thiserror::Error;

/// Errors surfaced by the ledger HTTP client
///
/// Retries happen inside the client, so callers only ever see the error
/// from the final attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced a response (connection refused, timeout, reset)
    #[error("Network error: {0}")]
    Network(String),
    /// The server answered with a non-2xx status
    #[error("HTTP {status}: {reason}")]
    Http { status: u16, reason: String },
    /// The response body was not the JSON we expected
    #[error("Failed to parse response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build an `Http` error from a status code, using the canonical reason phrase
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        ApiError::Http {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown Status").to_string(),
        }
    }

    /// Status code for HTTP failures, `None` for transport and decode failures
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}
