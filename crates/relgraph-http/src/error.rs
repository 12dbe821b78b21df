use thiserror::Error;

use crate::types::HttpMethod;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("failed to {method} '{url}' with status '{status}' and status text '{status_text}'")]
    Status {
        method: HttpMethod,
        url: String,
        status: u16,
        status_text: String,
    },

    #[error("cannot {method} '{url}': {reason}")]
    Connection {
        method: HttpMethod,
        url: String,
        reason: String,
    },

    #[error("invalid response body from '{url}': {reason}")]
    Decode { url: String, reason: String },

    #[error("{method} '{url}' was cancelled")]
    Cancelled { method: HttpMethod, url: String },

    #[error("cannot build HTTP client: {0}")]
    Client(String),
}

impl HttpError {
    /// HTTP status for `Status` failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type HttpResult<T> = Result<T, HttpError>;
