//! Fetch error types.

use hs_core::PROCESSING_STATUS;
use thiserror::Error;

/// Errors that can occur when fetching from the analytics API.
///
/// Cloneable so a single in-flight request can hand the same failure to
/// every caller waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The server accepted the query but has not computed it yet.
    #[error("Query is still being processed (HTTP 202)")]
    Processing,

    /// Non-success HTTP status.
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// The request could not be sent or the body could not be read.
    #[error("Request failed: {0}")]
    RequestError(String),

    /// The response body was not valid JSON.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Query parameters could not be built.
    #[error("Invalid query parameters: {0}")]
    InvalidParams(String),
}

impl FetchError {
    /// Numeric HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Processing => Some(PROCESSING_STATUS),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server asked us to try again later.
    pub fn is_processing(&self) -> bool {
        matches!(self, Self::Processing)
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::ParseError(e.to_string())
    }
}
