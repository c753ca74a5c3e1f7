//! Content source errors

use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised at the content source boundary
#[derive(Debug, Error)]
pub enum CmsError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Content API returned {status} for {url}")]
    Status { status: StatusCode, url: String },

    #[error("Failed to decode {context}: {source}")]
    Decode {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Content API did not advertise a master ref")]
    NoMasterRef,

    #[error("Invalid pagination cursor: {0}")]
    InvalidCursor(String),

    #[error("Invalid content API endpoint: {0}")]
    InvalidEndpoint(String),
}

impl CmsError {
    pub fn decode(context: &'static str, source: serde_json::Error) -> Self {
        Self::Decode { context, source }
    }

    /// Whether repeating the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            Self::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            Self::Decode { .. }
            | Self::NoMasterRef
            | Self::InvalidCursor(_)
            | Self::InvalidEndpoint(_) => false,
        }
    }
}
