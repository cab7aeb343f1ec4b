//! Error types for directory operations

use thiserror::Error;

/// Result type for directory operations
pub type Result<T> = std::result::Result<T, DirectoryError>;

/// Errors that can occur while talking to the business profile APIs
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// The bearer credential was rejected
    #[error("Credential rejected by {api}")]
    AuthenticationFailed { api: &'static str },

    /// The credential lacks access to the requested resource
    #[error("Permission denied by {api}: {body}")]
    PermissionDenied { api: &'static str, body: String },

    /// Any other non-success HTTP status
    #[error("{api} returned HTTP {status}: {body}")]
    RequestFailed {
        api: &'static str,
        status: u16,
        body: String,
    },

    /// The response body did not have the expected shape
    #[error("Unexpected response from {api}: {source}")]
    UnexpectedResponse {
        api: &'static str,
        source: serde_json::Error,
    },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl DirectoryError {
    /// Map a non-success status to an error
    pub(crate) fn from_status(api: &'static str, status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 => Self::AuthenticationFailed { api },
            403 => Self::PermissionDenied { api, body },
            status => Self::RequestFailed { api, status, body },
        }
    }
}
