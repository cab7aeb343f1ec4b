//! Error types for credential operations

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for credential operations
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors raised while establishing a session
///
/// Callers treat every variant as "authentication failed"; the variants only
/// exist so the logs say what went wrong.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The OAuth client registration file could not be read
    #[error("Failed to read client secrets at {path}: {source}")]
    ClientSecretsUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The OAuth client registration file is malformed
    #[error("Invalid client secrets: {0}")]
    InvalidClientSecrets(String),

    /// The persisted credential could not be read
    #[error("Failed to read credential file {path}: {source}")]
    CredentialUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The persisted credential is not valid JSON for a credential
    #[error("Credential file {path} is corrupt: {source}")]
    CorruptCredential {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The credential could not be written back to disk
    #[error("Failed to persist credential to {path}: {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The local callback listener could not be started
    #[error("Could not listen for the OAuth callback on port {port}: {source}")]
    CallbackListener { port: u16, source: std::io::Error },

    /// The operator declined consent, or the provider reported an error
    #[error("Authorization was denied: {0}")]
    ConsentDenied(String),

    /// Nobody completed the consent screen in time
    #[error("Timed out after {0:?} waiting for authorization")]
    ConsentTimedOut(Duration),

    /// The callback request carried no authorization code
    #[error("OAuth callback did not carry an authorization code")]
    MissingCode,

    /// The callback state did not match the one we issued
    #[error("OAuth state mismatch")]
    CsrfMismatch,

    /// Exchanging the authorization code failed
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    /// The identity provider rejected the refresh token
    #[error("Token refresh rejected: {0}")]
    Refresh(String),

    /// Invalid endpoint or client configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}
