//! Error types for the relay

use relay_auth::AuthError;
use relay_directory::DirectoryError;
use thiserror::Error;

/// Result type for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;

/// Errors that can occur while serving commands
#[derive(Error, Debug)]
pub enum RelayError {
    /// Missing or invalid setting, fatal at startup
    #[error("Configuration error: {0}")]
    Config(String),

    /// No usable session could be established
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(#[from] AuthError),

    /// The location listing failed
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// The Bot API answered with `ok: false`
    #[error("Telegram API error in {method}: {description}")]
    Telegram {
        method: &'static str,
        description: String,
    },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RelayError::Config("TELEGRAM_BOT_TOKEN not set".to_string());
        assert_eq!(err.to_string(), "Configuration error: TELEGRAM_BOT_TOKEN not set");

        let err: RelayError = AuthError::MissingCode.into();
        assert!(matches!(err, RelayError::AuthenticationFailed(_)));

        let err = RelayError::Telegram {
            method: "sendMessage",
            description: "Bad Request: chat not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Telegram API error in sendMessage: Bad Request: chat not found"
        );
    }
}
