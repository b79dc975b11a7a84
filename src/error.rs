//! Error types for bwclient.

use thiserror::Error;

/// Main error type for Bitwarden CLI operations.
#[derive(Error, Debug)]
pub enum BitwardenError {
    #[error("Bitwarden CLI is not installed. Please install it first. ({0})")]
    ToolNotInstalled(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Login failed. Please check your credentials. ({0})")]
    LoginFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Failed to list items: {0}")]
    ItemListingFailed(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, BitwardenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_are_human_readable() {
        let err = BitwardenError::ToolNotInstalled("bw: not found".to_string());
        assert!(err.to_string().contains("not installed"));
        assert!(err.to_string().contains("bw: not found"));

        let err = BitwardenError::Configuration("Bitwarden server URL is not provided".into());
        assert_eq!(
            err.to_string(),
            "Configuration error: Bitwarden server URL is not provided"
        );

        let err = BitwardenError::AuthenticationFailed("Invalid master password.".into());
        assert!(err.to_string().starts_with("Authentication failed"));
    }
}
