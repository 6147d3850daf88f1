//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Aura
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum AuraError {
    /// Malformed or missing event fields. The store is never touched.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    /// Classifier, embedding or response generation failure.
    #[error("External service error: {0}")]
    External(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuraError {
    /// Shorthand for building a [`AuraError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether the error came from the caller's input rather than the system.
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Result type alias for Aura operations
pub type Result<T> = std::result::Result<T, AuraError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_and_message() {
        let err = AuraError::Validation("title is required".into());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json, serde_json::json!({"type": "Validation", "message": "title is required"}));
    }

    #[test]
    fn display_includes_category() {
        let err = AuraError::Timeout("event store call exceeded 5000ms".into());
        assert_eq!(err.to_string(), "Timed out: event store call exceeded 5000ms");
        assert!(!err.is_validation());
        assert!(AuraError::validation("x").is_validation());
    }
}
