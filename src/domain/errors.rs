//! Domain errors for the flaky test analyzer.

use thiserror::Error;

/// Domain-level errors that can occur while collecting or reading analysis data.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Reason-specific evidence was requested from a test whose reason is a
    /// different variant (or absent).
    #[error("Invalid reason state: expected {expected}, found {actual}")]
    InvalidReasonState {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Malformed execution record: {0}")]
    MalformedRecord(String),

    #[error("Build history unavailable: {0}")]
    HistoryUnavailable(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_reason_state_message() {
        let err = DomainError::InvalidReasonState {
            expected: "builds_on_same_modification",
            actual: "none",
        };
        assert_eq!(
            err.to_string(),
            "Invalid reason state: expected builds_on_same_modification, found none"
        );
    }

    #[test]
    fn test_from_serde_error() {
        let err = serde_json::from_str::<u32>("not a number").unwrap_err();
        let domain: DomainError = err.into();
        assert!(matches!(domain, DomainError::SerializationError(_)));
    }
}
