use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No git repository found at or above: {}", .0.display())]
    RepoNotFound(PathBuf),

    #[error("Invalid commit hash '{0}': expected exactly 40 hexadecimal characters")]
    InvalidHash(String),

    #[error("Invalid date range: since {since} is after until {until}")]
    InvalidRange {
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    },

    #[error("Commit not found: {0}")]
    CommitNotFound(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Git command failed: {0}")]
    Git(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// A record rejected by the store, naming the first offending field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("field '{field}': {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_are_distinct() {
        let messages = [
            Error::RepoNotFound(PathBuf::from("/nowhere")).to_string(),
            Error::InvalidHash("abc123".to_string()).to_string(),
            Error::CommitNotFound("HEAD".to_string()).to_string(),
            Error::Validation(ValidationError::new("id", "missing")).to_string(),
            Error::Git("boom".to_string()).to_string(),
            Error::Config("bad".to_string()).to_string(),
        ];

        for (i, a) in messages.iter().enumerate() {
            for b in messages.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
        assert!(messages[1].contains("abc123"));
        assert!(messages[3].contains("'id'"));
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("commit_hash", "expected 40 lowercase hexadecimal characters");
        assert_eq!(
            err.to_string(),
            "field 'commit_hash': expected 40 lowercase hexadecimal characters"
        );

        let source: &dyn std::error::Error = &err;
        assert!(source.source().is_none());
    }
}
