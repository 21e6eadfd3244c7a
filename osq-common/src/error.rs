//! Common error types for osq

use thiserror::Error;

/// Common result type for osq operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the osq crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input or stored value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for SQLite lock contention, the only database error worth retrying
    pub fn is_lock_error(&self) -> bool {
        match self {
            Error::Database(db_err) => {
                let msg = db_err.to_string();
                msg.contains("database is locked") || msg.contains("database table is locked")
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_are_not_lock_errors() {
        assert!(!Error::Internal("database is locked".to_string()).is_lock_error());
        assert!(!Error::Config("bad".to_string()).is_lock_error());
    }

    #[test]
    fn test_error_display() {
        let err = Error::NotFound("pending note 7".to_string());
        assert_eq!(err.to_string(), "Not found: pending note 7");
    }
}
