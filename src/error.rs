//! Crate-wide error taxonomy.
//!
//! Mirrors the classification used throughout the pipeline: callers never
//! need to downcast a generic error to decide whether something is worth
//! retrying, a silent dedup skip, or a caller-visible storage failure.

use std::fmt;

use thiserror::Error;

/// Structured classification for the underlying storage driver failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorKind {
    /// The store returned busy/locked under concurrent access.
    BusyOrLocked,
    /// Constraint failure (unique/foreign-key/check/not-null).
    ConstraintViolation,
    /// Connection pool timed out waiting for a free connection.
    PoolTimeout,
    /// Connection pool is closed.
    PoolClosed,
    /// Expected row was not found.
    RowNotFound,
    /// Filesystem or transport IO failure.
    Io,
    /// SQL protocol/driver error.
    Protocol,
    /// Unclassified storage failure.
    Other,
}

impl StorageErrorKind {
    #[must_use]
    pub fn from_sqlx(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut => Self::PoolTimeout,
            sqlx::Error::PoolClosed => Self::PoolClosed,
            sqlx::Error::RowNotFound => Self::RowNotFound,
            sqlx::Error::Io(_) => Self::Io,
            sqlx::Error::Protocol(_) => Self::Protocol,
            sqlx::Error::Database(database_error) => {
                classify_database_error(database_error.as_ref())
            }
            _ => Self::Other,
        }
    }
}

impl fmt::Display for StorageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::BusyOrLocked => "busy_or_locked",
            Self::ConstraintViolation => "constraint_violation",
            Self::PoolTimeout => "pool_timeout",
            Self::PoolClosed => "pool_closed",
            Self::RowNotFound => "row_not_found",
            Self::Io => "io",
            Self::Protocol => "protocol",
            Self::Other => "other",
        };
        write!(f, "{label}")
    }
}

fn classify_database_error(
    database_error: &(dyn sqlx::error::DatabaseError + 'static),
) -> StorageErrorKind {
    let code = database_error.code();
    if matches!(
        code.as_deref(),
        Some("SQLITE_BUSY" | "SQLITE_LOCKED" | "5" | "6")
    ) {
        return StorageErrorKind::BusyOrLocked;
    }

    if database_error.is_unique_violation()
        || database_error.is_foreign_key_violation()
        || database_error.is_check_violation()
        || code
            .as_deref()
            .is_some_and(|value| value.starts_with("SQLITE_CONSTRAINT"))
    {
        return StorageErrorKind::ConstraintViolation;
    }

    let message = database_error.message().to_ascii_lowercase();
    if message.contains("database is locked") || message.contains("database is busy") {
        return StorageErrorKind::BusyOrLocked;
    }

    StorageErrorKind::Other
}

/// A failure from the underlying storage driver, surfaced out of the core.
#[derive(Debug, Clone, Error)]
#[error("storage error ({kind}): {message}")]
pub struct StorageError {
    pub kind: StorageErrorKind,
    pub message: String,
}

impl StorageError {
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        self.kind == StorageErrorKind::ConstraintViolation
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        Self {
            kind: StorageErrorKind::from_sqlx(&err),
            message: err.to_string(),
        }
    }
}

/// Crate-wide error taxonomy.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Malformed or missing required fields. Never retried.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Uniqueness conflict. Callers treat this as a success-skip.
    #[error("duplicate entry")]
    Duplicate,

    /// Network, timeout, 5xx, or storage-availability failure. Eligible for retry.
    #[error("transient failure: {0}")]
    Transient(String),

    /// Semantic rejection by a collaborator (bad embed, forbidden channel). Not retried.
    #[error("permanent failure: {0}")]
    Permanent(String),

    /// The underlying store refused the operation. Propagated out of the core.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref database_error)
                if database_error.is_unique_violation() =>
            {
                Self::Duplicate
            }
            other => Self::Storage(StorageError::from(other)),
        }
    }
}

/// Truncates `message` to at most `max_len` bytes without splitting a UTF-8
/// code point.
#[must_use]
pub fn truncate_message(message: &str, max_len: usize) -> String {
    if message.len() <= max_len {
        return message.to_string();
    }
    let mut end = max_len;
    while end > 0 && !message.is_char_boundary(end) {
        end -= 1;
    }
    message[..end].to_string()
}
