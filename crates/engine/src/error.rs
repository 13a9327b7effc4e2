//! The module contains the errors the engine can return.
//!
//! - [`Validation`] the command is malformed; nothing was written.
//! - [`NotFound`] a referenced client/vendor/invoice/account/event is absent
//!   (or belongs to another company).
//! - [`AllocationExceedsDue`] an allocation would overpay an invoice or a
//!   vendor cost line.
//! - [`InsufficientBalance`] an outflow would drive a cash account negative.
//! - [`ConcurrentModification`] the atomic unit lost a race; safe to retry.
//! - [`StorageUnavailable`] the database cannot be reached.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`NotFound`]: EngineError::NotFound
//!  [`AllocationExceedsDue`]: EngineError::AllocationExceedsDue
//!  [`InsufficientBalance`]: EngineError::InsufficientBalance
//!  [`ConcurrentModification`]: EngineError::ConcurrentModification
//!  [`StorageUnavailable`]: EngineError::StorageUnavailable
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Allocation exceeds due: {0}")]
    AllocationExceedsDue(String),
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),
    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error(transparent)]
    Database(DbErr),
}

impl EngineError {
    /// Returns `true` when the caller (or the engine itself) may retry.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConcurrentModification(_))
    }
}

impl From<DbErr> for EngineError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::ConnectionAcquire(inner) => Self::StorageUnavailable(inner.to_string()),
            DbErr::Conn(inner) => Self::StorageUnavailable(inner.to_string()),
            DbErr::RecordNotUpdated => {
                Self::ConcurrentModification("record changed while updating".to_string())
            }
            other => {
                let message = other.to_string();
                if is_lock_conflict(&message) {
                    Self::ConcurrentModification(message)
                } else {
                    Self::Database(other)
                }
            }
        }
    }
}

/// SQLite reports writer conflicts as `SQLITE_BUSY`/`SQLITE_LOCKED`.
fn is_lock_conflict(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("database is locked")
        || lower.contains("database table is locked")
        || lower.contains("sqlite_busy")
        || lower.contains("sqlite_locked")
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::AllocationExceedsDue(a), Self::AllocationExceedsDue(b)) => a == b,
            (Self::InsufficientBalance(a), Self::InsufficientBalance(b)) => a == b,
            (Self::ConcurrentModification(a), Self::ConcurrentModification(b)) => a == b,
            (Self::StorageUnavailable(a), Self::StorageUnavailable(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_errors_are_transient() {
        let err = EngineError::from(DbErr::Custom(
            "error returned from database: (code: 5) database is locked".to_string(),
        ));
        assert!(err.is_transient());
    }

    #[test]
    fn record_not_updated_is_a_conflict() {
        let err = EngineError::from(DbErr::RecordNotUpdated);
        assert!(matches!(err, EngineError::ConcurrentModification(_)));
    }

    #[test]
    fn other_errors_stay_database_errors() {
        let err = EngineError::from(DbErr::Custom("syntax error".to_string()));
        assert!(matches!(err, EngineError::Database(_)));
        assert!(!err.is_transient());
    }
}
