//! Error types for the directory and ledger

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core errors
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed input (bad amount, empty field, invalid state for the operation)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced user does not exist
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Referenced transaction does not exist
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// Actor lacks authority for the operation. Deliberately carries no
    /// detail beyond "not permitted".
    #[error("Operation not permitted")]
    Permission,

    /// Payer or subject balance below the requested amount
    #[error("Insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance {
        /// Balance at the time of the check
        available: Decimal,
        /// Amount the operation asked for
        requested: Decimal,
    },

    /// Uniqueness violation on user creation or update
    #[error("Conflict: {field} is already taken")]
    Conflict {
        /// The conflicting field (`username` or `email`)
        field: &'static str,
    },

    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_error_is_opaque() {
        let err = Error::Permission;
        assert_eq!(err.to_string(), "Operation not permitted");
    }

    #[test]
    fn test_insufficient_balance_carries_context() {
        let err = Error::InsufficientBalance {
            available: Decimal::new(40000, 2),
            requested: Decimal::new(1000000, 2),
        };
        let msg = err.to_string();
        assert!(msg.contains("400.00"));
        assert!(msg.contains("10000.00"));
    }
}
