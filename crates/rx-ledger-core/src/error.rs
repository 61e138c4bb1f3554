//! Error types shared across the ledger.

use thiserror::Error;

/// Ledger errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i64, available: i64 },

    #[error("Quantity exceeds available stock: requested {requested}, available {available}")]
    ExceedsAvailable { requested: i64, available: i64 },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

impl LedgerError {
    /// Convenience constructor for missing-entity errors.
    pub fn not_found(kind: &str, id: &str) -> Self {
        LedgerError::NotFound(format!("{} {}", kind, id))
    }
}
