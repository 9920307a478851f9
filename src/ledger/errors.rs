//! Ledger error types.

use thiserror::Error;

/// Ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Underlying store failure on insert/update/delete
    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    /// Gift card lookup failed
    #[error("Gift card not found: {0}")]
    NotFound(String),

    /// Unique constraint on the code column was violated
    #[error("Duplicate gift card code: {0}")]
    DuplicateCode(String),

    /// Input rejected before any store mutation
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Code generation gave up after the bounded number of collision retries
    #[error("Code generation exhausted after {0} attempts")]
    CodeGenerationExhausted(u32),
}

impl LedgerError {
    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Store errors are sanitized to avoid exposing SQL details; generation
    /// exhaustion reads as a generic failure since retry internals are not
    /// actionable for a caller.
    pub fn client_message(&self) -> String {
        match self {
            LedgerError::Store(_) => "Internal server error".to_string(),
            LedgerError::NotFound(_) => "Gift card not found".to_string(),
            LedgerError::CodeGenerationExhausted(_) => {
                "Could not issue gift card, please try again".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
