//! Bulk transfer error types.

use crate::ledger::LedgerError;
use thiserror::Error;

/// Bulk import/export errors
///
/// Per-row problems never surface here; they accumulate in the run's
/// report. These are failures of the run itself.
#[derive(Debug, Error)]
pub enum BulkError {
    /// Underlying ledger failure
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// CSV reader/writer failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for bulk operations
pub type BulkResult<T> = Result<T, BulkError>;
