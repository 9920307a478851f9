//! Redemption error types.

use crate::ledger::LedgerError;
use thiserror::Error;

/// Redemption errors
#[derive(Debug, Error)]
pub enum RedemptionError {
    /// Underlying ledger failure
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Negative discount or deduction amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(rust_decimal::Decimal),
}

impl RedemptionError {
    /// Get a client-safe error message
    ///
    /// Checkout-facing callers degrade to "no discount applied" on failure;
    /// this message is for the admin surfaces that report errors directly.
    pub fn client_message(&self) -> String {
        match self {
            RedemptionError::Ledger(e) => e.client_message(),
            RedemptionError::InvalidAmount(_) => self.to_string(),
        }
    }
}

/// Result type for redemption operations
pub type RedemptionResult<T> = Result<T, RedemptionError>;
