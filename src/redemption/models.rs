//! Redemption data models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Checkout session phases
///
/// A session that abandons checkout simply decays out of `DiscountHeld`;
/// only `commit_order` has ledger side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckoutPhase {
    NoGiftCard,
    BalanceQueried,
    DiscountHeld,
    DiscountCommitted,
    DiscountAbandoned,
}

/// Transient, session-scoped discount state
///
/// Nothing here touches the store; the hold is the amount the checkout UI
/// shows until the order completes or the session dies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscountHold {
    pub amount: Decimal,
    pub phase: CheckoutPhase,
}

/// Discount committed onto an order, keyed by order id
///
/// The primary key on `order_id` is what makes duplicate completion events
/// no-ops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDiscount {
    pub order_id: i64,
    pub user_id: i64,
    pub amount: Decimal,
    pub committed_at: DateTime<Utc>,
}

/// Amount taken from a single card during FIFO deduction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardDeduction {
    pub code: String,
    pub amount: Decimal,
}

/// Result of a FIFO deduction pass
///
/// `shortfall` is non-zero when the eligible balance moved between the
/// checkout query and order completion; the order keeps its discount and the
/// difference is absorbed rather than corrected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionOutcome {
    pub requested: Decimal,
    pub deducted: Decimal,
    pub shortfall: Decimal,
    pub deductions: Vec<CardDeduction>,
}

/// Outcome of committing a discount onto an order
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// First commit for this order; deductions were applied
    Committed(DeductionOutcome),
    /// The order already carries a committed discount; nothing was done
    AlreadyCommitted,
    /// A zero discount commits nothing
    NoDiscount,
}
