//! Redemption module providing checkout discounts and FIFO balance
//! consumption.
//!
//! This module implements:
//! - Eligible balance projection over a user's active cards
//! - Discount computation bounded by balance and cart subtotal
//! - Session-scoped discount holds with no store side effects
//! - Exactly-once order commit guarded by the order discount table
//! - FIFO deduction, oldest issued card first, with per-card audit entries

pub mod engine;
pub mod errors;
pub mod models;

pub use engine::RedemptionEngine;
pub use errors::{RedemptionError, RedemptionResult};
pub use models::{
    CardDeduction, CheckoutPhase, CommitOutcome, DeductionOutcome, DiscountHold, OrderDiscount,
};
