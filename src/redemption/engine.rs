//! Redemption engine implementation.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::errors::{RedemptionError, RedemptionResult};
use super::models::{
    CardDeduction, CheckoutPhase, CommitOutcome, DeductionOutcome, DiscountHold,
};
use crate::activity::{ActionType, ActivityLogger};
use crate::db::repository::{GiftCardRepository, OrderDiscountRepository};

/// Redemption engine
///
/// Computes the discount a checkout session may apply, parks it in
/// session-scoped transient state, and on order completion commits it
/// exactly once and consumes card balances oldest-issued-first.
///
/// The balance query is a projection, not a reservation: nothing is locked
/// between query and commit. When balances move in between, the deduction
/// absorbs the shortfall rather than touching the completed order.
#[derive(Clone)]
pub struct RedemptionEngine {
    cards: Arc<dyn GiftCardRepository>,
    orders: Arc<dyn OrderDiscountRepository>,
    activity: ActivityLogger,
    holds: Arc<Mutex<HashMap<String, DiscountHold>>>,
}

impl RedemptionEngine {
    /// Create a new redemption engine
    ///
    /// # Arguments
    ///
    /// * `cards` - Gift card storage
    /// * `orders` - Committed order discount storage
    /// * `activity` - Activity logger
    pub fn new(
        cards: Arc<dyn GiftCardRepository>,
        orders: Arc<dyn OrderDiscountRepository>,
        activity: ActivityLogger,
    ) -> Self {
        Self {
            cards,
            orders,
            activity,
            holds: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Total redeemable balance across a user's active cards
    ///
    /// Expired cards still count; expiry gates reminder emails, not
    /// redemption.
    pub async fn query_eligible_balance(&self, user_id: i64) -> RedemptionResult<Decimal> {
        Ok(self.cards.sum_active_balance(user_id).await?)
    }

    /// Discount for a checkout: the smallest of what was asked for, what the
    /// user owns, and what the cart costs; never negative
    pub fn compute_discount(
        requested: Decimal,
        eligible_total: Decimal,
        cart_subtotal: Decimal,
    ) -> Decimal {
        requested
            .min(eligible_total)
            .min(cart_subtotal)
            .max(Decimal::ZERO)
    }

    /// Park a discount in session state; nothing is written to the store
    ///
    /// # Errors
    ///
    /// * `RedemptionError::InvalidAmount` - Negative discount
    pub fn hold_discount(&self, session_id: &str, amount: Decimal) -> RedemptionResult<()> {
        if amount < Decimal::ZERO {
            return Err(RedemptionError::InvalidAmount(amount));
        }

        let phase = if amount > Decimal::ZERO {
            CheckoutPhase::DiscountHeld
        } else {
            CheckoutPhase::NoGiftCard
        };
        self.holds
            .lock()
            .unwrap()
            .insert(session_id.to_string(), DiscountHold { amount, phase });
        Ok(())
    }

    /// Discount currently held for a session, if any
    pub fn held_discount(&self, session_id: &str) -> Option<Decimal> {
        self.holds
            .lock()
            .unwrap()
            .get(session_id)
            .filter(|h| h.phase == CheckoutPhase::DiscountHeld)
            .map(|h| h.amount)
    }

    /// Drop a session's held discount (checkout abandoned)
    ///
    /// No ledger effect to undo; the hold never touched the store.
    pub fn release_discount(&self, session_id: &str) {
        self.holds.lock().unwrap().remove(session_id);
    }

    /// Commit a discount onto a completed order, exactly once
    ///
    /// The first call for an order records the discount and applies the
    /// FIFO deduction; any repeat (duplicate completion events) is a no-op.
    /// A zero discount commits nothing.
    ///
    /// # Arguments
    ///
    /// * `order_id` - Completed order
    /// * `user_id` - Owner whose cards are consumed
    /// * `discount` - Amount the order already granted at checkout
    ///
    /// # Errors
    ///
    /// * `RedemptionError::InvalidAmount` - Negative discount
    pub async fn commit_order(
        &self,
        order_id: i64,
        user_id: i64,
        discount: Decimal,
    ) -> RedemptionResult<CommitOutcome> {
        if discount < Decimal::ZERO {
            return Err(RedemptionError::InvalidAmount(discount));
        }
        if discount == Decimal::ZERO {
            return Ok(CommitOutcome::NoDiscount);
        }

        let inserted = self
            .orders
            .insert_if_absent(order_id, user_id, discount)
            .await?;
        if !inserted {
            return Ok(CommitOutcome::AlreadyCommitted);
        }

        let outcome = self.apply_fifo_deduction(user_id, discount).await?;
        Ok(CommitOutcome::Committed(outcome))
    }

    /// Consume card balances oldest-issued-first until the discount is
    /// covered
    ///
    /// Each touched card gets one atomic clamped deduction and one `used`
    /// activity entry. Running out of cards before the discount is covered
    /// leaves a shortfall in the outcome; the order keeps its discount.
    pub async fn apply_fifo_deduction(
        &self,
        user_id: i64,
        total_discount: Decimal,
    ) -> RedemptionResult<DeductionOutcome> {
        if total_discount < Decimal::ZERO {
            return Err(RedemptionError::InvalidAmount(total_discount));
        }

        let eligible = self.cards.list_by_owner(user_id, true).await?;

        let mut remaining = total_discount;
        let mut deductions = Vec::new();
        for card in eligible {
            if remaining <= Decimal::ZERO {
                break;
            }
            let deducted = self.cards.deduct_balance(&card.code, remaining).await?;
            if deducted > Decimal::ZERO {
                remaining -= deducted;
                self.activity
                    .record(ActionType::Used, Some(&card.code), Some(deducted), Some(user_id))
                    .await;
                deductions.push(CardDeduction {
                    code: card.code,
                    amount: deducted,
                });
            }
        }

        if remaining > Decimal::ZERO {
            log::warn!(
                "FIFO deduction for user {user_id} fell short by {remaining}; \
                 order keeps its discount"
            );
        }

        Ok(DeductionOutcome {
            requested: total_discount,
            deducted: total_discount - remaining,
            shortfall: remaining,
            deductions,
        })
    }
}
