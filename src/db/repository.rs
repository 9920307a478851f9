//! Repository trait definitions for testability and dependency injection.
//!
//! This module provides trait-based abstractions over store operations,
//! enabling better testing through in-memory implementations and dependency
//! injection. The PostgreSQL implementations live in [`super::postgres`],
//! the in-memory ones in [`super::memory`].

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::activity::{ActionType, ActivityEntry};
use crate::ledger::{GiftCard, GiftCardUpdate, LedgerResult, NewGiftCard};
use crate::redemption::OrderDiscount;

/// Trait for gift card store operations
///
/// The `code` column carries a unique constraint in every implementation;
/// the code generator's collision check is an optimization, not the
/// guarantee.
#[async_trait]
pub trait GiftCardRepository: Send + Sync {
    /// Insert a newly issued card; the store assigns id and issuance time
    ///
    /// Fails with `LedgerError::DuplicateCode` when the unique constraint on
    /// `code` is violated.
    async fn insert(
        &self,
        code: &str,
        card: &NewGiftCard,
        owner_user_id: Option<i64>,
    ) -> LedgerResult<GiftCard>;

    /// Insert a fully specified card row (bulk import path)
    async fn insert_full(
        &self,
        code: &str,
        card: &NewGiftCard,
        issued_date: DateTime<Utc>,
        owner_user_id: Option<i64>,
    ) -> LedgerResult<GiftCard>;

    /// Whether a code is already in use
    async fn code_exists(&self, code: &str) -> LedgerResult<bool>;

    /// Find a card by code
    async fn get_by_code(&self, code: &str) -> LedgerResult<Option<GiftCard>>;

    /// Replace a card's balance with a new value (admin edit path)
    async fn update_balance(&self, code: &str, new_balance: Decimal) -> LedgerResult<()>;

    /// Apply an admin edit; the expiration column is written only when
    /// `update_expiration` is set
    async fn update_details(
        &self,
        code: &str,
        update: &GiftCardUpdate,
        update_expiration: bool,
    ) -> LedgerResult<()>;

    /// Atomically deduct up to `amount` from a card, flooring the balance at
    /// zero, and return how much was actually deducted
    ///
    /// A missing card or a non-positive `amount` deducts nothing. The
    /// decrement is a single linearizable write per card; concurrent
    /// deductions on the same code never lose updates.
    async fn deduct_balance(&self, code: &str, amount: Decimal) -> LedgerResult<Decimal>;

    /// Attach a card to a user account
    async fn set_owner(&self, code: &str, user_id: i64) -> LedgerResult<()>;

    /// Delete a card by code
    async fn delete(&self, code: &str) -> LedgerResult<()>;

    /// Cards owned by a user, oldest issued first; `active_only` restricts
    /// to cards with remaining balance
    async fn list_by_owner(&self, user_id: i64, active_only: bool) -> LedgerResult<Vec<GiftCard>>;

    /// Sum of balances over a user's active cards
    async fn sum_active_balance(&self, user_id: i64) -> LedgerResult<Decimal>;

    /// Cards whose expiration date falls within `[start, end]`
    async fn list_expiring_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> LedgerResult<Vec<GiftCard>>;

    /// Digital cards due for delivery on the given date
    async fn list_due_for_delivery(&self, date: NaiveDate) -> LedgerResult<Vec<GiftCard>>;

    /// Ownerless cards that carry a recipient email
    async fn list_unassociated(&self) -> LedgerResult<Vec<GiftCard>>;

    /// Ownerless cards issued to a specific recipient email
    async fn list_unowned_by_email(&self, email: &str) -> LedgerResult<Vec<GiftCard>>;

    /// Stable page of the whole ledger for batch export
    async fn list_page(&self, offset: i64, limit: i64) -> LedgerResult<Vec<GiftCard>>;

    /// Total number of cards
    async fn count(&self) -> LedgerResult<i64>;
}

/// Trait for append-only activity log storage
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Append one entry; entries are never updated or deleted
    async fn append(
        &self,
        action: ActionType,
        code: Option<&str>,
        amount: Option<Decimal>,
        user_id: Option<i64>,
    ) -> LedgerResult<()>;

    /// Most recent entries, newest first
    async fn recent(&self, limit: i64) -> LedgerResult<Vec<ActivityEntry>>;
}

/// Trait for committed order discount storage
#[async_trait]
pub trait OrderDiscountRepository: Send + Sync {
    /// Record a committed discount unless the order already carries one;
    /// returns whether this call inserted the row
    async fn insert_if_absent(
        &self,
        order_id: i64,
        user_id: i64,
        amount: Decimal,
    ) -> LedgerResult<bool>;

    /// Committed discount for an order, if any
    async fn get(&self, order_id: i64) -> LedgerResult<Option<OrderDiscount>>;
}

/// Trait for looking up host user accounts
///
/// Accounts belong to the embedding application, not to this crate; hosts
/// register an implementation backed by their user store. The in-memory
/// implementation in [`super::memory`] backs tests.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Account id for an email address, if registered
    async fn user_id_for_email(&self, email: &str) -> LedgerResult<Option<i64>>;

    /// Email address on file for an account
    async fn email_for_user(&self, user_id: i64) -> LedgerResult<Option<String>>;
}
