//! In-memory repository implementations.
//!
//! These back the test suites and give embedding hosts a store-free way to
//! exercise the engine. They mirror the PostgreSQL implementations'
//! semantics: unique codes, clamped deductions, FIFO ordering by issuance
//! date. Locks follow the acquire-mutate-drop pattern and are never held
//! across awaits.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::repository::{
    AccountDirectory, ActivityRepository, GiftCardRepository, OrderDiscountRepository,
};
use crate::activity::{ActionType, ActivityEntry};
use crate::ledger::{GiftCard, GiftCardUpdate, LedgerError, LedgerResult, NewGiftCard};
use crate::redemption::OrderDiscount;

/// In-memory implementation of `GiftCardRepository`
#[derive(Clone, Default)]
pub struct MemoryGiftCardRepository {
    inner: Arc<Mutex<CardTable>>,
}

#[derive(Default)]
struct CardTable {
    cards: Vec<GiftCard>,
    next_id: i64,
}

impl MemoryGiftCardRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate store write failures for the given codes; used to exercise
    /// partial-failure paths in batch operations
    pub fn fail_writes_for(&self, code: &str) -> FailingGiftCardRepository {
        FailingGiftCardRepository {
            inner: self.clone(),
            failing_codes: vec![code.to_string()],
        }
    }
}

#[async_trait]
impl GiftCardRepository for MemoryGiftCardRepository {
    async fn insert(
        &self,
        code: &str,
        card: &NewGiftCard,
        owner_user_id: Option<i64>,
    ) -> LedgerResult<GiftCard> {
        self.insert_full(code, card, Utc::now(), owner_user_id).await
    }

    async fn insert_full(
        &self,
        code: &str,
        card: &NewGiftCard,
        issued_date: DateTime<Utc>,
        owner_user_id: Option<i64>,
    ) -> LedgerResult<GiftCard> {
        let mut table = self.inner.lock().unwrap();
        if table.cards.iter().any(|c| c.code == code) {
            return Err(LedgerError::DuplicateCode(code.to_string()));
        }

        table.next_id += 1;
        let stored = GiftCard {
            id: table.next_id,
            code: code.to_string(),
            balance: card.balance,
            expiration_date: card.expiration_date,
            sender_name: card.sender_name.clone(),
            sender_email: card.sender_email.clone(),
            recipient_email: card.recipient_email.clone(),
            message: card.message.clone(),
            issued_date,
            delivery_date: card.delivery_date.unwrap_or_else(|| issued_date.date_naive()),
            gift_card_type: card.gift_card_type,
            owner_user_id,
        };
        table.cards.push(stored.clone());
        Ok(stored)
    }

    async fn code_exists(&self, code: &str) -> LedgerResult<bool> {
        let table = self.inner.lock().unwrap();
        Ok(table.cards.iter().any(|c| c.code == code))
    }

    async fn get_by_code(&self, code: &str) -> LedgerResult<Option<GiftCard>> {
        let table = self.inner.lock().unwrap();
        Ok(table.cards.iter().find(|c| c.code == code).cloned())
    }

    async fn update_balance(&self, code: &str, new_balance: Decimal) -> LedgerResult<()> {
        let mut table = self.inner.lock().unwrap();
        let card = table
            .cards
            .iter_mut()
            .find(|c| c.code == code)
            .ok_or_else(|| LedgerError::NotFound(code.to_string()))?;
        card.balance = new_balance;
        Ok(())
    }

    async fn update_details(
        &self,
        code: &str,
        update: &GiftCardUpdate,
        update_expiration: bool,
    ) -> LedgerResult<()> {
        let mut table = self.inner.lock().unwrap();
        let card = table
            .cards
            .iter_mut()
            .find(|c| c.code == code)
            .ok_or_else(|| LedgerError::NotFound(code.to_string()))?;
        card.balance = update.balance;
        card.recipient_email = update.recipient_email.clone();
        card.sender_name = update.sender_name.clone();
        card.message = update.message.clone();
        if update_expiration {
            card.expiration_date = update.expiration_date;
        }
        Ok(())
    }

    async fn deduct_balance(&self, code: &str, amount: Decimal) -> LedgerResult<Decimal> {
        if amount <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }

        let mut table = self.inner.lock().unwrap();
        let Some(card) = table.cards.iter_mut().find(|c| c.code == code) else {
            return Ok(Decimal::ZERO);
        };
        let deducted = card.balance.min(amount);
        card.balance -= deducted;
        Ok(deducted)
    }

    async fn set_owner(&self, code: &str, user_id: i64) -> LedgerResult<()> {
        let mut table = self.inner.lock().unwrap();
        let card = table
            .cards
            .iter_mut()
            .find(|c| c.code == code)
            .ok_or_else(|| LedgerError::NotFound(code.to_string()))?;
        card.owner_user_id = Some(user_id);
        Ok(())
    }

    async fn delete(&self, code: &str) -> LedgerResult<()> {
        let mut table = self.inner.lock().unwrap();
        let before = table.cards.len();
        table.cards.retain(|c| c.code != code);
        if table.cards.len() == before {
            return Err(LedgerError::NotFound(code.to_string()));
        }
        Ok(())
    }

    async fn list_by_owner(&self, user_id: i64, active_only: bool) -> LedgerResult<Vec<GiftCard>> {
        let table = self.inner.lock().unwrap();
        let mut cards: Vec<GiftCard> = table
            .cards
            .iter()
            .filter(|c| c.owner_user_id == Some(user_id))
            .filter(|c| !active_only || c.is_active())
            .cloned()
            .collect();
        cards.sort_by(|a, b| a.issued_date.cmp(&b.issued_date).then(a.id.cmp(&b.id)));
        Ok(cards)
    }

    async fn sum_active_balance(&self, user_id: i64) -> LedgerResult<Decimal> {
        let table = self.inner.lock().unwrap();
        Ok(table
            .cards
            .iter()
            .filter(|c| c.owner_user_id == Some(user_id) && c.is_active())
            .map(|c| c.balance)
            .sum())
    }

    async fn list_expiring_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> LedgerResult<Vec<GiftCard>> {
        let table = self.inner.lock().unwrap();
        let mut cards: Vec<GiftCard> = table
            .cards
            .iter()
            .filter(|c| {
                c.expiration_date
                    .map(|d| d >= start && d <= end)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        cards.sort_by(|a, b| a.expiration_date.cmp(&b.expiration_date).then(a.id.cmp(&b.id)));
        Ok(cards)
    }

    async fn list_due_for_delivery(&self, date: NaiveDate) -> LedgerResult<Vec<GiftCard>> {
        let table = self.inner.lock().unwrap();
        Ok(table
            .cards
            .iter()
            .filter(|c| {
                c.delivery_date == date
                    && c.gift_card_type == crate::ledger::GiftCardType::Digital
            })
            .cloned()
            .collect())
    }

    async fn list_unassociated(&self) -> LedgerResult<Vec<GiftCard>> {
        let table = self.inner.lock().unwrap();
        Ok(table
            .cards
            .iter()
            .filter(|c| c.owner_user_id.is_none() && !c.recipient_email.is_empty())
            .cloned()
            .collect())
    }

    async fn list_unowned_by_email(&self, email: &str) -> LedgerResult<Vec<GiftCard>> {
        let table = self.inner.lock().unwrap();
        Ok(table
            .cards
            .iter()
            .filter(|c| c.owner_user_id.is_none() && c.recipient_email == email)
            .cloned()
            .collect())
    }

    async fn list_page(&self, offset: i64, limit: i64) -> LedgerResult<Vec<GiftCard>> {
        let table = self.inner.lock().unwrap();
        Ok(table
            .cards
            .iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count(&self) -> LedgerResult<i64> {
        let table = self.inner.lock().unwrap();
        Ok(table.cards.len() as i64)
    }
}

/// Wrapper that fails writes for selected codes, for partial-failure tests
pub struct FailingGiftCardRepository {
    inner: MemoryGiftCardRepository,
    failing_codes: Vec<String>,
}

impl FailingGiftCardRepository {
    fn check(&self, code: &str) -> LedgerResult<()> {
        if self.failing_codes.iter().any(|c| c == code) {
            return Err(LedgerError::Store(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}

#[async_trait]
impl GiftCardRepository for FailingGiftCardRepository {
    async fn insert(
        &self,
        code: &str,
        card: &NewGiftCard,
        owner_user_id: Option<i64>,
    ) -> LedgerResult<GiftCard> {
        self.check(code)?;
        self.inner.insert(code, card, owner_user_id).await
    }

    async fn insert_full(
        &self,
        code: &str,
        card: &NewGiftCard,
        issued_date: DateTime<Utc>,
        owner_user_id: Option<i64>,
    ) -> LedgerResult<GiftCard> {
        self.check(code)?;
        self.inner.insert_full(code, card, issued_date, owner_user_id).await
    }

    async fn code_exists(&self, code: &str) -> LedgerResult<bool> {
        self.inner.code_exists(code).await
    }

    async fn get_by_code(&self, code: &str) -> LedgerResult<Option<GiftCard>> {
        self.inner.get_by_code(code).await
    }

    async fn update_balance(&self, code: &str, new_balance: Decimal) -> LedgerResult<()> {
        self.check(code)?;
        self.inner.update_balance(code, new_balance).await
    }

    async fn update_details(
        &self,
        code: &str,
        update: &GiftCardUpdate,
        update_expiration: bool,
    ) -> LedgerResult<()> {
        self.check(code)?;
        self.inner.update_details(code, update, update_expiration).await
    }

    async fn deduct_balance(&self, code: &str, amount: Decimal) -> LedgerResult<Decimal> {
        self.check(code)?;
        self.inner.deduct_balance(code, amount).await
    }

    async fn set_owner(&self, code: &str, user_id: i64) -> LedgerResult<()> {
        self.check(code)?;
        self.inner.set_owner(code, user_id).await
    }

    async fn delete(&self, code: &str) -> LedgerResult<()> {
        self.check(code)?;
        self.inner.delete(code).await
    }

    async fn list_by_owner(&self, user_id: i64, active_only: bool) -> LedgerResult<Vec<GiftCard>> {
        self.inner.list_by_owner(user_id, active_only).await
    }

    async fn sum_active_balance(&self, user_id: i64) -> LedgerResult<Decimal> {
        self.inner.sum_active_balance(user_id).await
    }

    async fn list_expiring_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> LedgerResult<Vec<GiftCard>> {
        self.inner.list_expiring_between(start, end).await
    }

    async fn list_due_for_delivery(&self, date: NaiveDate) -> LedgerResult<Vec<GiftCard>> {
        self.inner.list_due_for_delivery(date).await
    }

    async fn list_unassociated(&self) -> LedgerResult<Vec<GiftCard>> {
        self.inner.list_unassociated().await
    }

    async fn list_unowned_by_email(&self, email: &str) -> LedgerResult<Vec<GiftCard>> {
        self.inner.list_unowned_by_email(email).await
    }

    async fn list_page(&self, offset: i64, limit: i64) -> LedgerResult<Vec<GiftCard>> {
        self.inner.list_page(offset, limit).await
    }

    async fn count(&self) -> LedgerResult<i64> {
        self.inner.count().await
    }
}

/// In-memory implementation of `ActivityRepository`
#[derive(Clone, Default)]
pub struct MemoryActivityRepository {
    inner: Arc<Mutex<ActivityTable>>,
}

#[derive(Default)]
struct ActivityTable {
    entries: Vec<ActivityEntry>,
    next_id: i64,
}

impl MemoryActivityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries in append order; test helper
    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.inner.lock().unwrap().entries.clone()
    }
}

#[async_trait]
impl ActivityRepository for MemoryActivityRepository {
    async fn append(
        &self,
        action: ActionType,
        code: Option<&str>,
        amount: Option<Decimal>,
        user_id: Option<i64>,
    ) -> LedgerResult<()> {
        let mut table = self.inner.lock().unwrap();
        table.next_id += 1;
        let id = table.next_id;
        table.entries.push(ActivityEntry {
            id,
            action_type: action,
            code: code.map(str::to_string),
            amount,
            user_id,
            action_date: Utc::now(),
        });
        Ok(())
    }

    async fn recent(&self, limit: i64) -> LedgerResult<Vec<ActivityEntry>> {
        let table = self.inner.lock().unwrap();
        Ok(table
            .entries
            .iter()
            .rev()
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

/// In-memory implementation of `OrderDiscountRepository`
#[derive(Clone, Default)]
pub struct MemoryOrderDiscountRepository {
    inner: Arc<Mutex<HashMap<i64, OrderDiscount>>>,
}

impl MemoryOrderDiscountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderDiscountRepository for MemoryOrderDiscountRepository {
    async fn insert_if_absent(
        &self,
        order_id: i64,
        user_id: i64,
        amount: Decimal,
    ) -> LedgerResult<bool> {
        let mut orders = self.inner.lock().unwrap();
        if orders.contains_key(&order_id) {
            return Ok(false);
        }
        orders.insert(
            order_id,
            OrderDiscount {
                order_id,
                user_id,
                amount,
                committed_at: Utc::now(),
            },
        );
        Ok(true)
    }

    async fn get(&self, order_id: i64) -> LedgerResult<Option<OrderDiscount>> {
        let orders = self.inner.lock().unwrap();
        Ok(orders.get(&order_id).cloned())
    }
}

/// In-memory implementation of `AccountDirectory`
#[derive(Clone, Default)]
pub struct MemoryAccountDirectory {
    inner: Arc<Mutex<HashMap<i64, String>>>,
}

impl MemoryAccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account; replaces any previous email for the id
    pub fn add_account(&self, user_id: i64, email: &str) {
        self.inner.lock().unwrap().insert(user_id, email.to_string());
    }
}

#[async_trait]
impl AccountDirectory for MemoryAccountDirectory {
    async fn user_id_for_email(&self, email: &str) -> LedgerResult<Option<i64>> {
        let accounts = self.inner.lock().unwrap();
        Ok(accounts
            .iter()
            .find(|(_, e)| e.as_str() == email)
            .map(|(id, _)| *id))
    }

    async fn email_for_user(&self, user_id: i64) -> LedgerResult<Option<String>> {
        let accounts = self.inner.lock().unwrap();
        Ok(accounts.get(&user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::GiftCardType;
    use rust_decimal_macros::dec;

    fn draft(balance: Decimal, recipient: &str) -> NewGiftCard {
        NewGiftCard {
            balance,
            expiration_date: None,
            sender_name: "Sender".to_string(),
            sender_email: "sender@example.com".to_string(),
            recipient_email: recipient.to_string(),
            message: String::new(),
            delivery_date: None,
            gift_card_type: GiftCardType::Digital,
        }
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_codes() {
        let repo = MemoryGiftCardRepository::new();
        repo.insert("AAAA111122", &draft(dec!(10.00), "a@example.com"), None)
            .await
            .expect("first insert should succeed");

        let result = repo
            .insert("AAAA111122", &draft(dec!(20.00), "b@example.com"), None)
            .await;
        assert!(matches!(result, Err(LedgerError::DuplicateCode(_))));
    }

    #[tokio::test]
    async fn deduct_clamps_at_zero() {
        let repo = MemoryGiftCardRepository::new();
        repo.insert("BBBB111122", &draft(dec!(30.00), "a@example.com"), Some(1))
            .await
            .expect("insert should succeed");

        let deducted = repo
            .deduct_balance("BBBB111122", dec!(45.00))
            .await
            .expect("deduct should succeed");
        assert_eq!(deducted, dec!(30.00));

        let card = repo
            .get_by_code("BBBB111122")
            .await
            .expect("lookup should succeed")
            .expect("card should exist");
        assert_eq!(card.balance, Decimal::ZERO);
    }

    #[tokio::test]
    async fn update_balance_replaces_the_stored_value() {
        let repo = MemoryGiftCardRepository::new();
        repo.insert("CCCC111122", &draft(dec!(30.00), "a@example.com"), None)
            .await
            .expect("insert should succeed");

        repo.update_balance("CCCC111122", dec!(12.50))
            .await
            .expect("update should succeed");
        let card = repo.get_by_code("CCCC111122").await.unwrap().unwrap();
        assert_eq!(card.balance, dec!(12.50));

        let missing = repo.update_balance("ZZZZ999900", dec!(1.00)).await;
        assert!(matches!(missing, Err(LedgerError::NotFound(_))));
    }

    #[tokio::test]
    async fn deduct_on_missing_card_deducts_nothing() {
        let repo = MemoryGiftCardRepository::new();
        let deducted = repo
            .deduct_balance("NOPE000000", dec!(5.00))
            .await
            .expect("deduct should succeed");
        assert_eq!(deducted, Decimal::ZERO);
    }

    #[tokio::test]
    async fn order_discount_insert_is_exactly_once() {
        let repo = MemoryOrderDiscountRepository::new();
        assert!(repo.insert_if_absent(7, 1, dec!(12.00)).await.unwrap());
        assert!(!repo.insert_if_absent(7, 1, dec!(12.00)).await.unwrap());

        let stored = repo.get(7).await.unwrap().expect("discount should exist");
        assert_eq!(stored.amount, dec!(12.00));
    }

    #[tokio::test]
    async fn account_directory_round_trips() {
        let accounts = MemoryAccountDirectory::new();
        accounts.add_account(42, "grace@example.com");

        assert_eq!(
            accounts.user_id_for_email("grace@example.com").await.unwrap(),
            Some(42)
        );
        assert_eq!(
            accounts.email_for_user(42).await.unwrap(),
            Some("grace@example.com".to_string())
        );
        assert_eq!(accounts.user_id_for_email("x@example.com").await.unwrap(), None);
    }
}
