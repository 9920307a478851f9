//! PostgreSQL repository implementations.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use super::repository::{ActivityRepository, GiftCardRepository, OrderDiscountRepository};
use crate::activity::{ActionType, ActivityEntry};
use crate::ledger::{GiftCard, GiftCardType, GiftCardUpdate, LedgerError, LedgerResult, NewGiftCard};
use crate::redemption::OrderDiscount;

/// PostgreSQL implementation of `GiftCardRepository`
#[derive(Clone)]
pub struct PgGiftCardRepository {
    pool: PgPool,
}

impl PgGiftCardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn card_from_row(row: &PgRow) -> GiftCard {
    let issued_date = row.get::<chrono::NaiveDateTime, _>("issued_date").and_utc();
    GiftCard {
        id: row.get("id"),
        code: row.get("code"),
        balance: row.get("balance"),
        expiration_date: row.get("expiration_date"),
        sender_name: row.get::<Option<String>, _>("sender_name").unwrap_or_default(),
        sender_email: row.get::<Option<String>, _>("sender_email").unwrap_or_default(),
        recipient_email: row
            .get::<Option<String>, _>("recipient_email")
            .unwrap_or_default(),
        message: row.get::<Option<String>, _>("message").unwrap_or_default(),
        issued_date,
        delivery_date: row
            .get::<Option<NaiveDate>, _>("delivery_date")
            .unwrap_or_else(|| issued_date.date_naive()),
        gift_card_type: row
            .get::<Option<String>, _>("gift_card_type")
            .as_deref()
            .unwrap_or("digital")
            .parse()
            .unwrap_or(GiftCardType::Digital),
        owner_user_id: row.get("user_id"),
    }
}

fn map_insert_error(e: sqlx::Error, code: &str) -> LedgerError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return LedgerError::DuplicateCode(code.to_string());
        }
    }
    LedgerError::Store(e)
}

const CARD_COLUMNS: &str = "id, code, balance, expiration_date, sender_name, sender_email, \
                            recipient_email, message, issued_date, delivery_date, \
                            gift_card_type, user_id";

#[async_trait]
impl GiftCardRepository for PgGiftCardRepository {
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
        let delivery_date = card.delivery_date.unwrap_or_else(|| issued_date.date_naive());
        let row = sqlx::query(&format!(
            "INSERT INTO gift_cards \
             (code, balance, expiration_date, sender_name, sender_email, recipient_email, \
              message, issued_date, delivery_date, gift_card_type, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {CARD_COLUMNS}"
        ))
        .bind(code)
        .bind(card.balance)
        .bind(card.expiration_date)
        .bind(&card.sender_name)
        .bind(&card.sender_email)
        .bind(&card.recipient_email)
        .bind(&card.message)
        .bind(issued_date.naive_utc())
        .bind(delivery_date)
        .bind(card.gift_card_type.to_string())
        .bind(owner_user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, code))?;

        Ok(card_from_row(&row))
    }

    async fn code_exists(&self, code: &str) -> LedgerResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM gift_cards WHERE code = $1")
            .bind(code)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    async fn get_by_code(&self, code: &str) -> LedgerResult<Option<GiftCard>> {
        let row = sqlx::query(&format!(
            "SELECT {CARD_COLUMNS} FROM gift_cards WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| card_from_row(&r)))
    }

    async fn update_balance(&self, code: &str, new_balance: Decimal) -> LedgerResult<()> {
        let result = sqlx::query("UPDATE gift_cards SET balance = $1 WHERE code = $2")
            .bind(new_balance)
            .bind(code)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::NotFound(code.to_string()));
        }
        Ok(())
    }

    async fn update_details(
        &self,
        code: &str,
        update: &GiftCardUpdate,
        update_expiration: bool,
    ) -> LedgerResult<()> {
        let result = if update_expiration {
            sqlx::query(
                "UPDATE gift_cards \
                 SET balance = $1, recipient_email = $2, sender_name = $3, message = $4, \
                     expiration_date = $5 \
                 WHERE code = $6",
            )
            .bind(update.balance)
            .bind(&update.recipient_email)
            .bind(&update.sender_name)
            .bind(&update.message)
            .bind(update.expiration_date)
            .bind(code)
            .execute(&self.pool)
            .await?
        } else {
            sqlx::query(
                "UPDATE gift_cards \
                 SET balance = $1, recipient_email = $2, sender_name = $3, message = $4 \
                 WHERE code = $5",
            )
            .bind(update.balance)
            .bind(&update.recipient_email)
            .bind(&update.sender_name)
            .bind(&update.message)
            .bind(code)
            .execute(&self.pool)
            .await?
        };

        if result.rows_affected() == 0 {
            return Err(LedgerError::NotFound(code.to_string()));
        }
        Ok(())
    }

    async fn deduct_balance(&self, code: &str, amount: Decimal) -> LedgerResult<Decimal> {
        if amount <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }

        // Single statement under a row lock; the floor at zero and the
        // deducted amount come from the same write, so concurrent
        // deductions on one code cannot lose updates.
        let row = sqlx::query(
            "WITH prev AS ( \
                 SELECT id, balance FROM gift_cards WHERE code = $1 FOR UPDATE \
             ) \
             UPDATE gift_cards g \
             SET balance = GREATEST(g.balance - $2, 0) \
             FROM prev \
             WHERE g.id = prev.id \
             RETURNING prev.balance - g.balance AS deducted",
        )
        .bind(code)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row
            .map(|r| r.get::<Decimal, _>("deducted"))
            .unwrap_or(Decimal::ZERO))
    }

    async fn set_owner(&self, code: &str, user_id: i64) -> LedgerResult<()> {
        let result = sqlx::query("UPDATE gift_cards SET user_id = $1 WHERE code = $2")
            .bind(user_id)
            .bind(code)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::NotFound(code.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, code: &str) -> LedgerResult<()> {
        let result = sqlx::query("DELETE FROM gift_cards WHERE code = $1")
            .bind(code)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::NotFound(code.to_string()));
        }
        Ok(())
    }

    async fn list_by_owner(&self, user_id: i64, active_only: bool) -> LedgerResult<Vec<GiftCard>> {
        let query = if active_only {
            format!(
                "SELECT {CARD_COLUMNS} FROM gift_cards \
                 WHERE user_id = $1 AND balance > 0 \
                 ORDER BY issued_date ASC, id ASC"
            )
        } else {
            format!(
                "SELECT {CARD_COLUMNS} FROM gift_cards \
                 WHERE user_id = $1 \
                 ORDER BY issued_date ASC, id ASC"
            )
        };

        let rows = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(card_from_row).collect())
    }

    async fn sum_active_balance(&self, user_id: i64) -> LedgerResult<Decimal> {
        let total: Option<Decimal> = sqlx::query_scalar(
            "SELECT SUM(balance) FROM gift_cards WHERE user_id = $1 AND balance > 0",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(Decimal::ZERO))
    }

    async fn list_expiring_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> LedgerResult<Vec<GiftCard>> {
        let rows = sqlx::query(&format!(
            "SELECT {CARD_COLUMNS} FROM gift_cards \
             WHERE expiration_date IS NOT NULL AND expiration_date BETWEEN $1 AND $2 \
             ORDER BY expiration_date ASC, id ASC"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(card_from_row).collect())
    }

    async fn list_due_for_delivery(&self, date: NaiveDate) -> LedgerResult<Vec<GiftCard>> {
        let rows = sqlx::query(&format!(
            "SELECT {CARD_COLUMNS} FROM gift_cards \
             WHERE delivery_date = $1 AND gift_card_type = $2 \
             ORDER BY id ASC"
        ))
        .bind(date)
        .bind(GiftCardType::Digital.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(card_from_row).collect())
    }

    async fn list_unassociated(&self) -> LedgerResult<Vec<GiftCard>> {
        let rows = sqlx::query(&format!(
            "SELECT {CARD_COLUMNS} FROM gift_cards \
             WHERE user_id IS NULL AND recipient_email IS NOT NULL AND recipient_email <> '' \
             ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(card_from_row).collect())
    }

    async fn list_unowned_by_email(&self, email: &str) -> LedgerResult<Vec<GiftCard>> {
        let rows = sqlx::query(&format!(
            "SELECT {CARD_COLUMNS} FROM gift_cards \
             WHERE user_id IS NULL AND recipient_email = $1 \
             ORDER BY id ASC"
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(card_from_row).collect())
    }

    async fn list_page(&self, offset: i64, limit: i64) -> LedgerResult<Vec<GiftCard>> {
        let rows = sqlx::query(&format!(
            "SELECT {CARD_COLUMNS} FROM gift_cards ORDER BY id ASC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(card_from_row).collect())
    }

    async fn count(&self) -> LedgerResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM gift_cards")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// PostgreSQL implementation of `ActivityRepository`
#[derive(Clone)]
pub struct PgActivityRepository {
    pool: PgPool,
}

impl PgActivityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityRepository for PgActivityRepository {
    async fn append(
        &self,
        action: ActionType,
        code: Option<&str>,
        amount: Option<Decimal>,
        user_id: Option<i64>,
    ) -> LedgerResult<()> {
        sqlx::query(
            "INSERT INTO gift_card_activities (action_type, code, amount, user_id, action_date) \
             VALUES ($1, $2, $3, $4, NOW())",
        )
        .bind(action.to_string())
        .bind(code)
        .bind(amount)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn recent(&self, limit: i64) -> LedgerResult<Vec<ActivityEntry>> {
        let rows = sqlx::query(
            "SELECT id, action_type, code, amount, user_id, action_date \
             FROM gift_card_activities \
             ORDER BY action_date DESC, id DESC \
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let entries = rows
            .into_iter()
            .map(|row| ActivityEntry {
                id: row.get("id"),
                action_type: row
                    .get::<String, _>("action_type")
                    .parse()
                    .unwrap_or(ActionType::Created),
                code: row.get("code"),
                amount: row.get("amount"),
                user_id: row.get("user_id"),
                action_date: row.get::<chrono::NaiveDateTime, _>("action_date").and_utc(),
            })
            .collect();

        Ok(entries)
    }
}

/// PostgreSQL implementation of `OrderDiscountRepository`
#[derive(Clone)]
pub struct PgOrderDiscountRepository {
    pool: PgPool,
}

impl PgOrderDiscountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderDiscountRepository for PgOrderDiscountRepository {
    async fn insert_if_absent(
        &self,
        order_id: i64,
        user_id: i64,
        amount: Decimal,
    ) -> LedgerResult<bool> {
        let result = sqlx::query(
            "INSERT INTO gift_card_order_discounts (order_id, user_id, amount, committed_at) \
             VALUES ($1, $2, $3, NOW()) \
             ON CONFLICT (order_id) DO NOTHING",
        )
        .bind(order_id)
        .bind(user_id)
        .bind(amount)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn get(&self, order_id: i64) -> LedgerResult<Option<OrderDiscount>> {
        let row = sqlx::query(
            "SELECT order_id, user_id, amount, committed_at \
             FROM gift_card_order_discounts \
             WHERE order_id = $1",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| OrderDiscount {
            order_id: r.get("order_id"),
            user_id: r.get("user_id"),
            amount: r.get("amount"),
            committed_at: r.get::<chrono::NaiveDateTime, _>("committed_at").and_utc(),
        }))
    }
}
