//! Database module providing PostgreSQL connection pooling and utilities.
//!
//! This module manages the database connection pool using sqlx, bootstraps
//! the gift card schema, and defines the repository traits the engine is
//! written against. PostgreSQL implementations live in [`postgres`];
//! in-memory implementations for tests and embedding hosts in [`memory`].

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

pub mod config;
pub mod memory;
pub mod postgres;
pub mod repository;

pub use config::DatabaseConfig;
pub use postgres::{PgActivityRepository, PgGiftCardRepository, PgOrderDiscountRepository};
pub use repository::{
    AccountDirectory, ActivityRepository, GiftCardRepository, OrderDiscountRepository,
};

/// Database connection pool wrapper
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    ///
    /// # Arguments
    ///
    /// * `config` - Database configuration
    ///
    /// # Returns
    ///
    /// * `Result<Database, sqlx::Error>` - Database instance or error
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gift_card_ledger::db::{Database, DatabaseConfig};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), sqlx::Error> {
    ///     let config = DatabaseConfig::from_env();
    ///     let db = Database::new(&config).await?;
    ///     db.ensure_schema().await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the gift card tables if they do not exist
    ///
    /// The unique constraint on `gift_cards.code` is load-bearing: it closes
    /// the race left open by the generator's check-then-insert. The primary
    /// key on `gift_card_order_discounts.order_id` is what makes order
    /// commits exactly-once.
    ///
    /// # Returns
    ///
    /// * `Result<(), sqlx::Error>` - Ok when the schema is in place
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS gift_cards ( \
                 id BIGSERIAL PRIMARY KEY, \
                 code VARCHAR(255) NOT NULL UNIQUE, \
                 balance NUMERIC(10, 2) NOT NULL DEFAULT 0.00, \
                 expiration_date DATE NULL, \
                 sender_name VARCHAR(100) NULL, \
                 sender_email VARCHAR(100) NULL, \
                 recipient_email VARCHAR(100) NULL, \
                 message TEXT NULL, \
                 issued_date TIMESTAMP NOT NULL DEFAULT NOW(), \
                 delivery_date DATE NULL, \
                 gift_card_type VARCHAR(50) NULL, \
                 user_id BIGINT NULL \
             )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS gift_card_activities ( \
                 id BIGSERIAL PRIMARY KEY, \
                 action_type VARCHAR(20) NOT NULL, \
                 code VARCHAR(255) NULL, \
                 amount NUMERIC(10, 2) NULL, \
                 user_id BIGINT NULL, \
                 action_date TIMESTAMP NOT NULL DEFAULT NOW() \
             )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS gift_card_order_discounts ( \
                 order_id BIGINT PRIMARY KEY, \
                 user_id BIGINT NOT NULL, \
                 amount NUMERIC(10, 2) NOT NULL, \
                 committed_at TIMESTAMP NOT NULL DEFAULT NOW() \
             )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Check if the database connection is healthy
    ///
    /// # Returns
    ///
    /// * `Result<(), sqlx::Error>` - Ok if healthy, error otherwise
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close the database connection pool
    pub async fn close(self) {
        self.pool.close().await;
    }
}
