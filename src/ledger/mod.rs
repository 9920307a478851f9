//! Ledger module providing gift card issuance and lifecycle management.
//!
//! This module implements:
//! - Collision-free redemption code generation with a bounded retry loop
//! - Gift card issuance with owner resolution by recipient email
//! - Admin edits with conditional expiration logging
//! - Card deletion
//!
//! Balances only decrease after issuance; deduction lives in
//! [`crate::redemption`].
//!
//! ## Example
//!
//! ```no_run
//! use gift_card_ledger::config::Settings;
//! use gift_card_ledger::activity::ActivityLogger;
//! use gift_card_ledger::db::memory::{
//!     MemoryAccountDirectory, MemoryActivityRepository, MemoryGiftCardRepository,
//! };
//! use gift_card_ledger::ledger::{GiftCardType, LedgerManager, NewGiftCard};
//! use gift_card_ledger::notify::NullDispatcher;
//! use rust_decimal::Decimal;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::default();
//!     let activity = ActivityLogger::new(Arc::new(MemoryActivityRepository::new()), &settings);
//!     let manager = LedgerManager::new(
//!         Arc::new(MemoryGiftCardRepository::new()),
//!         Arc::new(MemoryAccountDirectory::new()),
//!         activity,
//!         Arc::new(NullDispatcher),
//!         settings,
//!     );
//!
//!     let card = manager
//!         .issue(NewGiftCard {
//!             balance: Decimal::new(2500, 2),
//!             expiration_date: None,
//!             sender_name: "Ada".to_string(),
//!             sender_email: "ada@example.com".to_string(),
//!             recipient_email: "grace@example.com".to_string(),
//!             message: "Happy birthday".to_string(),
//!             delivery_date: None,
//!             gift_card_type: GiftCardType::Digital,
//!         })
//!         .await?;
//!     println!("Issued {}", card.code);
//!     Ok(())
//! }
//! ```

pub mod codes;
pub mod errors;
pub mod manager;
pub mod models;

pub use codes::{CODE_LENGTH, CodeGenerator, MAX_ATTEMPTS};
pub use errors::{LedgerError, LedgerResult};
pub use manager::LedgerManager;
pub use models::{GiftCard, GiftCardSnapshot, GiftCardType, GiftCardUpdate, NewGiftCard};
