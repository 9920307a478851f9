//! # Gift Card Ledger
//!
//! A gift card ledger and redemption engine for e-commerce checkouts.
//!
//! This library issues uniquely coded, balance-bearing gift cards, applies
//! them as checkout discounts, consumes balances oldest-card-first on order
//! completion, and keeps an append-only audit trail of every mutation. The
//! surrounding storefront (forms, admin screens, email rendering) stays on
//! the host side, wired in through small trait seams.
//!
//! ## Architecture
//!
//! Redemption runs through a small per-session state machine:
//!
//! - **NoGiftCard**: nothing held for the session
//! - **BalanceQueried**: eligible balance projected, nothing reserved
//! - **DiscountHeld**: discount parked in transient session state
//! - **DiscountCommitted**: order completed, balances consumed (terminal)
//! - **DiscountAbandoned**: session died, nothing to undo (terminal)
//!
//! The eligible-balance projection is deliberately not a reservation;
//! balances that move between query and commit surface as an absorbed
//! shortfall on the completed order.
//!
//! ## Core Modules
//!
//! - [`ledger`]: card models, code generation, issuance and admin edits
//! - [`redemption`]: discount computation, exactly-once commit, FIFO deduction
//! - [`activity`]: append-only audit trail
//! - [`association`]: linking ownerless cards to accounts by recipient email
//! - [`notify`]: dispatcher seam and scheduled delivery/expiry scans
//! - [`bulk`]: CSV import/export, whole-table and batched
//! - [`db`]: connection pool, schema bootstrap, repository traits
//!
//! ## Example
//!
//! ```
//! use gift_card_ledger::redemption::RedemptionEngine;
//! use rust_decimal::Decimal;
//!
//! // A 60.00 cart, 100.00 of cards, everything requested: the cart caps it.
//! let discount = RedemptionEngine::compute_discount(
//!     Decimal::new(10000, 2),
//!     Decimal::new(10000, 2),
//!     Decimal::new(6000, 2),
//! );
//! assert_eq!(discount, Decimal::new(6000, 2));
//! ```

/// Append-only audit trail of ledger-affecting actions.
pub mod activity;
pub use activity::{ActionType, ActivityEntry, ActivityLogger};

/// Owner association for cards issued before the recipient registered.
pub mod association;
pub use association::{AssociationResolver, ConsolidationReport};

/// CSV import and export.
pub mod bulk;
pub use bulk::{BatchImport, BatchStatus, CsvExporter, CsvImporter, ImportReport};

/// Engine settings.
pub mod config;
pub use config::Settings;

/// Connection pooling, schema bootstrap, and repository traits.
pub mod db;
pub use db::{Database, DatabaseConfig};

/// Gift card issuance and lifecycle management.
pub mod ledger;
pub use ledger::{
    GiftCard, GiftCardSnapshot, GiftCardType, GiftCardUpdate, LedgerError, LedgerManager,
    LedgerResult, NewGiftCard,
};

/// Notification dispatch seam and scheduled scans.
pub mod notify;
pub use notify::{NotificationDispatcher, NotificationError, NullDispatcher, ReminderService};

/// Checkout discounts and FIFO balance consumption.
pub mod redemption;
pub use redemption::{CommitOutcome, DeductionOutcome, RedemptionEngine, RedemptionError};
