//! Activity log module providing the append-only audit trail.
//!
//! Every ledger-mutating operation records an entry here when logging is
//! enabled. Writes are best-effort: the ledger mutation is the source of
//! truth and commits independently of audit outcomes.

pub mod logger;
pub mod models;

pub use logger::ActivityLogger;
pub use models::{ActionType, ActivityEntry};
