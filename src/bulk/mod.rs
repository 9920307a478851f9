//! Bulk CSV import and export.
//!
//! Both directions exist in two forms: a whole-table pass and a batched
//! form driven by a client-supplied offset, so large ledgers can move in
//! resumable chunks. Batches of one job are idempotent-safe to retry but
//! must run sequentially; there is no job-level lock.

pub mod errors;
pub mod export;
pub mod import;

pub use errors::{BulkError, BulkResult};
pub use export::{BatchStatus, CsvExporter};
pub use import::{BatchImport, CsvImporter, ImportReport, RowError};

/// Column order shared by export and import
pub const CSV_HEADERS: [&str; 11] = [
    "code",
    "balance",
    "expiration_date",
    "sender_name",
    "sender_email",
    "recipient_email",
    "message",
    "issued_date",
    "delivery_date",
    "gift_card_type",
    "user_id",
];
