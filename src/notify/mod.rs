//! Notification module: the dispatcher seam and scheduled scans.
//!
//! The engine never renders or sends anything itself. It emits read-only
//! [`crate::ledger::GiftCardSnapshot`] values through the
//! [`NotificationDispatcher`] trait the host registers at startup, and the
//! [`ReminderService`] drives the daily delivery/expiry scans.

pub mod dispatcher;
pub mod reminders;

pub use dispatcher::{
    NotificationDispatcher, NotificationError, NullDispatcher, RecordingDispatcher,
};
pub use reminders::{DispatchReport, ReminderService};
