//! Scheduled delivery and expiry-reminder scans.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::dispatcher::NotificationDispatcher;
use crate::activity::{ActionType, ActivityLogger};
use crate::config::Settings;
use crate::db::repository::GiftCardRepository;
use crate::ledger::LedgerResult;

/// Outcome of one dispatch scan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub sent: usize,
    pub failed: usize,
}

/// Scheduled notification scans
///
/// Driven externally (a cron tick or job runner); each method is one
/// stateless pass over the ledger. Dispatcher failures are counted and
/// logged, never propagated; a broken mail path must not take the scan
/// down with it.
#[derive(Clone)]
pub struct ReminderService {
    cards: Arc<dyn GiftCardRepository>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    activity: ActivityLogger,
    reminder_days: i64,
}

impl ReminderService {
    /// Create a new reminder service
    ///
    /// # Arguments
    ///
    /// * `cards` - Gift card storage
    /// * `dispatcher` - Notification sink registered by the host
    /// * `activity` - Activity logger
    /// * `settings` - Engine settings; sets the reminder window
    pub fn new(
        cards: Arc<dyn GiftCardRepository>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        activity: ActivityLogger,
        settings: &Settings,
    ) -> Self {
        Self {
            cards,
            dispatcher,
            activity,
            reminder_days: settings.reminder_days_before_expiry,
        }
    }

    /// Dispatch issuance notifications for digital cards due today
    pub async fn send_due_deliveries(&self, today: NaiveDate) -> LedgerResult<DispatchReport> {
        let due = self.cards.list_due_for_delivery(today).await?;

        let mut report = DispatchReport::default();
        for card in due {
            match self.dispatcher.on_issued(&card.snapshot()).await {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    log::warn!("Delivery notification for {} failed: {e}", card.code);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Dispatch reminders for cards expiring within the configured window
    ///
    /// Each card in `[today, today + reminder_days]` gets one
    /// `expiration_reminder_sent` entry and one dispatcher call.
    pub async fn send_expiry_reminders(&self, today: NaiveDate) -> LedgerResult<DispatchReport> {
        let end = today + Duration::days(self.reminder_days);
        let expiring = self.cards.list_expiring_between(today, end).await?;

        let mut report = DispatchReport::default();
        for card in expiring {
            self.activity
                .record(
                    ActionType::ExpirationReminderSent,
                    Some(&card.code),
                    None,
                    card.owner_user_id,
                )
                .await;
            match self.dispatcher.on_expiring_soon(&card.snapshot()).await {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    log::warn!("Expiry reminder for {} failed: {e}", card.code);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}
