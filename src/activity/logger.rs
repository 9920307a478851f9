//! Activity logger implementation.

use rust_decimal::Decimal;
use std::sync::Arc;

use super::models::ActionType;
use crate::config::Settings;
use crate::db::repository::ActivityRepository;

/// Best-effort, append-only activity logger
///
/// Recording is fire-and-forget: a failed write is reported through the log
/// facade and swallowed, so audit problems never block or roll back the
/// ledger mutation that triggered them.
#[derive(Clone)]
pub struct ActivityLogger {
    repo: Arc<dyn ActivityRepository>,
    enabled: bool,
}

impl ActivityLogger {
    /// Create a new activity logger
    ///
    /// # Arguments
    ///
    /// * `repo` - Activity log storage
    /// * `settings` - Engine settings; `logging_enabled` turns recording off
    pub fn new(repo: Arc<dyn ActivityRepository>, settings: &Settings) -> Self {
        Self {
            repo,
            enabled: settings.logging_enabled,
        }
    }

    /// Whether recording is switched on
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record one activity entry; no-op when logging is disabled
    pub async fn record(
        &self,
        action: ActionType,
        code: Option<&str>,
        amount: Option<Decimal>,
        user_id: Option<i64>,
    ) {
        if !self.enabled {
            return;
        }

        if let Err(e) = self.repo.append(action, code, amount, user_id).await {
            log::warn!("Failed to record {action} activity for {code:?}: {e}");
        }
    }
}
