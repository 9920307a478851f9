//! Activity log data models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ledger action recorded in the activity trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Created,
    Used,
    BalanceAdjusted,
    ExpirationUpdated,
    Deleted,
    ExpirationReminderSent,
    AssociatedWithUser,
    ImportCsv,
    ExportCsv,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Created => write!(f, "created"),
            ActionType::Used => write!(f, "used"),
            ActionType::BalanceAdjusted => write!(f, "balance_adjusted"),
            ActionType::ExpirationUpdated => write!(f, "expiration_updated"),
            ActionType::Deleted => write!(f, "deleted"),
            ActionType::ExpirationReminderSent => write!(f, "expiration_reminder_sent"),
            ActionType::AssociatedWithUser => write!(f, "associated_with_user"),
            ActionType::ImportCsv => write!(f, "import_csv"),
            ActionType::ExportCsv => write!(f, "export_csv"),
        }
    }
}

impl std::str::FromStr for ActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(ActionType::Created),
            "used" => Ok(ActionType::Used),
            "balance_adjusted" => Ok(ActionType::BalanceAdjusted),
            "expiration_updated" => Ok(ActionType::ExpirationUpdated),
            "deleted" => Ok(ActionType::Deleted),
            "expiration_reminder_sent" => Ok(ActionType::ExpirationReminderSent),
            "associated_with_user" => Ok(ActionType::AssociatedWithUser),
            "import_csv" => Ok(ActionType::ImportCsv),
            "export_csv" => Ok(ActionType::ExportCsv),
            other => Err(format!("unknown action type: {other}")),
        }
    }
}

/// One append-only activity entry
///
/// `code` is absent for bulk operations; `amount` carries the value moved
/// (or the row count for imports/exports).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: i64,
    pub action_type: ActionType,
    pub code: Option<String>,
    pub amount: Option<Decimal>,
    pub user_id: Option<i64>,
    pub action_date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_type_strings_match_stored_values() {
        assert_eq!(ActionType::AssociatedWithUser.to_string(), "associated_with_user");
        assert_eq!(
            "expiration_reminder_sent".parse::<ActionType>().ok(),
            Some(ActionType::ExpirationReminderSent)
        );
        assert!("unknown".parse::<ActionType>().is_err());
    }
}
