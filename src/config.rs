//! Runtime settings for the gift card engine.
//!
//! Settings are an explicit value passed into constructors rather than
//! ambient global state, so hosts and tests can inject their own without
//! touching process-wide configuration.

use std::env;

/// Engine settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Whether ledger mutations are recorded in the activity log
    pub logging_enabled: bool,

    /// How many days before expiration a reminder is dispatched
    pub reminder_days_before_expiry: i64,

    /// Default validity period applied at issuance when a card has no
    /// explicit expiration date; `None` means cards never expire by default
    pub default_validity_days: Option<i64>,
}

impl Settings {
    /// Create settings from environment variables
    ///
    /// Expected environment variables:
    /// - `GIFT_CARD_ENABLE_LOGGING`: "true" or "false" (default: true)
    /// - `GIFT_CARD_REMINDER_DAYS`: reminder window in days (default: 7)
    /// - `GIFT_CARD_VALIDITY_DAYS`: default validity in days (unset: no expiry)
    ///
    /// # Returns
    ///
    /// * `Settings` - Configuration from environment
    pub fn from_env() -> Self {
        Self {
            logging_enabled: env::var("GIFT_CARD_ENABLE_LOGGING")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            reminder_days_before_expiry: env::var("GIFT_CARD_REMINDER_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(7),
            default_validity_days: env::var("GIFT_CARD_VALIDITY_DAYS")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            logging_enabled: true,
            reminder_days_before_expiry: 7,
            default_validity_days: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_logging() {
        let settings = Settings::default();
        assert!(settings.logging_enabled);
        assert_eq!(settings.reminder_days_before_expiry, 7);
        assert!(settings.default_validity_days.is_none());
    }
}
