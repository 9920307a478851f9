//! Gift card data models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::errors::{LedgerError, LedgerResult};

/// Gift card delivery medium
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GiftCardType {
    Digital,
    Physical,
}

impl std::fmt::Display for GiftCardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GiftCardType::Digital => write!(f, "digital"),
            GiftCardType::Physical => write!(f, "physical"),
        }
    }
}

impl std::str::FromStr for GiftCardType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "digital" => Ok(GiftCardType::Digital),
            "physical" => Ok(GiftCardType::Physical),
            other => Err(LedgerError::Validation(format!(
                "unknown gift card type: {other}"
            ))),
        }
    }
}

/// A stored gift card
///
/// `code` and `issued_date` are immutable once issued. `balance` only
/// decreases after issuance; redemption clamps deductions to the available
/// amount so it never goes negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiftCard {
    pub id: i64,
    pub code: String,
    pub balance: Decimal,
    pub expiration_date: Option<NaiveDate>,
    pub sender_name: String,
    pub sender_email: String,
    pub recipient_email: String,
    pub message: String,
    pub issued_date: DateTime<Utc>,
    pub delivery_date: NaiveDate,
    pub gift_card_type: GiftCardType,
    pub owner_user_id: Option<i64>,
}

impl GiftCard {
    /// A card is active while it still carries balance. Expiration does not
    /// deactivate a card; it only gates reminder dispatch.
    pub fn is_active(&self) -> bool {
        self.balance > Decimal::ZERO
    }

    /// Read-only snapshot handed to notification dispatchers
    pub fn snapshot(&self) -> GiftCardSnapshot {
        GiftCardSnapshot {
            code: self.code.clone(),
            balance: self.balance,
            sender_name: self.sender_name.clone(),
            sender_email: self.sender_email.clone(),
            recipient_email: self.recipient_email.clone(),
            message: self.message.clone(),
            gift_card_type: self.gift_card_type,
            delivery_date: self.delivery_date,
            expiration_date: self.expiration_date,
        }
    }
}

/// Read-only gift card view shared with notification dispatchers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiftCardSnapshot {
    pub code: String,
    pub balance: Decimal,
    pub sender_name: String,
    pub sender_email: String,
    pub recipient_email: String,
    pub message: String,
    pub gift_card_type: GiftCardType,
    pub delivery_date: NaiveDate,
    pub expiration_date: Option<NaiveDate>,
}

/// Issuance draft for a new gift card
///
/// The code and issuance timestamp are assigned by the ledger; the delivery
/// date defaults to the issuance day when not provided.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGiftCard {
    pub balance: Decimal,
    pub expiration_date: Option<NaiveDate>,
    pub sender_name: String,
    pub sender_email: String,
    pub recipient_email: String,
    pub message: String,
    pub delivery_date: Option<NaiveDate>,
    pub gift_card_type: GiftCardType,
}

impl NewGiftCard {
    /// Validate the draft before any store write
    ///
    /// # Errors
    ///
    /// * `LedgerError::Validation` - Non-positive balance or bad recipient email
    pub fn validate(&self) -> LedgerResult<()> {
        if self.balance <= Decimal::ZERO {
            return Err(LedgerError::Validation(
                "balance must be greater than zero".to_string(),
            ));
        }
        if !looks_like_email(&self.recipient_email) {
            return Err(LedgerError::Validation(format!(
                "invalid recipient email: {}",
                self.recipient_email
            )));
        }
        Ok(())
    }
}

/// Admin edit of an existing gift card
///
/// All descriptive fields are replaced; the expiration date is persisted only
/// when it differs from the stored value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiftCardUpdate {
    pub balance: Decimal,
    pub recipient_email: String,
    pub sender_name: String,
    pub message: String,
    pub expiration_date: Option<NaiveDate>,
}

impl GiftCardUpdate {
    /// # Errors
    ///
    /// * `LedgerError::Validation` - Negative balance or bad recipient email
    pub fn validate(&self) -> LedgerResult<()> {
        if self.balance < Decimal::ZERO {
            return Err(LedgerError::Validation(
                "balance cannot be negative".to_string(),
            ));
        }
        if !self.recipient_email.is_empty() && !looks_like_email(&self.recipient_email) {
            return Err(LedgerError::Validation(format!(
                "invalid recipient email: {}",
                self.recipient_email
            )));
        }
        Ok(())
    }
}

fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn draft() -> NewGiftCard {
        NewGiftCard {
            balance: dec!(25.00),
            expiration_date: None,
            sender_name: "Ada".to_string(),
            sender_email: "ada@example.com".to_string(),
            recipient_email: "grace@example.com".to_string(),
            message: "Happy birthday".to_string(),
            delivery_date: None,
            gift_card_type: GiftCardType::Digital,
        }
    }

    #[test]
    fn draft_with_positive_balance_validates() {
        assert!(draft().validate().is_ok());
    }

    #[test]
    fn draft_rejects_zero_balance() {
        let mut d = draft();
        d.balance = Decimal::ZERO;
        assert!(matches!(d.validate(), Err(LedgerError::Validation(_))));
    }

    #[test]
    fn draft_rejects_bad_email() {
        let mut d = draft();
        d.recipient_email = "not-an-email".to_string();
        assert!(matches!(d.validate(), Err(LedgerError::Validation(_))));
    }

    #[test]
    fn update_allows_zero_balance_but_not_negative() {
        let mut update = GiftCardUpdate {
            balance: Decimal::ZERO,
            recipient_email: String::new(),
            sender_name: String::new(),
            message: String::new(),
            expiration_date: None,
        };
        assert!(update.validate().is_ok());

        update.balance = dec!(-0.01);
        assert!(update.validate().is_err());
    }

    #[test]
    fn card_type_round_trips_through_strings() {
        assert_eq!(GiftCardType::Digital.to_string(), "digital");
        assert_eq!("physical".parse::<GiftCardType>().ok(), Some(GiftCardType::Physical));
        assert!("plastic".parse::<GiftCardType>().is_err());
    }

    #[test]
    fn expired_card_with_balance_is_still_active() {
        let card = GiftCard {
            id: 1,
            code: "ABCDEFGH12".to_string(),
            balance: dec!(10.00),
            expiration_date: Some(NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid date")),
            sender_name: String::new(),
            sender_email: String::new(),
            recipient_email: String::new(),
            message: String::new(),
            issued_date: Utc::now(),
            delivery_date: NaiveDate::from_ymd_opt(2019, 12, 1).expect("valid date"),
            gift_card_type: GiftCardType::Digital,
            owner_user_id: None,
        };
        assert!(card.is_active());
    }
}
