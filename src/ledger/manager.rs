//! Ledger manager implementation: issuance, edits, deletion.

use chrono::{Duration, Utc};
use std::sync::Arc;

use super::codes::CodeGenerator;
use super::errors::{LedgerError, LedgerResult};
use super::models::{GiftCard, GiftCardType, GiftCardUpdate, NewGiftCard};
use crate::activity::{ActionType, ActivityLogger};
use crate::config::Settings;
use crate::db::repository::{AccountDirectory, GiftCardRepository};
use crate::notify::NotificationDispatcher;

/// Ledger manager
///
/// Owns the card issuance path and the admin edit/delete surface. Callers
/// are expected to have performed their own permission checks; none happen
/// here.
#[derive(Clone)]
pub struct LedgerManager {
    cards: Arc<dyn GiftCardRepository>,
    accounts: Arc<dyn AccountDirectory>,
    activity: ActivityLogger,
    dispatcher: Arc<dyn NotificationDispatcher>,
    settings: Settings,
}

impl LedgerManager {
    /// Create a new ledger manager
    ///
    /// # Arguments
    ///
    /// * `cards` - Gift card storage
    /// * `accounts` - Host account lookup for owner resolution
    /// * `activity` - Activity logger
    /// * `dispatcher` - Notification sink registered by the host
    /// * `settings` - Engine settings
    pub fn new(
        cards: Arc<dyn GiftCardRepository>,
        accounts: Arc<dyn AccountDirectory>,
        activity: ActivityLogger,
        dispatcher: Arc<dyn NotificationDispatcher>,
        settings: Settings,
    ) -> Self {
        Self {
            cards,
            accounts,
            activity,
            dispatcher,
            settings,
        }
    }

    /// Issue a new gift card
    ///
    /// Validates the draft, generates a unique code, resolves the owner by
    /// recipient email, inserts the card, and records a `created` entry.
    /// Digital cards whose delivery date has already arrived trigger the
    /// notification dispatcher; a dispatch failure is logged and swallowed,
    /// the issued card is returned regardless.
    ///
    /// # Arguments
    ///
    /// * `draft` - Issuance draft
    ///
    /// # Returns
    ///
    /// * `LedgerResult<GiftCard>` - The stored card
    ///
    /// # Errors
    ///
    /// * `LedgerError::Validation` - Bad balance or recipient email
    /// * `LedgerError::DuplicateCode` - Lost the insert race on the code
    /// * `LedgerError::CodeGenerationExhausted` - Collision retries ran out
    pub async fn issue(&self, draft: NewGiftCard) -> LedgerResult<GiftCard> {
        draft.validate()?;

        let today = Utc::now().date_naive();
        let mut draft = draft;
        if draft.expiration_date.is_none() {
            if let Some(days) = self.settings.default_validity_days {
                let base = draft.delivery_date.unwrap_or(today);
                draft.expiration_date = Some(base + Duration::days(days));
            }
        }

        let code = CodeGenerator::generate_unique(self.cards.as_ref()).await?;
        let owner = self
            .accounts
            .user_id_for_email(&draft.recipient_email)
            .await?;
        let card = self.cards.insert(&code, &draft, owner).await?;

        self.activity
            .record(ActionType::Created, Some(&card.code), Some(card.balance), owner)
            .await;

        if card.gift_card_type == GiftCardType::Digital && card.delivery_date <= today {
            if let Err(e) = self.dispatcher.on_issued(&card.snapshot()).await {
                log::warn!("Gift card {} issued but notification failed: {e}", card.code);
            }
        }

        Ok(card)
    }

    /// Find a card by code
    ///
    /// # Errors
    ///
    /// * `LedgerError::NotFound` - No card with this code
    pub async fn get(&self, code: &str) -> LedgerResult<GiftCard> {
        self.cards
            .get_by_code(code)
            .await?
            .ok_or_else(|| LedgerError::NotFound(code.to_string()))
    }

    /// All cards owned by a user, oldest first
    pub async fn cards_for_user(&self, user_id: i64) -> LedgerResult<Vec<GiftCard>> {
        self.cards.list_by_owner(user_id, false).await
    }

    /// Apply an admin edit to a card
    ///
    /// Records a `balance_adjusted` entry, plus an `expiration_updated`
    /// entry only when the expiration date actually changed.
    ///
    /// # Arguments
    ///
    /// * `code` - Card to edit
    /// * `update` - Replacement field values
    /// * `acting_user` - Admin performing the edit, for the audit trail
    ///
    /// # Errors
    ///
    /// * `LedgerError::Validation` - Negative balance or bad email
    /// * `LedgerError::NotFound` - No card with this code
    pub async fn update(
        &self,
        code: &str,
        update: GiftCardUpdate,
        acting_user: Option<i64>,
    ) -> LedgerResult<()> {
        update.validate()?;

        let current = self.get(code).await?;
        let expiration_changed = current.expiration_date != update.expiration_date;

        self.cards
            .update_details(code, &update, expiration_changed)
            .await?;

        self.activity
            .record(
                ActionType::BalanceAdjusted,
                Some(code),
                Some(update.balance),
                acting_user,
            )
            .await;
        if expiration_changed {
            self.activity
                .record(ActionType::ExpirationUpdated, Some(code), None, acting_user)
                .await;
        }

        Ok(())
    }

    /// Delete a card
    ///
    /// # Errors
    ///
    /// * `LedgerError::NotFound` - No card with this code
    pub async fn delete(&self, code: &str, acting_user: Option<i64>) -> LedgerResult<()> {
        self.cards.delete(code).await?;
        self.activity
            .record(ActionType::Deleted, Some(code), None, acting_user)
            .await;
        Ok(())
    }
}
