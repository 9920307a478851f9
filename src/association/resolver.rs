//! Association resolver implementation.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::activity::{ActionType, ActivityLogger};
use crate::db::repository::{AccountDirectory, GiftCardRepository};
use crate::ledger::{LedgerError, LedgerResult};

/// Result of a consolidation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsolidationReport {
    /// Ownerless cards examined
    pub processed: usize,
    /// Cards attached to an account
    pub updated: usize,
    /// Per-card failures; the batch continues past each one
    pub errors: Vec<String>,
}

/// Association resolver
///
/// Links gift cards that have no owner to user accounts by matching the
/// recipient email, either for one newly registered user or across the
/// whole ledger.
#[derive(Clone)]
pub struct AssociationResolver {
    cards: Arc<dyn GiftCardRepository>,
    accounts: Arc<dyn AccountDirectory>,
    activity: ActivityLogger,
}

impl AssociationResolver {
    /// Create a new association resolver
    ///
    /// # Arguments
    ///
    /// * `cards` - Gift card storage
    /// * `accounts` - Host account lookup
    /// * `activity` - Activity logger
    pub fn new(
        cards: Arc<dyn GiftCardRepository>,
        accounts: Arc<dyn AccountDirectory>,
        activity: ActivityLogger,
    ) -> Self {
        Self {
            cards,
            accounts,
            activity,
        }
    }

    /// Attach pre-registration gift cards to a newly registered account
    ///
    /// Finds every ownerless card whose recipient email matches the
    /// account's email, sets the owner, and records one
    /// `associated_with_user` entry per card.
    ///
    /// # Arguments
    ///
    /// * `user_id` - The newly registered account
    ///
    /// # Returns
    ///
    /// * `LedgerResult<usize>` - Number of cards attached
    ///
    /// # Errors
    ///
    /// * `LedgerError::Validation` - Unknown account or no email on file
    pub async fn associate_on_registration(&self, user_id: i64) -> LedgerResult<usize> {
        let email = self
            .accounts
            .email_for_user(user_id)
            .await?
            .ok_or_else(|| {
                LedgerError::Validation(format!("no email on file for user {user_id}"))
            })?;

        let cards = self.cards.list_unowned_by_email(&email).await?;
        let mut updated = 0;
        for card in cards {
            self.cards.set_owner(&card.code, user_id).await?;
            self.activity
                .record(ActionType::AssociatedWithUser, Some(&card.code), None, Some(user_id))
                .await;
            updated += 1;
        }

        Ok(updated)
    }

    /// Attach every ownerless card with a registered recipient across the
    /// whole ledger
    ///
    /// Partial-failure tolerant: an update failure for one card is recorded
    /// in the report and the batch moves on. Running this twice in a row
    /// updates nothing the second time.
    pub async fn consolidate(&self) -> LedgerResult<ConsolidationReport> {
        let cards = self.cards.list_unassociated().await?;
        let mut report = ConsolidationReport {
            processed: cards.len(),
            ..ConsolidationReport::default()
        };

        for card in cards {
            let user_id = match self.accounts.user_id_for_email(&card.recipient_email).await {
                Ok(Some(user_id)) => user_id,
                Ok(None) => continue,
                Err(e) => {
                    report.errors.push(format!(
                        "account lookup failed for {}: {}",
                        card.recipient_email, e
                    ));
                    continue;
                }
            };

            match self.cards.set_owner(&card.code, user_id).await {
                Ok(()) => {
                    report.updated += 1;
                    self.activity
                        .record(
                            ActionType::AssociatedWithUser,
                            Some(&card.code),
                            None,
                            Some(user_id),
                        )
                        .await;
                }
                Err(e) => {
                    log::warn!("Consolidation could not update card {}: {e}", card.code);
                    report.errors.push(format!(
                        "failed to update card {} for {}: {}",
                        card.code, card.recipient_email, e
                    ));
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::db::memory::{
        MemoryAccountDirectory, MemoryActivityRepository, MemoryGiftCardRepository,
    };
    use crate::ledger::{GiftCardType, NewGiftCard};
    use rust_decimal_macros::dec;

    fn draft(recipient: &str) -> NewGiftCard {
        NewGiftCard {
            balance: dec!(20.00),
            expiration_date: None,
            sender_name: String::new(),
            sender_email: String::new(),
            recipient_email: recipient.to_string(),
            message: String::new(),
            delivery_date: None,
            gift_card_type: GiftCardType::Digital,
        }
    }

    fn resolver(
        cards: &MemoryGiftCardRepository,
        accounts: &MemoryAccountDirectory,
        activity: &MemoryActivityRepository,
    ) -> AssociationResolver {
        AssociationResolver::new(
            Arc::new(cards.clone()),
            Arc::new(accounts.clone()),
            ActivityLogger::new(Arc::new(activity.clone()), &Settings::default()),
        )
    }

    #[tokio::test]
    async fn registration_claims_matching_cards_only() {
        let cards = MemoryGiftCardRepository::new();
        let accounts = MemoryAccountDirectory::new();
        let activity = MemoryActivityRepository::new();
        accounts.add_account(11, "grace@example.com");

        cards.insert("CARDAAA111", &draft("grace@example.com"), None).await.unwrap();
        cards.insert("CARDBBB222", &draft("grace@example.com"), None).await.unwrap();
        cards.insert("CARDCCC333", &draft("other@example.com"), None).await.unwrap();

        let updated = resolver(&cards, &accounts, &activity)
            .associate_on_registration(11)
            .await
            .expect("association should succeed");

        assert_eq!(updated, 2);
        assert_eq!(
            cards.get_by_code("CARDAAA111").await.unwrap().unwrap().owner_user_id,
            Some(11)
        );
        assert_eq!(
            cards.get_by_code("CARDCCC333").await.unwrap().unwrap().owner_user_id,
            None
        );

        let entries = activity.entries();
        assert_eq!(entries.len(), 2);
        assert!(entries
            .iter()
            .all(|e| e.action_type == ActionType::AssociatedWithUser && e.user_id == Some(11)));
    }

    #[tokio::test]
    async fn consolidate_twice_updates_nothing_the_second_time() {
        let cards = MemoryGiftCardRepository::new();
        let accounts = MemoryAccountDirectory::new();
        let activity = MemoryActivityRepository::new();
        accounts.add_account(1, "a@example.com");
        accounts.add_account(2, "b@example.com");

        cards.insert("CARDAAA111", &draft("a@example.com"), None).await.unwrap();
        cards.insert("CARDBBB222", &draft("b@example.com"), None).await.unwrap();
        cards.insert("CARDCCC333", &draft("stranger@example.com"), None).await.unwrap();

        let r = resolver(&cards, &accounts, &activity);

        let first = r.consolidate().await.expect("first run should succeed");
        assert_eq!(first.processed, 3);
        assert_eq!(first.updated, 2);
        assert!(first.errors.is_empty());

        let second = r.consolidate().await.expect("second run should succeed");
        assert_eq!(second.updated, 0, "no card is double-assigned");
        // The stranger's card stays in the scan until someone registers.
        assert_eq!(second.processed, 1);
    }

    #[tokio::test]
    async fn consolidate_continues_past_a_failing_row() {
        let cards = MemoryGiftCardRepository::new();
        let accounts = MemoryAccountDirectory::new();
        let activity = MemoryActivityRepository::new();
        accounts.add_account(1, "a@example.com");
        accounts.add_account(2, "b@example.com");

        cards.insert("CARDBAD000", &draft("a@example.com"), None).await.unwrap();
        cards.insert("CARDGOOD11", &draft("b@example.com"), None).await.unwrap();

        let failing = cards.fail_writes_for("CARDBAD000");
        let r = AssociationResolver::new(
            Arc::new(failing),
            Arc::new(accounts.clone()),
            ActivityLogger::new(Arc::new(activity.clone()), &Settings::default()),
        );

        let report = r.consolidate().await.expect("batch should survive row failures");
        assert_eq!(report.processed, 2);
        assert_eq!(report.updated, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("CARDBAD000"));

        assert_eq!(
            cards.get_by_code("CARDGOOD11").await.unwrap().unwrap().owner_user_id,
            Some(2)
        );
    }
}
