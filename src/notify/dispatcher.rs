//! Notification dispatcher contract.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::ledger::GiftCardSnapshot;

/// Notification errors
///
/// Dispatch failures never roll back or block the ledger mutation that
/// triggered them; callers downgrade to a warning and move on.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The notification could not be delivered
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// An attachment could not be rendered; senders should retry without it
    #[error("Attachment rendering failed: {0}")]
    Attachment(String),
}

/// Consumer of ledger events
///
/// The engine emits read-only snapshots; rendering and delivery (email
/// templates, PDF attachments) are entirely the implementor's concern. The
/// embedding application registers its implementation at startup.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// A card was issued and its delivery date has arrived
    async fn on_issued(&self, card: &GiftCardSnapshot) -> Result<(), NotificationError>;

    /// A card expires within the configured reminder window
    async fn on_expiring_soon(&self, card: &GiftCardSnapshot) -> Result<(), NotificationError>;
}

/// Dispatcher that drops every event; useful when the host has no
/// notification channel configured
pub struct NullDispatcher;

#[async_trait]
impl NotificationDispatcher for NullDispatcher {
    async fn on_issued(&self, _card: &GiftCardSnapshot) -> Result<(), NotificationError> {
        Ok(())
    }

    async fn on_expiring_soon(&self, _card: &GiftCardSnapshot) -> Result<(), NotificationError> {
        Ok(())
    }
}

/// Dispatcher that records every event in memory; backs the test suites
#[derive(Clone, Default)]
pub struct RecordingDispatcher {
    issued: Arc<Mutex<Vec<GiftCardSnapshot>>>,
    expiring: Arc<Mutex<Vec<GiftCardSnapshot>>>,
    fail_deliveries: Arc<Mutex<bool>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent dispatch fail with a delivery error
    pub fn fail_deliveries(&self) {
        *self.fail_deliveries.lock().unwrap() = true;
    }

    /// Snapshots received through `on_issued`
    pub fn issued(&self) -> Vec<GiftCardSnapshot> {
        self.issued.lock().unwrap().clone()
    }

    /// Snapshots received through `on_expiring_soon`
    pub fn expiring(&self) -> Vec<GiftCardSnapshot> {
        self.expiring.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn on_issued(&self, card: &GiftCardSnapshot) -> Result<(), NotificationError> {
        if *self.fail_deliveries.lock().unwrap() {
            return Err(NotificationError::Delivery("simulated outage".to_string()));
        }
        self.issued.lock().unwrap().push(card.clone());
        Ok(())
    }

    async fn on_expiring_soon(&self, card: &GiftCardSnapshot) -> Result<(), NotificationError> {
        if *self.fail_deliveries.lock().unwrap() {
            return Err(NotificationError::Delivery("simulated outage".to_string()));
        }
        self.expiring.lock().unwrap().push(card.clone());
        Ok(())
    }
}
