//! CSV export, whole-table and client-driven batches.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::Arc;

use super::errors::BulkResult;
use super::CSV_HEADERS;
use crate::activity::{ActionType, ActivityLogger};
use crate::db::repository::GiftCardRepository;
use crate::ledger::GiftCard;

/// Page size used when streaming the whole table
const EXPORT_PAGE_SIZE: i64 = 500;

/// Progress of one batched export call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchStatus {
    /// Rows written by this call
    pub written: usize,
    /// Whether the table is exhausted
    pub complete: bool,
}

/// CSV exporter
#[derive(Clone)]
pub struct CsvExporter {
    cards: Arc<dyn GiftCardRepository>,
    activity: ActivityLogger,
}

impl CsvExporter {
    /// Create a new exporter
    pub fn new(cards: Arc<dyn GiftCardRepository>, activity: ActivityLogger) -> Self {
        Self { cards, activity }
    }

    /// Export the whole ledger
    ///
    /// Writes the header row followed by one row per card, and records one
    /// `export_csv` activity entry carrying the row count.
    ///
    /// # Arguments
    ///
    /// * `writer` - Destination
    /// * `acting_user` - Admin driving the export, for the audit trail
    ///
    /// # Returns
    ///
    /// * `BulkResult<usize>` - Rows exported
    pub async fn export_all<W: Write>(
        &self,
        writer: W,
        acting_user: Option<i64>,
    ) -> BulkResult<usize> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(CSV_HEADERS)?;

        let mut offset = 0;
        let mut exported = 0;
        loop {
            let page = self.cards.list_page(offset, EXPORT_PAGE_SIZE).await?;
            let page_len = page.len();
            for card in &page {
                wtr.write_record(row_for(card))?;
            }
            exported += page_len;
            offset += page_len as i64;
            if (page_len as i64) < EXPORT_PAGE_SIZE {
                break;
            }
        }
        wtr.flush().map_err(csv::Error::from)?;

        self.activity
            .record(
                ActionType::ExportCsv,
                None,
                Some(Decimal::from(exported as i64)),
                acting_user,
            )
            .await;

        Ok(exported)
    }

    /// Export one batch, resuming from a client-supplied offset
    ///
    /// The header goes out only with the first batch. A short page signals
    /// completion. Batches for one export job must run sequentially; the
    /// offset is the only cursor.
    pub async fn export_batch<W: Write>(
        &self,
        writer: W,
        offset: i64,
        batch_size: i64,
    ) -> BulkResult<BatchStatus> {
        let mut wtr = csv::Writer::from_writer(writer);
        if offset == 0 {
            wtr.write_record(CSV_HEADERS)?;
        }

        let page = self.cards.list_page(offset, batch_size).await?;
        for card in &page {
            wtr.write_record(row_for(card))?;
        }
        wtr.flush().map_err(csv::Error::from)?;

        Ok(BatchStatus {
            written: page.len(),
            complete: (page.len() as i64) < batch_size,
        })
    }
}

fn row_for(card: &GiftCard) -> Vec<String> {
    vec![
        card.code.clone(),
        card.balance.to_string(),
        card.expiration_date.map(|d| d.to_string()).unwrap_or_default(),
        card.sender_name.clone(),
        card.sender_email.clone(),
        card.recipient_email.clone(),
        card.message.clone(),
        card.issued_date.format("%Y-%m-%d %H:%M:%S").to_string(),
        card.delivery_date.to_string(),
        card.gift_card_type.to_string(),
        card.owner_user_id.map(|id| id.to_string()).unwrap_or_default(),
    ]
}
