//! CSV import, whole-file and resumable batches.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::StringRecord;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::str::FromStr;
use std::sync::Arc;

use super::errors::BulkResult;
use super::CSV_HEADERS;
use crate::activity::{ActionType, ActivityLogger};
use crate::db::repository::GiftCardRepository;
use crate::ledger::{GiftCardType, NewGiftCard};

/// One rejected row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    /// 1-based line in the file, counting the header
    pub line: usize,
    pub reason: String,
}

/// Result of an import run
///
/// Rows fail individually; the run keeps going and reports a summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub imported: usize,
    pub errors: Vec<RowError>,
}

/// Progress of one batched import call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchImport {
    pub report: ImportReport,
    /// Whether the file is exhausted
    pub complete: bool,
}

/// CSV importer
#[derive(Clone)]
pub struct CsvImporter {
    cards: Arc<dyn GiftCardRepository>,
    activity: ActivityLogger,
}

impl CsvImporter {
    /// Create a new importer
    pub fn new(cards: Arc<dyn GiftCardRepository>, activity: ActivityLogger) -> Self {
        Self { cards, activity }
    }

    /// Import a whole file
    ///
    /// Expects the header row first, then one card per row in the exported
    /// column order. Parse failures, validation failures, and duplicate
    /// codes are collected per row; the rest of the file still imports.
    /// Records one `import_csv` entry with the imported count.
    pub async fn import<R: Read>(
        &self,
        reader: R,
        acting_user: Option<i64>,
    ) -> BulkResult<ImportReport> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut report = ImportReport::default();

        for (idx, result) in rdr.records().enumerate() {
            let line = idx + 2;
            self.import_record(result, line, &mut report).await;
        }

        if report.imported > 0 {
            self.activity
                .record(
                    ActionType::ImportCsv,
                    None,
                    Some(Decimal::from(report.imported as i64)),
                    acting_user,
                )
                .await;
        }

        Ok(report)
    }

    /// Import one batch, resuming from a client-supplied row offset
    ///
    /// `offset` counts data rows already consumed by earlier batches; the
    /// header is always skipped. Retrying a batch is safe, since rows that
    /// made it in earlier fail as duplicates and are reported rather than
    /// re-inserted. Batches for one job must not run concurrently.
    pub async fn import_batch<R: Read>(
        &self,
        reader: R,
        offset: usize,
        batch_size: usize,
        acting_user: Option<i64>,
    ) -> BulkResult<BatchImport> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut report = ImportReport::default();

        let mut rows_seen = 0;
        for (idx, result) in rdr.records().enumerate().skip(offset).take(batch_size) {
            rows_seen += 1;
            let line = idx + 2;
            self.import_record(result, line, &mut report).await;
        }

        if report.imported > 0 {
            self.activity
                .record(
                    ActionType::ImportCsv,
                    None,
                    Some(Decimal::from(report.imported as i64)),
                    acting_user,
                )
                .await;
        }

        Ok(BatchImport {
            report,
            complete: rows_seen < batch_size,
        })
    }

    async fn import_record(
        &self,
        result: Result<StringRecord, csv::Error>,
        line: usize,
        report: &mut ImportReport,
    ) {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                report.errors.push(RowError {
                    line,
                    reason: e.to_string(),
                });
                return;
            }
        };

        let (code, card, issued_date, owner) = match parse_record(&record) {
            Ok(parsed) => parsed,
            Err(reason) => {
                report.errors.push(RowError { line, reason });
                return;
            }
        };

        match self
            .cards
            .insert_full(&code, &card, issued_date, owner)
            .await
        {
            Ok(_) => report.imported += 1,
            Err(e) => report.errors.push(RowError {
                line,
                reason: e.to_string(),
            }),
        }
    }
}

type ParsedRow = (String, NewGiftCard, DateTime<Utc>, Option<i64>);

fn parse_record(record: &StringRecord) -> Result<ParsedRow, String> {
    if record.len() < CSV_HEADERS.len() {
        return Err(format!(
            "expected {} columns, found {}",
            CSV_HEADERS.len(),
            record.len()
        ));
    }

    let field = |i: usize| record.get(i).unwrap_or("").trim();

    let code = field(0).to_string();
    if code.is_empty() {
        return Err("code must not be empty".to_string());
    }

    let balance =
        Decimal::from_str(field(1)).map_err(|e| format!("bad balance {:?}: {e}", field(1)))?;
    if balance < Decimal::ZERO {
        return Err(format!("balance cannot be negative: {balance}"));
    }

    let expiration_date = parse_optional_date(field(2), "expiration_date")?;

    let issued_date = match field(7) {
        "" => Utc::now(),
        raw => NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .map_err(|e| format!("bad issued_date {raw:?}: {e}"))?
            .and_utc(),
    };

    let delivery_date = parse_optional_date(field(8), "delivery_date")?;

    let gift_card_type =
        GiftCardType::from_str(field(9)).map_err(|e| e.to_string())?;

    let owner = match field(10) {
        "" | "0" => None,
        raw => Some(
            raw.parse::<i64>()
                .map_err(|e| format!("bad user_id {raw:?}: {e}"))?,
        ),
    };

    let card = NewGiftCard {
        balance,
        expiration_date,
        sender_name: field(3).to_string(),
        sender_email: field(4).to_string(),
        recipient_email: field(5).to_string(),
        message: field(6).to_string(),
        delivery_date,
        gift_card_type,
    };

    Ok((code, card, issued_date, owner))
}

fn parse_optional_date(raw: &str, column: &str) -> Result<Option<NaiveDate>, String> {
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| format!("bad {column} {raw:?}: {e}"))
}
