//! Bronze layer — raw delimited source landed as a typed columnar table.
//!
//! RULE: Bronze only parses. It never judges a row — a field that cannot
//! be read becomes None and the silver validator records the reason.
//! Structural problems (unreadable file, ragged rows) are errors here;
//! everything row-shaped lands.

use crate::error::PipelineResult;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::io;
use std::path::Path;

/// The fixed logical schema every bronze table must carry.
/// Auxiliary columns (coordinates etc.) may follow; these seven must exist.
pub const SCHEMA_COLUMNS: [&str; 7] = [
    "transaction_id",
    "timestamp",
    "customer_id",
    "merchant_id",
    "category",
    "amount",
    "is_fraud",
];

/// One source row, minimally parsed. Every validation-relevant field is
/// optional at this layer; silver decides what absence means.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default, deserialize_with = "de_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub merchant_id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "de_fraud_flag")]
    pub is_fraud: bool,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub lon: Option<f64>,
}

/// The bronze artifact: observed header columns plus the parsed rows.
/// Immutable once built — downstream stages only read it.
#[derive(Debug, Clone)]
pub struct BronzeTable {
    columns: Vec<String>,
    rows: Vec<TransactionRecord>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BronzeMetadata {
    pub row_count: usize,
    pub column_count: usize,
}

impl BronzeTable {
    /// Build a table directly from columns and rows (used in tests and by
    /// callers that already hold parsed data).
    pub fn new(columns: Vec<String>, rows: Vec<TransactionRecord>) -> Self {
        Self { columns, rows }
    }

    /// Parse delimited text from any reader. Header row is required and is
    /// recorded verbatim for the structural schema check in silver.
    pub fn from_reader<R: io::Read>(reader: R) -> PipelineResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut rows = Vec::new();
        for result in csv_reader.deserialize() {
            let record: TransactionRecord = result?;
            rows.push(record);
        }

        log::info!(
            "stage=bronze rows={} columns={}",
            rows.len(),
            columns.len()
        );

        Ok(Self { columns, rows })
    }

    /// Ingest a source CSV file from disk.
    pub fn from_csv_path(path: &Path) -> PipelineResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[TransactionRecord] {
        &self.rows
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn metadata(&self) -> BronzeMetadata {
        BronzeMetadata {
            row_count: self.rows.len(),
            column_count: self.columns.len(),
        }
    }
}

/// Accepts RFC 3339 or `YYYY-MM-DD HH:MM:SS[.frac]` (treated as UTC).
/// Anything else lands as None.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn de_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

fn de_lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.trim().parse::<f64>().ok()))
}

/// `1` / `true` (any case) flags fraud; blank or anything else does not.
fn de_fraud_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.is_some_and(|s| {
        let s = s.trim();
        s == "1" || s.eq_ignore_ascii_case("true")
    }))
}
