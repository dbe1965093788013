//! Silver layer — row-level validation and the valid/rejected split.
//!
//! RULES:
//!   - Predicates are independent: every rule is evaluated for every row
//!     and a row collects the union of all triggered reasons.
//!   - A rejected row keeps every original field so it can be audited.
//!   - A bronze table missing schema columns entirely is a fatal
//!     configuration error, never a per-row rejection.

use crate::{
    bronze::{BronzeTable, TransactionRecord, SCHEMA_COLUMNS},
    error::{PipelineError, PipelineResult},
    types::{CustomerId, TransactionId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a row was rejected. Variants are added per rule — never removed,
/// and wire codes stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    NegativeAmount,
    MissingField,
    FutureDate,
}

impl RejectReason {
    /// Stable string code as persisted and reported.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NegativeAmount => "negative_amount",
            Self::MissingField => "missing_field",
            Self::FutureDate => "future_date",
        }
    }
}

/// A rejected row: the complete original record plus the non-empty set of
/// reasons it failed, in rule-declaration order.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedTransaction {
    pub record: TransactionRecord,
    pub reasons: Vec<RejectReason>,
}

/// A row that passed every rule, with required fields proven present.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidTransaction {
    pub transaction_id: TransactionId,
    pub timestamp: DateTime<Utc>,
    pub customer_id: CustomerId,
    pub merchant_id: String,
    pub category: Option<String>,
    pub amount: f64,
    pub is_fraud: bool,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// The silver artifact: every input row ends up in exactly one partition.
#[derive(Debug, Default)]
pub struct SilverPartitions {
    pub valid: Vec<ValidTransaction>,
    pub rejected: Vec<RejectedTransaction>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SilverMetadata {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub rejected_rows: usize,
}

impl SilverPartitions {
    pub fn metadata(&self) -> SilverMetadata {
        SilverMetadata {
            total_rows: self.valid.len() + self.rejected.len(),
            valid_rows: self.valid.len(),
            rejected_rows: self.rejected.len(),
        }
    }
}

/// Split a bronze table into valid and rejected partitions.
///
/// `as_of` is the pipeline's processing time; the future-date rule compares
/// against it, never against the wall clock, so runs are reproducible.
pub fn validate(
    bronze: &BronzeTable,
    as_of: DateTime<Utc>,
) -> PipelineResult<SilverPartitions> {
    check_schema(bronze)?;

    let mut partitions = SilverPartitions::default();

    for record in bronze.rows() {
        let reasons = evaluate_rules(record, as_of);

        if reasons.is_empty() {
            match promote(record) {
                Some(valid) => partitions.valid.push(valid),
                // promote() only fails when a required field is absent,
                // which the missing-field rule has already flagged.
                None => partitions.rejected.push(RejectedTransaction {
                    record: record.clone(),
                    reasons: vec![RejectReason::MissingField],
                }),
            }
        } else {
            partitions.rejected.push(RejectedTransaction {
                record: record.clone(),
                reasons,
            });
        }
    }

    let meta = partitions.metadata();
    log::info!(
        "stage=silver total={} valid={} rejected={}",
        meta.total_rows,
        meta.valid_rows,
        meta.rejected_rows
    );

    Ok(partitions)
}

/// All schema columns must exist in the bronze header; the error names
/// every missing column, not just the first.
fn check_schema(bronze: &BronzeTable) -> PipelineResult<()> {
    let missing: Vec<String> = SCHEMA_COLUMNS
        .iter()
        .filter(|column| !bronze.has_column(column))
        .map(|column| column.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::Schema { missing })
    }
}

/// Evaluate every rule against one row. Rules are independent; the result
/// is the union of triggered reasons in declaration order.
fn evaluate_rules(record: &TransactionRecord, as_of: DateTime<Utc>) -> Vec<RejectReason> {
    let mut reasons = Vec::new();

    if negative_amount(record) {
        reasons.push(RejectReason::NegativeAmount);
    }
    if missing_required_field(record) {
        reasons.push(RejectReason::MissingField);
    }
    if future_dated(record, as_of) {
        reasons.push(RejectReason::FutureDate);
    }

    reasons
}

/// amount < 0. Absent amounts are the missing-field rule's concern.
fn negative_amount(record: &TransactionRecord) -> bool {
    record.amount.is_some_and(|amount| amount < 0.0)
}

/// Required: transaction_id, timestamp, customer_id, merchant_id, amount.
/// Category is deliberately not required — uncategorized rows stay valid.
fn missing_required_field(record: &TransactionRecord) -> bool {
    record.transaction_id.is_none()
        || record.timestamp.is_none()
        || record.customer_id.is_none()
        || record.merchant_id.is_none()
        || record.amount.is_none()
}

/// Strictly later than the processing time. A row stamped exactly at
/// `as_of` is valid.
fn future_dated(record: &TransactionRecord, as_of: DateTime<Utc>) -> bool {
    record.timestamp.is_some_and(|timestamp| timestamp > as_of)
}

fn promote(record: &TransactionRecord) -> Option<ValidTransaction> {
    Some(ValidTransaction {
        transaction_id: record.transaction_id.clone()?,
        timestamp: record.timestamp?,
        customer_id: record.customer_id.clone()?,
        merchant_id: record.merchant_id.clone()?,
        category: record.category.clone(),
        amount: record.amount?,
        is_fraud: record.is_fraud,
        lat: record.lat,
        lon: record.lon,
    })
}
