//! Gold layer — analytical aggregates over the silver valid partition.
//!
//! Aggregation is an explicit fold (count, sum, fraud count) per group.
//! Mean and fraud rate are derived from the merged sums at the end, never
//! averaged incrementally, so any partitioning of the input merges to the
//! same result.

use crate::{config::GoldConfig, silver::ValidTransaction, types::CustomerId};
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-customer spending summary. One row per distinct customer id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerSummary {
    pub customer_id: CustomerId,
    pub txn_count: u64,
    pub total_amount: f64,
    pub mean_amount: f64,
    pub fraud_count: u64,
    pub fraud_rate: f64,
}

/// Per-merchant-category fraud/volume summary. One row per category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub category: String,
    pub txn_count: u64,
    pub total_amount: f64,
    pub mean_amount: f64,
    pub fraud_count: u64,
    pub fraud_rate: f64,
}

#[derive(Debug, Default)]
pub struct GoldSummaries {
    pub customers: Vec<CustomerSummary>,
    pub categories: Vec<CategorySummary>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct GoldMetadata {
    pub customers: usize,
    pub categories: usize,
}

impl GoldSummaries {
    pub fn metadata(&self) -> GoldMetadata {
        GoldMetadata {
            customers: self.customers.len(),
            categories: self.categories.len(),
        }
    }
}

/// The group accumulator. fraud_rate = fraud_count / count, 0 for an empty
/// group — a group only exists once a row folded into it, so count >= 1 in
/// practice, but the guard keeps the math total.
#[derive(Debug, Default, Clone, Copy)]
struct GroupAccum {
    count: u64,
    sum: f64,
    fraud_count: u64,
}

impl GroupAccum {
    fn fold(&mut self, amount: f64, is_fraud: bool) {
        self.count += 1;
        self.sum += amount;
        if is_fraud {
            self.fraud_count += 1;
        }
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    fn fraud_rate(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.fraud_count as f64 / self.count as f64
        }
    }
}

/// Compute both gold views from the valid partition.
///
/// Group maps are BTreeMaps keyed by id/category, so output order is
/// deterministic for a given key set regardless of input order. An empty
/// input yields empty summaries.
pub fn aggregate(valid: &[ValidTransaction], config: &GoldConfig) -> GoldSummaries {
    let mut by_customer: BTreeMap<&str, GroupAccum> = BTreeMap::new();
    let mut by_category: BTreeMap<&str, GroupAccum> = BTreeMap::new();

    for txn in valid {
        by_customer
            .entry(txn.customer_id.as_str())
            .or_default()
            .fold(txn.amount, txn.is_fraud);

        let category = txn
            .category
            .as_deref()
            .unwrap_or(&config.uncategorized_label);
        by_category
            .entry(category)
            .or_default()
            .fold(txn.amount, txn.is_fraud);
    }

    let summaries = GoldSummaries {
        customers: by_customer
            .into_iter()
            .map(|(customer_id, accum)| CustomerSummary {
                customer_id: customer_id.to_string(),
                txn_count: accum.count,
                total_amount: accum.sum,
                mean_amount: accum.mean(),
                fraud_count: accum.fraud_count,
                fraud_rate: accum.fraud_rate(),
            })
            .collect(),
        categories: by_category
            .into_iter()
            .map(|(category, accum)| CategorySummary {
                category: category.to_string(),
                txn_count: accum.count,
                total_amount: accum.sum,
                mean_amount: accum.mean(),
                fraud_count: accum.fraud_count,
                fraud_rate: accum.fraud_rate(),
            })
            .collect(),
    };

    log::info!(
        "stage=gold customers={} categories={}",
        summaries.customers.len(),
        summaries.categories.len()
    );

    summaries
}
