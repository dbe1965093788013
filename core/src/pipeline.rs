//! The pipeline orchestrator — runs the stages in their fixed order.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Bronze   — already parsed, counted here
//!   2. Silver   — validate, persist the rejected partition
//!   3. Gold     — aggregate, persist both summary views
//!   4. Insights — render and persist the report
//!
//! One call = one run. No state is held between runs; every artifact is
//! derived fresh from the bronze table passed in.

use crate::{
    bronze::{BronzeMetadata, BronzeTable},
    config::PipelineConfig,
    error::PipelineResult,
    gold::{self, GoldMetadata},
    insights,
    silver::{self, SilverMetadata},
    store::PipelineStore,
    types::RunId,
};
use chrono::{DateTime, Utc};

/// Everything a run needs beyond its input data: identity and the
/// processing time the future-date rule compares against.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: RunId,
    pub as_of: DateTime<Utc>,
}

#[derive(Debug)]
pub struct RunSummary {
    pub run_id: RunId,
    pub bronze: BronzeMetadata,
    pub silver: SilverMetadata,
    pub gold: GoldMetadata,
    pub report: String,
}

/// Run bronze → silver → gold → insights over one bronze table,
/// persisting each derived artifact through the store.
pub fn run(
    ctx: &RunContext,
    bronze: &BronzeTable,
    config: &PipelineConfig,
    store: &PipelineStore,
) -> PipelineResult<RunSummary> {
    let bronze_meta = bronze.metadata();

    let partitions = silver::validate(bronze, ctx.as_of)?;
    for rejected in &partitions.rejected {
        store.insert_rejected(&ctx.run_id, rejected)?;
    }
    let silver_meta = partitions.metadata();

    let summaries = gold::aggregate(&partitions.valid, &config.gold);
    for summary in &summaries.customers {
        store.insert_customer_summary(&ctx.run_id, summary)?;
    }
    for summary in &summaries.categories {
        store.insert_category_summary(&ctx.run_id, summary)?;
    }
    let gold_meta = summaries.metadata();

    let report = insights::render_report(&summaries.customers, &summaries.categories, &config.report);
    store.save_report(&ctx.run_id, &report, &ctx.as_of.to_rfc3339())?;

    log::info!(
        "run={} complete: {} in, {} valid, {} rejected, {} customers, {} categories",
        ctx.run_id,
        bronze_meta.row_count,
        silver_meta.valid_rows,
        silver_meta.rejected_rows,
        gold_meta.customers,
        gold_meta.categories
    );

    Ok(RunSummary {
        run_id: ctx.run_id.clone(),
        bronze: bronze_meta,
        silver: silver_meta,
        gold: gold_meta,
        report,
    })
}
