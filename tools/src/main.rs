//! pipeline-runner: headless medallion pipeline runner for cardmill.
//!
//! Usage:
//!   pipeline-runner --input data/raw/transactions.csv --db runs.db
//!   pipeline-runner --input transactions.csv --data-dir ./data --top-n 3

use anyhow::Result;
use cardmill_core::{
    bronze::BronzeTable,
    config::PipelineConfig,
    pipeline::{self, RunContext, RunSummary},
    store::PipelineStore,
};
use chrono::Utc;
use std::env;
use std::path::Path;
use uuid::Uuid;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let input = args
        .windows(2)
        .find(|w| w[0] == "--input")
        .map(|w| w[1].clone())
        .ok_or_else(|| anyhow::anyhow!("--input <csv> is required"))?;
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");
    let data_dir = args
        .windows(2)
        .find(|w| w[0] == "--data-dir")
        .map(|w| w[1].as_str())
        .unwrap_or("./data");
    let top_n: Option<usize> = args
        .windows(2)
        .find(|w| w[0] == "--top-n")
        .and_then(|w| w[1].parse().ok());

    println!("cardmill — pipeline-runner");
    println!("  input:     {input}");
    println!("  db:        {db}");
    println!("  data_dir:  {data_dir}");
    println!();

    let mut config = load_config(data_dir)?;
    if let Some(n) = top_n {
        config.report.top_n = n;
    }

    let store = PipelineStore::open(db)?;
    store.migrate()?;

    let started_at = Utc::now();
    let run_id = format!("run-{}", Uuid::new_v4());
    store.insert_run(
        &run_id,
        &input,
        env!("CARGO_PKG_VERSION"),
        &started_at.to_rfc3339(),
    )?;

    let bronze = BronzeTable::from_csv_path(Path::new(&input))?;

    let ctx = RunContext {
        run_id,
        as_of: started_at,
    };
    let summary = pipeline::run(&ctx, &bronze, &config, &store)?;

    print_summary(&summary);
    println!();
    println!("{}", summary.report);

    Ok(())
}

/// Use the config file when the data dir carries one, defaults otherwise.
fn load_config(data_dir: &str) -> Result<PipelineConfig> {
    let path = format!("{data_dir}/pipeline/pipeline_config.json");
    if Path::new(&path).exists() {
        PipelineConfig::load(data_dir)
    } else {
        log::debug!("No config at {path}, using defaults");
        Ok(PipelineConfig::default())
    }
}

fn print_summary(summary: &RunSummary) {
    println!("=== PIPELINE RUN SUMMARY ===");
    println!("  run_id:         {}", summary.run_id);
    println!("  bronze rows:    {}", summary.bronze.row_count);
    println!("  bronze columns: {}", summary.bronze.column_count);
    println!("  valid rows:     {}", summary.silver.valid_rows);
    println!("  rejected rows:  {}", summary.silver.rejected_rows);
    println!("  customers:      {}", summary.gold.customers);
    println!("  categories:     {}", summary.gold.categories);
}
