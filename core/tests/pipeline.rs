use cardmill_core::bronze::BronzeTable;
use cardmill_core::config::PipelineConfig;
use cardmill_core::error::PipelineError;
use cardmill_core::pipeline::{self, RunContext};
use cardmill_core::silver::RejectReason;
use cardmill_core::store::PipelineStore;
use chrono::{DateTime, TimeZone, Utc};
use std::io::Write;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// Five rows: one negative amount, one missing customer_id, one
/// future-dated, two clean (one of them fraud-flagged).
fn scenario_csv() -> &'static str {
    "transaction_id,timestamp,customer_id,merchant_id,category,amount,is_fraud\n\
     t-001,2024-05-30 10:00:00,c-100,m-1,grocery_pos,-25.00,0\n\
     t-002,2024-05-30 11:00:00,,m-2,online_retail,40.00,0\n\
     t-003,2024-07-01 09:00:00,c-101,m-3,travel,120.00,0\n\
     t-004,2024-05-29 08:00:00,c-102,m-4,online_retail,60.00,1\n\
     t-005,2024-05-29 09:30:00,c-103,m-5,grocery_pos,35.00,0\n"
}

fn run_store(run_id: &str) -> PipelineStore {
    let store = PipelineStore::in_memory().unwrap();
    store.migrate().unwrap();
    store
        .insert_run(run_id, "test.csv", "test", &as_of().to_rfc3339())
        .unwrap();
    store
}

fn run_pipeline(
    run_id: &str,
    csv: &str,
    store: &PipelineStore,
) -> pipeline::RunSummary {
    let bronze = BronzeTable::from_reader(csv.as_bytes()).unwrap();
    let ctx = RunContext {
        run_id: run_id.to_string(),
        as_of: as_of(),
    };
    pipeline::run(&ctx, &bronze, &PipelineConfig::default(), store).unwrap()
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// The full bronze → silver → gold → insights pass over the five-row
/// scenario: 3 rejected with their distinct reasons, 2 valid, 2 customer
/// rows, category rates 1.0 and 0.0, overall valid-partition rate 50%.
#[test]
fn five_row_scenario_end_to_end() {
    let store = run_store("e2e");
    let summary = run_pipeline("e2e", scenario_csv(), &store);

    assert_eq!(summary.bronze.row_count, 5);
    assert_eq!(summary.silver.valid_rows, 2);
    assert_eq!(summary.silver.rejected_rows, 3);
    assert_eq!(summary.gold.customers, 2);
    assert_eq!(summary.gold.categories, 2);

    // Rejected partition landed with the right reasons, in input order.
    assert_eq!(store.rejected_count("e2e").unwrap(), 3);
    let rejected = store.rejected_rows("e2e").unwrap();
    assert_eq!(rejected[0].transaction_id.as_deref(), Some("t-001"));
    assert_eq!(rejected[0].reasons, vec![RejectReason::NegativeAmount]);
    assert_eq!(rejected[1].transaction_id.as_deref(), Some("t-002"));
    assert_eq!(rejected[1].reasons, vec![RejectReason::MissingField]);
    assert_eq!(rejected[2].transaction_id.as_deref(), Some("t-003"));
    assert_eq!(rejected[2].reasons, vec![RejectReason::FutureDate]);

    // Gold views reflect only the two clean rows.
    let customers = store.customer_summaries("e2e").unwrap();
    assert_eq!(customers.len(), 2);
    assert_eq!(customers[0].customer_id, "c-102");
    assert_eq!(customers[0].fraud_rate, 1.0);
    assert_eq!(customers[1].customer_id, "c-103");
    assert_eq!(customers[1].fraud_rate, 0.0);

    let categories = store.category_summaries("e2e").unwrap();
    assert_eq!(categories.len(), 2);
    let retail = categories.iter().find(|c| c.category == "online_retail").unwrap();
    assert_eq!(retail.fraud_rate, 1.0);
    assert!((retail.total_amount - 60.0).abs() < 1e-9);
    let grocery = categories.iter().find(|c| c.category == "grocery_pos").unwrap();
    assert_eq!(grocery.fraud_rate, 0.0);
    assert!((grocery.total_amount - 35.0).abs() < 1e-9);

    // The report shows the valid-partition rate: 1 flagged of 2.
    assert!(
        summary.report.contains("overall fraud rate:  50.00%"),
        "got:\n{}",
        summary.report
    );
}

/// Two runs over the same source produce identical gold views.
#[test]
fn rerun_is_deterministic() {
    let store = PipelineStore::in_memory().unwrap();
    store.migrate().unwrap();
    store
        .insert_run("run-a", "test.csv", "test", &as_of().to_rfc3339())
        .unwrap();
    store
        .insert_run("run-b", "test.csv", "test", &as_of().to_rfc3339())
        .unwrap();

    run_pipeline("run-a", scenario_csv(), &store);
    run_pipeline("run-b", scenario_csv(), &store);

    assert_eq!(
        store.customer_summaries("run-a").unwrap(),
        store.customer_summaries("run-b").unwrap()
    );
    assert_eq!(
        store.category_summaries("run-a").unwrap(),
        store.category_summaries("run-b").unwrap()
    );
}

/// The rendered report is persisted alongside the summaries.
#[test]
fn report_is_persisted() {
    let store = run_store("persist");
    let summary = run_pipeline("persist", scenario_csv(), &store);

    let stored = store.report("persist").unwrap();
    assert_eq!(stored.as_deref(), Some(summary.report.as_str()));
}

/// A source file missing schema columns aborts the run with an error that
/// names them; nothing is partially persisted.
#[test]
fn missing_columns_abort_the_run() {
    let csv = "transaction_id,timestamp,merchant_id,category,is_fraud\n\
               t-001,2024-05-30 10:00:00,m-1,grocery_pos,0\n";
    let store = run_store("schema");
    let bronze = BronzeTable::from_reader(csv.as_bytes()).unwrap();
    let ctx = RunContext {
        run_id: "schema".to_string(),
        as_of: as_of(),
    };

    let err = pipeline::run(&ctx, &bronze, &PipelineConfig::default(), &store).unwrap_err();
    match err {
        PipelineError::Schema { missing } => {
            assert_eq!(missing, vec!["customer_id", "amount"]);
        }
        other => panic!("expected Schema error, got {other:?}"),
    }

    assert_eq!(store.rejected_count("schema").unwrap(), 0);
    assert_eq!(store.customer_summary_count("schema").unwrap(), 0);
}

/// A header-only source runs to completion with empty views and a zero
/// overall rate.
#[test]
fn header_only_source_produces_empty_views() {
    let csv = "transaction_id,timestamp,customer_id,merchant_id,category,amount,is_fraud\n";
    let store = run_store("empty");
    let summary = run_pipeline("empty", csv, &store);

    assert_eq!(summary.silver.valid_rows, 0);
    assert_eq!(summary.silver.rejected_rows, 0);
    assert_eq!(store.customer_summary_count("empty").unwrap(), 0);
    assert_eq!(store.category_summary_count("empty").unwrap(), 0);
    assert!(summary.report.contains("overall fraud rate:  0.00%"));
}

/// Ingest from an actual file on disk, end to end.
#[test]
fn ingest_from_disk_round_trip() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(scenario_csv().as_bytes()).unwrap();
    file.flush().unwrap();

    let bronze = BronzeTable::from_csv_path(file.path()).unwrap();
    assert_eq!(bronze.rows().len(), 5);
    assert_eq!(bronze.columns().len(), 7);

    let store = run_store("disk");
    let ctx = RunContext {
        run_id: "disk".to_string(),
        as_of: as_of(),
    };
    let summary =
        pipeline::run(&ctx, &bronze, &PipelineConfig::default(), &store).unwrap();
    assert_eq!(summary.silver.valid_rows, 2);
    assert_eq!(summary.silver.rejected_rows, 3);
}
