use cardmill_core::config::ReportConfig;
use cardmill_core::gold::{CategorySummary, CustomerSummary};
use cardmill_core::insights;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn customer(id: &str, txn_count: u64, total: f64, fraud_count: u64) -> CustomerSummary {
    CustomerSummary {
        customer_id: id.to_string(),
        txn_count,
        total_amount: total,
        mean_amount: total / txn_count as f64,
        fraud_count,
        fraud_rate: fraud_count as f64 / txn_count as f64,
    }
}

fn category(name: &str, txn_count: u64, total: f64, fraud_count: u64) -> CategorySummary {
    CategorySummary {
        category: name.to_string(),
        txn_count,
        total_amount: total,
        mean_amount: total / txn_count as f64,
        fraud_count,
        fraud_rate: fraud_count as f64 / txn_count as f64,
    }
}

fn config(top_n: usize) -> ReportConfig {
    ReportConfig { top_n }
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Overall fraud rate is the fraud-count sum over the txn-count sum across
/// categories, rendered as a percentage.
#[test]
fn report_shows_overall_metrics() {
    let customers = vec![customer("c-1", 2, 100.0, 1), customer("c-2", 2, 60.0, 1)];
    let categories = vec![
        category("travel", 2, 100.0, 2),
        category("grocery_pos", 2, 60.0, 0),
    ];

    let report = insights::render_report(&customers, &categories, &config(5));

    assert!(report.contains("transactions:        4"), "got:\n{report}");
    assert!(report.contains("fraud flagged:       2"), "got:\n{report}");
    assert!(report.contains("overall fraud rate:  50.00%"), "got:\n{report}");
    assert!(report.contains("$160.00"), "got:\n{report}");
}

/// Categories with equal fraud rates order by name so the report is
/// deterministic.
#[test]
fn tied_fraud_rates_break_on_category_name() {
    let categories = vec![
        category("zebra_pos", 1, 10.0, 1),
        category("apple_pos", 1, 10.0, 1),
    ];

    let report = insights::render_report(&[], &categories, &config(5));

    let apple = report.find("apple_pos").unwrap();
    let zebra = report.find("zebra_pos").unwrap();
    assert!(apple < zebra, "expected apple_pos before zebra_pos:\n{report}");
}

#[test]
fn tied_spend_breaks_on_customer_id() {
    let customers = vec![
        customer("c-zz", 1, 500.0, 0),
        customer("c-aa", 1, 500.0, 0),
    ];

    let report = insights::render_report(&customers, &[], &config(5));

    let first = report.find("c-aa").unwrap();
    let second = report.find("c-zz").unwrap();
    assert!(first < second, "expected c-aa before c-zz:\n{report}");
}

/// top_n bounds both ranking sections.
#[test]
fn top_n_limits_sections() {
    let categories = vec![
        category("a_pos", 10, 100.0, 9),
        category("b_pos", 10, 100.0, 5),
        category("c_pos", 10, 100.0, 1),
    ];
    let customers = vec![
        customer("c-1", 1, 300.0, 0),
        customer("c-2", 1, 200.0, 0),
        customer("c-3", 1, 100.0, 0),
    ];

    let report = insights::render_report(&customers, &categories, &config(2));

    assert!(report.contains("a_pos"));
    assert!(report.contains("b_pos"));
    assert!(!report.contains("c_pos"), "got:\n{report}");
    assert!(report.contains("c-1"));
    assert!(report.contains("c-2"));
    assert!(!report.contains("c-3"), "got:\n{report}");
}

/// Empty summaries render a zero rate and placeholder sections, never a
/// divide-by-zero.
#[test]
fn empty_summaries_render_cleanly() {
    let report = insights::render_report(&[], &[], &config(5));

    assert!(report.contains("overall fraud rate:  0.00%"), "got:\n{report}");
    assert!(report.contains("(no categories)"), "got:\n{report}");
    assert!(report.contains("(no customers)"), "got:\n{report}");
}

/// Same inputs, same text — the report is a pure function of the views.
#[test]
fn rendering_is_deterministic() {
    let customers = vec![customer("c-1", 3, 90.0, 1)];
    let categories = vec![category("travel", 3, 90.0, 1)];

    let first = insights::render_report(&customers, &categories, &config(5));
    let second = insights::render_report(&customers, &categories, &config(5));

    assert_eq!(first, second);
}
