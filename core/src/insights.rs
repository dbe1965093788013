//! Insight reporter — renders the gold views into a text digest.
//!
//! Purely presentational: overall metrics, top-N fraud-rate categories,
//! top-N spending customers. Ties break on the group key so the same
//! summaries always render the same report.

use crate::{
    config::ReportConfig,
    gold::{CategorySummary, CustomerSummary},
};

/// Render the insight digest from the two gold views.
pub fn render_report(
    customers: &[CustomerSummary],
    categories: &[CategorySummary],
    config: &ReportConfig,
) -> String {
    let total_txns: u64 = categories.iter().map(|c| c.txn_count).sum();
    let total_amount: f64 = categories.iter().map(|c| c.total_amount).sum();
    let total_fraud: u64 = categories.iter().map(|c| c.fraud_count).sum();
    let overall_rate = if total_txns == 0 {
        0.0
    } else {
        total_fraud as f64 / total_txns as f64
    };

    let mut out = String::new();

    out.push_str("=== CARD TRANSACTION INSIGHTS ===\n");
    out.push_str(&format!("  customers:           {}\n", customers.len()));
    out.push_str(&format!("  categories:          {}\n", categories.len()));
    out.push_str(&format!("  transactions:        {total_txns}\n"));
    out.push_str(&format!("  total volume:        ${total_amount:.2}\n"));
    out.push_str(&format!("  fraud flagged:       {total_fraud}\n"));
    out.push_str(&format!(
        "  overall fraud rate:  {:.2}%\n",
        overall_rate * 100.0
    ));

    out.push('\n');
    out.push_str(&format!(
        "=== HIGH-RISK CATEGORIES (top {} by fraud rate) ===\n",
        config.top_n
    ));
    let top_categories = top_categories_by_fraud_rate(categories, config.top_n);
    if top_categories.is_empty() {
        out.push_str("  (no categories)\n");
    }
    for category in top_categories {
        out.push_str(&format!(
            "  {:<20} {:>6.2}%  ({} flagged / {} total)\n",
            category.category,
            category.fraud_rate * 100.0,
            category.fraud_count,
            category.txn_count
        ));
    }

    out.push('\n');
    out.push_str(&format!(
        "=== TOP SPENDING CUSTOMERS (top {} by total spend) ===\n",
        config.top_n
    ));
    let top_customers = top_customers_by_spend(customers, config.top_n);
    if top_customers.is_empty() {
        out.push_str("  (no customers)\n");
    }
    for customer in top_customers {
        out.push_str(&format!(
            "  {:<20} ${:>10.2}  ({} txns, mean ${:.2})\n",
            customer.customer_id,
            customer.total_amount,
            customer.txn_count,
            customer.mean_amount
        ));
    }

    out
}

/// Highest fraud rate first; equal rates order by category name.
fn top_categories_by_fraud_rate(
    categories: &[CategorySummary],
    top_n: usize,
) -> Vec<&CategorySummary> {
    let mut ranked: Vec<&CategorySummary> = categories.iter().collect();
    ranked.sort_by(|a, b| {
        b.fraud_rate
            .total_cmp(&a.fraud_rate)
            .then_with(|| a.category.cmp(&b.category))
    });
    ranked.truncate(top_n);
    ranked
}

/// Highest total spend first; equal spend orders by customer id.
fn top_customers_by_spend(
    customers: &[CustomerSummary],
    top_n: usize,
) -> Vec<&CustomerSummary> {
    let mut ranked: Vec<&CustomerSummary> = customers.iter().collect();
    ranked.sort_by(|a, b| {
        b.total_amount
            .total_cmp(&a.total_amount)
            .then_with(|| a.customer_id.cmp(&b.customer_id))
    });
    ranked.truncate(top_n);
    ranked
}
