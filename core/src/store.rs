//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! Pipeline stages call store methods — they never execute SQL directly.

use crate::{
    error::PipelineResult,
    gold::{CategorySummary, CustomerSummary},
    silver::{RejectReason, RejectedTransaction},
};
use rusqlite::{params, Connection, OptionalExtension};

pub struct PipelineStore {
    conn: Connection,
}

/// A rejected row as read back for audit queries.
#[derive(Debug, Clone)]
pub struct RejectedRow {
    pub transaction_id: Option<String>,
    pub customer_id: Option<String>,
    pub amount: Option<f64>,
    pub reasons: Vec<RejectReason>,
}

impl PipelineStore {
    pub fn open(path: &str) -> PipelineResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (:memory: ignores it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> PipelineResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> PipelineResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../migrations/002_gold.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(
        &self,
        run_id: &str,
        source_file: &str,
        version: &str,
        started_at: &str,
    ) -> PipelineResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, source_file, version, started_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![run_id, source_file, version, started_at],
        )?;
        Ok(())
    }

    // ── Silver rejected partition ──────────────────────────────

    pub fn insert_rejected(
        &self,
        run_id: &str,
        rejected: &RejectedTransaction,
    ) -> PipelineResult<()> {
        let record = &rejected.record;
        let reasons = serde_json::to_string(&rejected.reasons)?;
        self.conn.execute(
            "INSERT INTO rejected_transaction
             (run_id, transaction_id, ts, customer_id, merchant_id,
              category, amount, is_fraud, lat, lon, reasons)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                run_id,
                record.transaction_id,
                record.timestamp.map(|t| t.to_rfc3339()),
                record.customer_id,
                record.merchant_id,
                record.category,
                record.amount,
                record.is_fraud as i64,
                record.lat,
                record.lon,
                reasons,
            ],
        )?;
        Ok(())
    }

    pub fn rejected_count(&self, run_id: &str) -> PipelineResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM rejected_transaction WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn rejected_rows(&self, run_id: &str) -> PipelineResult<Vec<RejectedRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT transaction_id, customer_id, amount, reasons
             FROM rejected_transaction WHERE run_id = ?1
             ORDER BY id ASC",
        )?;
        let raw = stmt
            .query_map(params![run_id], |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows = Vec::with_capacity(raw.len());
        for (transaction_id, customer_id, amount, reasons_json) in raw {
            let reasons: Vec<RejectReason> = serde_json::from_str(&reasons_json)?;
            rows.push(RejectedRow {
                transaction_id,
                customer_id,
                amount,
                reasons,
            });
        }
        Ok(rows)
    }

    // ── Gold summaries ─────────────────────────────────────────

    pub fn insert_customer_summary(
        &self,
        run_id: &str,
        summary: &CustomerSummary,
    ) -> PipelineResult<()> {
        self.conn.execute(
            "INSERT INTO customer_summary
             (run_id, customer_id, txn_count, total_amount,
              mean_amount, fraud_count, fraud_rate)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                run_id,
                summary.customer_id,
                summary.txn_count as i64,
                summary.total_amount,
                summary.mean_amount,
                summary.fraud_count as i64,
                summary.fraud_rate,
            ],
        )?;
        Ok(())
    }

    pub fn insert_category_summary(
        &self,
        run_id: &str,
        summary: &CategorySummary,
    ) -> PipelineResult<()> {
        self.conn.execute(
            "INSERT INTO category_summary
             (run_id, category, txn_count, total_amount,
              mean_amount, fraud_count, fraud_rate)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                run_id,
                summary.category,
                summary.txn_count as i64,
                summary.total_amount,
                summary.mean_amount,
                summary.fraud_count as i64,
                summary.fraud_rate,
            ],
        )?;
        Ok(())
    }

    pub fn customer_summary_count(&self, run_id: &str) -> PipelineResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM customer_summary WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn category_summary_count(&self, run_id: &str) -> PipelineResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM category_summary WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn customer_summaries(&self, run_id: &str) -> PipelineResult<Vec<CustomerSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT customer_id, txn_count, total_amount,
                    mean_amount, fraud_count, fraud_rate
             FROM customer_summary WHERE run_id = ?1
             ORDER BY customer_id ASC",
        )?;
        let summaries = stmt
            .query_map(params![run_id], |row| {
                Ok(CustomerSummary {
                    customer_id: row.get(0)?,
                    txn_count: row.get::<_, i64>(1)? as u64,
                    total_amount: row.get(2)?,
                    mean_amount: row.get(3)?,
                    fraud_count: row.get::<_, i64>(4)? as u64,
                    fraud_rate: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(summaries)
    }

    pub fn category_summaries(&self, run_id: &str) -> PipelineResult<Vec<CategorySummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT category, txn_count, total_amount,
                    mean_amount, fraud_count, fraud_rate
             FROM category_summary WHERE run_id = ?1
             ORDER BY category ASC",
        )?;
        let summaries = stmt
            .query_map(params![run_id], |row| {
                Ok(CategorySummary {
                    category: row.get(0)?,
                    txn_count: row.get::<_, i64>(1)? as u64,
                    total_amount: row.get(2)?,
                    mean_amount: row.get(3)?,
                    fraud_count: row.get::<_, i64>(4)? as u64,
                    fraud_rate: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(summaries)
    }

    // ── Insight report ─────────────────────────────────────────

    pub fn save_report(
        &self,
        run_id: &str,
        report: &str,
        created_at: &str,
    ) -> PipelineResult<()> {
        self.conn.execute(
            "INSERT INTO insight_report (run_id, report, created_at)
             VALUES (?1, ?2, ?3)",
            params![run_id, report, created_at],
        )?;
        Ok(())
    }

    pub fn report(&self, run_id: &str) -> PipelineResult<Option<String>> {
        let report = self
            .conn
            .query_row(
                "SELECT report FROM insight_report WHERE run_id = ?1",
                params![run_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(report)
    }
}
