//! cardmill-core — the medallion pipeline for card-transaction analytics.
//!
//! STAGE ORDER (fixed, documented, never reordered):
//!   1. Bronze   — raw delimited source landed as a typed columnar table
//!   2. Silver   — row-level validation, valid/rejected split with reasons
//!   3. Gold     — per-customer and per-category aggregate views
//!   4. Insights — human-readable digest of the gold views
//!
//! RULES:
//!   - Data flows strictly forward; no stage mutates an upstream artifact.
//!   - Row-level quality violations are rejections with reason codes,
//!     never errors and never silent drops.
//!   - A bronze table missing schema columns is a fatal Schema error.
//!   - Only store.rs talks to the database.

pub mod bronze;
pub mod config;
pub mod error;
pub mod gold;
pub mod insights;
pub mod pipeline;
pub mod silver;
pub mod store;
pub mod types;
