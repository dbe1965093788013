//! Shared primitive types used across the entire pipeline.

/// The canonical pipeline-run identifier.
pub type RunId = String;

/// Transaction identifier as it appears in the source feed.
pub type TransactionId = String;

/// Customer identifier (card-number surrogate in the source feed).
pub type CustomerId = String;
