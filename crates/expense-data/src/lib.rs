//! Ingest layer for travel expenses.
//!
//! Reads worksheets from a spreadsheet source, validates each raw row,
//! expands multi-night lodging charges into per-night entries and returns a
//! flat [`expense_core::models::ExpenseTable`]. Also provides the monthly
//! aggregation used by reporting consumers.

pub mod aggregator;
pub mod pipeline;
pub mod source;
pub mod splitter;
pub mod validator;

pub use expense_core as core;
