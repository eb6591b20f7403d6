//! Runtime layer for the expense report.
//!
//! Wraps the ingestion pipeline in a time-boxed cache so consumers can read
//! the dataset repeatedly without refetching the spreadsheet.

pub mod cache;
pub mod data_manager;

pub use expense_core as core;
pub use expense_data as data;
