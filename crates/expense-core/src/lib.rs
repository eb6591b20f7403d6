//! Domain layer for the travel expense ingest workspace.
//!
//! Holds the validated [`models::ExpenseEntity`], the loosely-typed
//! [`raw::RawRow`] delivered by spreadsheet sources, the category tables,
//! the shared error type, CLI settings and display formatting helpers.

pub mod categories;
pub mod error;
pub mod formatting;
pub mod models;
pub mod raw;
pub mod settings;

pub use error::{ExpenseError, Result};
