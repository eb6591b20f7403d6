use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the expense ingest crates.
#[derive(Error, Debug)]
pub enum ExpenseError {
    /// The spreadsheet source could not be reached, opened or decoded.
    #[error("Spreadsheet source unavailable: {0}")]
    SourceUnavailable(String),

    /// The source has fewer sheets than the expected workbook layout.
    #[error("Expected at least {expected} sheets, found {found}")]
    StructuralMismatch { expected: usize, found: usize },

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A validated entity was built with values that break its invariants.
    #[error("Invalid expense: {0}")]
    InvalidEntity(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ExpenseError {
    /// Wrap any displayable failure as [`ExpenseError::SourceUnavailable`].
    pub fn unavailable(reason: impl std::fmt::Display) -> Self {
        Self::SourceUnavailable(reason.to_string())
    }
}

/// Convenience alias used throughout the expense crates.
pub type Result<T> = std::result::Result<T, ExpenseError>;
