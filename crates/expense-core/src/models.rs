use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ExpenseError, Result};

/// A single validated expense.
///
/// Values are immutable once built: the `with_*` methods consume the entity
/// and return a modified copy, so daughter entries produced by the splitter
/// never alias their source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseEntity {
    name: String,
    amount: f64,
    date: NaiveDate,
    category: String,
    country: String,
    #[serde(default)]
    note: String,
}

impl ExpenseEntity {
    /// Build an entity, checking its invariants.
    ///
    /// Fails when `name` or `category` is blank, or when `amount` is negative
    /// or not finite.
    pub fn new(
        name: impl Into<String>,
        amount: f64,
        date: NaiveDate,
        category: impl Into<String>,
        country: impl Into<String>,
        note: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        let category = category.into();

        if name.trim().is_empty() {
            return Err(ExpenseError::InvalidEntity("name is empty".into()));
        }
        if category.trim().is_empty() {
            return Err(ExpenseError::InvalidEntity("category is empty".into()));
        }
        if !amount.is_finite() || amount < 0.0 {
            return Err(ExpenseError::InvalidEntity(format!(
                "amount must be a non-negative number, got {amount}"
            )));
        }

        Ok(Self {
            name,
            amount,
            date,
            category,
            country: country.into(),
            note: note.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    /// Copy with a different date.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    /// Copy with a different amount.
    ///
    /// Negative or non-finite values are clamped to `0.0` so the copy keeps
    /// the entity invariants.
    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = if amount.is_finite() && amount > 0.0 {
            amount
        } else {
            0.0
        };
        self
    }

    /// Copy with a different note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }
}

/// Counters collected during one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    /// Data sheets read (header and trailing sheets excluded).
    pub sheets_read: usize,
    /// Raw rows seen across all data sheets.
    pub rows_read: usize,
    /// Rows skipped because both name and total were blank.
    pub blank_skipped: usize,
    /// Rows skipped by the domestic-country filter.
    pub domestic_skipped: usize,
    /// Rows dropped by a hard validation error.
    pub rejected: usize,
    /// Lodging entities replaced by per-day entries.
    pub entities_split: usize,
    /// Per-day entries produced by splitting.
    pub daughters_created: usize,
}

/// The flat, ordered result of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseTable {
    /// Rows in sheet order, then in-sheet order.
    pub rows: Vec<ExpenseEntity>,
    /// When the run finished.
    pub generated_at: DateTime<Utc>,
    /// Run counters.
    pub stats: PipelineStats,
}

impl ExpenseTable {
    pub fn new(rows: Vec<ExpenseEntity>, stats: PipelineStats) -> Self {
        Self {
            rows,
            generated_at: Utc::now(),
            stats,
        }
    }

    /// A table with no rows, used when the source cannot be read.
    pub fn empty() -> Self {
        Self::new(Vec::new(), PipelineStats::default())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of all row amounts.
    pub fn total_amount(&self) -> f64 {
        self.rows.iter().map(ExpenseEntity::amount).sum()
    }
}

impl Default for ExpenseTable {
    fn default() -> Self {
        Self::empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
