//! Per-night expansion of lodging charges.
//!
//! A lodging expense whose note carries a `DD/MM-DD/MM` stay range is
//! replaced by one entry per night, each holding an even share of the
//! original amount. Shares are plain float division; the daughters sum to
//! the original within floating-point tolerance.

use std::sync::OnceLock;

use chrono::{Datelike, Local, NaiveDate};
use expense_core::categories::is_lodging;
use expense_core::models::ExpenseEntity;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

fn range_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d{1,2})/(\d{1,2})-(\d{1,2})/(\d{1,2})").expect("stay range pattern is valid")
    })
}

// ── SplitError ────────────────────────────────────────────────────────────────

/// Why a note did not yield a usable stay range.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SplitError {
    #[error("no DD/MM-DD/MM range in note")]
    NoRange,

    #[error("{day:02}/{month:02} is not a valid date in {year}")]
    InvalidDay { day: u32, month: u32, year: i32 },

    #[error("stay range covers no nights")]
    EmptySpan,
}

// ── StayRange ─────────────────────────────────────────────────────────────────

/// A resolved stay: `start` inclusive, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl StayRange {
    /// Number of nights covered.
    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Every night of the stay, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take_while({
            let end = self.end;
            move |d| *d < end
        })
    }
}

// ── AccommodationSplitter ─────────────────────────────────────────────────────

/// Expands lodging entities into per-night entities.
#[derive(Debug, Clone, Copy)]
pub struct AccommodationSplitter {
    reference_year: i32,
}

impl AccommodationSplitter {
    /// Splitter resolving ranges against `reference_year`.
    pub fn new(reference_year: i32) -> Self {
        Self { reference_year }
    }

    /// Splitter resolving ranges against the current local year.
    pub fn for_current_year() -> Self {
        Self::new(Local::now().year())
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    /// Split a lodging entity into one entity per night.
    ///
    /// Returns `None` when the entity is not a lodging expense or its note
    /// has no resolvable range; the caller keeps the original in that case.
    pub fn expand(&self, entity: &ExpenseEntity) -> Option<Vec<ExpenseEntity>> {
        if !is_lodging(entity.category()) {
            return None;
        }

        let range = match self.resolve_range(entity.note()) {
            Ok(range) => range,
            Err(reason) => {
                debug!(name = entity.name(), note = entity.note(), %reason, "lodging kept unsplit");
                return None;
            }
        };

        let nights = range.nights();
        let daily_amount = entity.amount() / nights as f64;

        let daughters = range
            .days()
            .enumerate()
            .map(|(i, date)| {
                entity
                    .clone()
                    .with_date(date)
                    .with_amount(daily_amount)
                    .with_note(format!("{} (Day {}/{})", entity.note(), i + 1, nights))
            })
            .collect();

        Some(daughters)
    }

    /// Find and resolve the first stay range in `note`.
    ///
    /// An end date before the start rolls into the following year.
    pub fn resolve_range(&self, note: &str) -> Result<StayRange, SplitError> {
        let caps = range_pattern().captures(note).ok_or(SplitError::NoRange)?;
        let num = |i: usize| caps[i].parse::<u32>().map_err(|_| SplitError::NoRange);

        let start = self.resolve_day(num(1)?, num(2)?, self.reference_year)?;
        let (end_day, end_month) = (num(3)?, num(4)?);
        let mut end = self.resolve_day(end_day, end_month, self.reference_year)?;

        if end < start {
            end = self.resolve_day(end_day, end_month, self.reference_year + 1)?;
        }

        let range = StayRange { start, end };
        if range.nights() <= 0 {
            return Err(SplitError::EmptySpan);
        }
        Ok(range)
    }

    fn resolve_day(&self, day: u32, month: u32, year: i32) -> Result<NaiveDate, SplitError> {
        NaiveDate::from_ymd_opt(year, month, day).ok_or(SplitError::InvalidDay { day, month, year })
    }
}

impl Default for AccommodationSplitter {
    fn default() -> Self {
        Self::for_current_year()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
