//! Monthly aggregation of ingested expenses.
//!
//! Consumers of the pipeline output use this to build per-month summaries;
//! the category → macro-category map is passed in, never looked up globally.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use expense_core::categories::MacroCategoryMap;
use expense_core::models::ExpenseEntity;

// ── MonthSummary ──────────────────────────────────────────────────────────────

/// Totals for one calendar month.
#[derive(Debug, Clone, Default)]
pub struct MonthSummary {
    /// `"YYYY-MM"`.
    pub period_key: String,
    pub total: f64,
    pub count: usize,
    /// Total per calendar day, sorted by date.
    pub daily_totals: BTreeMap<NaiveDate, f64>,
    /// Total per macro-category, sorted by name.
    pub by_macro_category: BTreeMap<String, f64>,
}

impl MonthSummary {
    fn new(period_key: impl Into<String>) -> Self {
        Self {
            period_key: period_key.into(),
            ..Default::default()
        }
    }

    fn add(&mut self, entry: &ExpenseEntity, categories: &MacroCategoryMap) {
        self.total += entry.amount();
        self.count += 1;
        *self.daily_totals.entry(entry.date()).or_default() += entry.amount();
        *self
            .by_macro_category
            .entry(categories.macro_for(entry.category()).to_string())
            .or_default() += entry.amount();
    }

    /// Number of distinct days with at least one expense.
    pub fn active_days(&self) -> usize {
        self.daily_totals.len()
    }

    /// Average spend per active day; `0.0` for an empty month.
    pub fn average_per_day(&self) -> f64 {
        match self.active_days() {
            0 => 0.0,
            days => self.total / days as f64,
        }
    }

    /// Days whose total is strictly above `budget`.
    pub fn days_over_budget(&self, budget: f64) -> usize {
        self.daily_totals.values().filter(|t| **t > budget).count()
    }
}

// ── ExpenseAggregator ─────────────────────────────────────────────────────────

/// Stateless helper grouping expenses by month.
pub struct ExpenseAggregator;

impl ExpenseAggregator {
    /// Aggregate `entries` by `YYYY-MM`, sorted ascending.
    pub fn aggregate_monthly(
        entries: &[ExpenseEntity],
        categories: &MacroCategoryMap,
    ) -> Vec<MonthSummary> {
        let mut map: BTreeMap<String, MonthSummary> = BTreeMap::new();

        for entry in entries {
            let key = Self::month_key(entry.date());
            map.entry(key.clone())
                .or_insert_with(|| MonthSummary::new(key))
                .add(entry, categories);
        }

        map.into_values().collect()
    }

    /// Distinct months present in `entries`, ascending.
    pub fn months(entries: &[ExpenseEntity]) -> Vec<String> {
        entries
            .iter()
            .map(|e| Self::month_key(e.date()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Entries dated within `month` (`YYYY-MM`), sorted by date.
    ///
    /// The sort is stable, so same-day entries keep pipeline order.
    pub fn entries_in_month<'a>(entries: &'a [ExpenseEntity], month: &str) -> Vec<&'a ExpenseEntity> {
        let mut selected: Vec<&ExpenseEntity> = entries
            .iter()
            .filter(|e| Self::month_key(e.date()) == month)
            .collect();
        selected.sort_by_key(|e| e.date());
        selected
    }

    fn month_key(date: NaiveDate) -> String {
        date.format("%Y-%m").to_string()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
