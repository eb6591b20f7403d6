//! Time-boxed memoization of the expense pipeline.
//!
//! The whole dataset is cached under one fixed key, so repeated reads within
//! the window (re-selecting a month, switching views) do not hit the
//! spreadsheet source again. A failed fetch produces an empty table that is
//! cached like any other result; there is no retry.

use chrono::{DateTime, Duration, Utc};
use expense_core::models::ExpenseTable;
use expense_data::pipeline::ExpensePipeline;
use expense_data::source::SpreadsheetSource;

use crate::cache::ExpiringCache;

/// Cache key for the full dataset.
pub const DATASET_KEY: &str = "expenses";

/// Wall-clock source; injectable for tests.
pub type Clock = Box<dyn Fn() -> DateTime<Utc>>;

// ── DataManager ───────────────────────────────────────────────────────────────

/// Cached wrapper around an [`ExpensePipeline`].
///
/// # Example
/// ```no_run
/// use expense_data::pipeline::ExpensePipeline;
/// use expense_data::source::WorkbookFileSource;
/// use expense_runtime::data_manager::DataManager;
///
/// let pipeline = ExpensePipeline::new(WorkbookFileSource::new("viaggio.json"));
/// let mut mgr = DataManager::new(pipeline, 600);
/// println!("{} expenses", mgr.get_data(false).len());
/// ```
pub struct DataManager<S> {
    pipeline: ExpensePipeline<S>,
    cache: ExpiringCache<&'static str, ExpenseTable>,
    clock: Clock,
    last_error: Option<String>,
}

impl<S: SpreadsheetSource> DataManager<S> {
    /// Create a manager caching results for `cache_ttl_secs` seconds.
    ///
    /// TTLs beyond what `chrono` can represent are capped, so the cached
    /// dataset never expires.
    pub fn new(pipeline: ExpensePipeline<S>, cache_ttl_secs: u64) -> Self {
        Self {
            pipeline,
            cache: ExpiringCache::new(ttl_from_secs(cache_ttl_secs)),
            clock: Box::new(Utc::now),
            last_error: None,
        }
    }

    /// Replace the wall clock.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Return the dataset, fetching only when the cache is empty, expired,
    /// or `force_refresh` is set.
    pub fn get_data(&mut self, force_refresh: bool) -> &ExpenseTable {
        let now = (self.clock)();
        let pipeline = &self.pipeline;
        let last_error = &mut self.last_error;
        let mut fetched = false;

        let table = self
            .cache
            .get_or_refresh(DATASET_KEY, now, force_refresh, || {
                fetched = true;
                match pipeline.try_run() {
                    Ok(table) => {
                        tracing::debug!(rows = table.len(), "expense cache updated");
                        *last_error = None;
                        table
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "fetch failed; caching empty table");
                        *last_error = Some(e.to_string());
                        ExpenseTable::empty()
                    }
                }
            });

        if !fetched {
            tracing::debug!(key = DATASET_KEY, "returning cached expense table");
        }
        table
    }

    /// Discard the cached dataset so the next read fetches.
    pub fn invalidate_cache(&mut self) {
        if self.cache.invalidate(&DATASET_KEY) {
            tracing::debug!(key = DATASET_KEY, "cache invalidated");
        }
    }

    /// When the cached dataset expires, or `None` if nothing is cached.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.cache.expires_at(&DATASET_KEY)
    }

    /// Age of the cached dataset, or `None` if nothing is cached.
    pub fn cache_age(&self) -> Option<Duration> {
        self.cache
            .entry(&DATASET_KEY)
            .map(|entry| (self.clock)() - entry.stored_at)
    }

    /// Description of the last fetch failure, cleared by a successful fetch.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

fn ttl_from_secs(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
