//! Ingest pipeline: fetch → validate → split → flatten.
//!
//! [`ExpensePipeline::run`] never fails. An unreachable source or a workbook
//! with too few sheets yields an empty [`ExpenseTable`]; bad rows are dropped
//! one at a time; unresolvable stay ranges keep the lodging entry whole.

use std::time::Instant;

use expense_core::categories::is_lodging;
use expense_core::error::{ExpenseError, Result};
use expense_core::models::{ExpenseEntity, ExpenseTable, PipelineStats};
use tracing::{debug, info, warn};

use crate::source::{SpreadsheetSource, Worksheet};
use crate::splitter::AccommodationSplitter;
use crate::validator::{RecordValidator, RejectionReason};

// ── SheetLayout ───────────────────────────────────────────────────────────────

/// Which sheets of the workbook hold expense rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLayout {
    /// Sheets skipped at the front (instructions).
    pub leading: usize,
    /// Sheets skipped at the back (summaries).
    pub trailing: usize,
    /// Fewer sheets than this means the workbook is not an expense sheet.
    pub min_sheets: usize,
}

impl SheetLayout {
    /// The interior data sheets, or a structural error.
    pub fn data_sheets<'a>(&self, sheets: &'a [Worksheet]) -> Result<&'a [Worksheet]> {
        if sheets.len() < self.min_sheets || sheets.len() < self.leading + self.trailing {
            return Err(ExpenseError::StructuralMismatch {
                expected: self.min_sheets.max(self.leading + self.trailing),
                found: sheets.len(),
            });
        }
        Ok(&sheets[self.leading..sheets.len() - self.trailing])
    }
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            leading: 1,
            trailing: 2,
            min_sheets: 4,
        }
    }
}

// ── ExpensePipeline ───────────────────────────────────────────────────────────

/// Sequential ingest pipeline over one spreadsheet source.
pub struct ExpensePipeline<S> {
    source: S,
    /// Fixed splitter; `None` resolves stay ranges in the year each run starts.
    splitter: Option<AccommodationSplitter>,
    layout: SheetLayout,
}

impl<S: SpreadsheetSource> ExpensePipeline<S> {
    /// Pipeline with the default layout, resolving stay ranges in the
    /// year each run starts.
    pub fn new(source: S) -> Self {
        Self {
            source,
            splitter: None,
            layout: SheetLayout::default(),
        }
    }

    /// Resolve stay ranges with `splitter` on every run.
    pub fn with_splitter(mut self, splitter: AccommodationSplitter) -> Self {
        self.splitter = Some(splitter);
        self
    }

    /// The pinned reference year, if any.
    pub fn reference_year(&self) -> Option<i32> {
        self.splitter.map(|s| s.reference_year())
    }

    pub fn with_layout(mut self, layout: SheetLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Run the pipeline, absorbing source failures into an empty table.
    pub fn run(&self) -> ExpenseTable {
        match self.try_run() {
            Ok(table) => table,
            Err(e) => {
                warn!(error = %e, "expense source could not be read; returning empty table");
                ExpenseTable::empty()
            }
        }
    }

    /// Run the pipeline, surfacing source and layout failures.
    pub fn try_run(&self) -> Result<ExpenseTable> {
        let started = Instant::now();
        let splitter = self
            .splitter
            .unwrap_or_else(AccommodationSplitter::for_current_year);

        let sheets = self.source.worksheets()?;
        let data_sheets = self.layout.data_sheets(&sheets)?;

        let mut stats = PipelineStats {
            sheets_read: data_sheets.len(),
            ..Default::default()
        };
        let mut rows: Vec<ExpenseEntity> = Vec::new();

        for sheet in data_sheets {
            for (index, raw) in sheet.rows.iter().enumerate() {
                stats.rows_read += 1;

                let entity = match RecordValidator::validate(raw) {
                    Ok(entity) => entity,
                    Err(reason) => {
                        record_rejection(&mut stats, &sheet.title, index, &reason);
                        continue;
                    }
                };

                expand_into(&splitter, entity, &mut rows, &mut stats);
            }
        }

        info!(
            sheets = stats.sheets_read,
            rows_read = stats.rows_read,
            rows_out = rows.len(),
            rejected = stats.rejected,
            split = stats.entities_split,
            reference_year = splitter.reference_year(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "expense pipeline finished"
        );

        Ok(ExpenseTable::new(rows, stats))
    }
}

/// Push `entity`, or its per-night daughters when it is a splittable stay.
fn expand_into(
    splitter: &AccommodationSplitter,
    entity: ExpenseEntity,
    rows: &mut Vec<ExpenseEntity>,
    stats: &mut PipelineStats,
) {
    if !is_lodging(entity.category()) {
        rows.push(entity);
        return;
    }

    match splitter.expand(&entity) {
        Some(daughters) => {
            stats.entities_split += 1;
            stats.daughters_created += daughters.len();
            rows.extend(daughters);
        }
        None => rows.push(entity),
    }
}

fn record_rejection(stats: &mut PipelineStats, sheet: &str, index: usize, reason: &RejectionReason) {
    match reason {
        RejectionReason::Blank => stats.blank_skipped += 1,
        RejectionReason::Domestic => stats.domestic_skipped += 1,
        _ => {
            stats.rejected += 1;
            debug!(sheet = sheet, row = index + 1, %reason, "row dropped");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
