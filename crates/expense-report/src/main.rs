mod bootstrap;
mod render;

use anyhow::{Context, Result};
use expense_core::categories::MacroCategoryMap;
use expense_core::models::ExpenseTable;
use expense_core::settings::Settings;
use expense_data::aggregator::ExpenseAggregator;
use expense_data::pipeline::ExpensePipeline;
use expense_data::source::open_source;
use expense_data::splitter::AccommodationSplitter;
use expense_runtime::data_manager::DataManager;

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Expense Report v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!("Format: {}, Cache TTL: {}s", settings.format, settings.cache_ttl);

    let source_path = settings.require_source()?;
    let source = open_source(source_path);

    let mut pipeline = ExpensePipeline::new(source);
    if let Some(year) = settings.reference_year {
        pipeline = pipeline.with_splitter(AccommodationSplitter::new(year));
    }
    let mut manager = DataManager::new(pipeline, settings.cache_ttl);

    let table = manager.get_data(false).clone();
    if let Some(error) = manager.last_error() {
        eprintln!("Impossibile leggere il foglio spese: {error}");
    }

    let categories = match &settings.categories {
        Some(path) => MacroCategoryMap::load_from(path)
            .with_context(|| format!("loading categories from {}", path.display()))?,
        None => MacroCategoryMap::default(),
    };

    print!("{}", report(&settings, &table, &categories)?);
    Ok(())
}

/// Render `table` in the configured format.
fn report(settings: &Settings, table: &ExpenseTable, categories: &MacroCategoryMap) -> Result<String> {
    if table.is_empty() {
        return Ok(format!("{}\n", render::NO_DATA_MESSAGE));
    }

    if settings.format == "summary" {
        let mut months = ExpenseAggregator::aggregate_monthly(&table.rows, categories);
        if let Some(month) = &settings.month {
            months.retain(|m| &m.period_key == month);
        }
        return Ok(render::render_summary(&months, settings.daily_budget));
    }

    let Some(month) = settings
        .month
        .clone()
        .or_else(|| ExpenseAggregator::months(&table.rows).pop())
    else {
        return Ok(format!("{}\n", render::NO_DATA_MESSAGE));
    };
    let entries = ExpenseAggregator::entries_in_month(&table.rows, &month);

    match settings.format.as_str() {
        "json" => Ok(format!("{}\n", render::render_json(&entries)?)),
        _ => Ok(render::render_table(&month, &entries)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use chrono::NaiveDate;
    use expense_core::models::{ExpenseEntity, PipelineStats};

    fn settings(args: &[&str]) -> Settings {
        let mut argv = vec!["expense-report"];
        argv.extend_from_slice(args);
        Settings::parse_from(argv)
    }

    fn table() -> ExpenseTable {
        let entry = |date: &str, amount: f64| {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
            ExpenseEntity::new("Cena", amount, date, "Ristorante", "Perù", "").unwrap()
        };
        ExpenseTable::new(
            vec![entry("2024-06-10", 10.0), entry("2024-07-01", 20.0)],
            PipelineStats::default(),
        )
    }

    #[test]
    fn test_report_defaults_to_latest_month() {
        let out = report(&settings(&[]), &table(), &MacroCategoryMap::default()).unwrap();
        assert!(out.starts_with("Spese 2024-07\n"));
        assert!(out.contains("€ 20.00"));
        assert!(!out.contains("€ 10.00"));
    }

    #[test]
    fn test_report_selected_month_json() {
        let args = settings(&["--format", "json", "--month", "2024-06"]);
        let out = report(&args, &table(), &MacroCategoryMap::default()).unwrap();

        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(1));
        assert_eq!(value[0]["amount"], 10.0);
    }

    #[test]
    fn test_report_summary_all_months() {
        let args = settings(&["--format", "summary"]);
        let out = report(&args, &table(), &MacroCategoryMap::default()).unwrap();
        assert!(out.contains("== 2024-06 =="));
        assert!(out.contains("== 2024-07 =="));
    }

    #[test]
    fn test_report_empty_table() {
        let out = report(&settings(&[]), &ExpenseTable::empty(), &MacroCategoryMap::default()).unwrap();
        assert_eq!(out, "Nessun dato disponibile.\n");
    }
}
