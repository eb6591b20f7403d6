//! Plain-text and JSON renderings of the expense table.

use std::fmt::Write as _;

use expense_core::formatting::{format_currency, format_date, percentage};
use expense_core::models::ExpenseEntity;
use expense_core::raw::Column;
use expense_data::aggregator::MonthSummary;

/// Shown when there is nothing to report.
pub const NO_DATA_MESSAGE: &str = "Nessun dato disponibile.";

const SEPARATOR: &str = "  ";

// ── Table ──────────────────────────────────────────────────────────────────────

/// One line per expense for `month`, followed by a totals line.
pub fn render_table(month: &str, entries: &[&ExpenseEntity]) -> String {
    if entries.is_empty() {
        return format!("{month}: {NO_DATA_MESSAGE}\n");
    }

    let headers = [
        Column::Date.label(),
        Column::Name.label(),
        Column::Type.label(),
        Column::Country.label(),
        Column::Total.label(),
        Column::Note.label(),
    ];

    let rows: Vec<[String; 6]> = entries
        .iter()
        .map(|e| {
            [
                format_date(e.date()),
                e.name().to_string(),
                e.category().to_string(),
                e.country().to_string(),
                format_currency(e.amount()),
                e.note().to_string(),
            ]
        })
        .collect();

    let mut widths = headers.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let _ = writeln!(out, "Spese {month}");
    push_line(&mut out, &headers.map(String::from), &widths);
    let rule: usize = widths.iter().sum::<usize>() + SEPARATOR.len() * (widths.len() - 1);
    let _ = writeln!(out, "{}", "-".repeat(rule));
    for row in &rows {
        push_line(&mut out, row, &widths);
    }

    let total: f64 = entries.iter().map(|e| e.amount()).sum();
    let _ = writeln!(out, "{}", "-".repeat(rule));
    let _ = writeln!(
        out,
        "Totale: {} ({} spese)",
        format_currency(total),
        entries.len()
    );
    out
}

/// Pad every cell to its column width; the amount column is right-aligned.
fn push_line(out: &mut String, cells: &[String; 6], widths: &[usize; 6]) {
    let line = cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, &w))| {
            if i == 4 {
                format!("{cell:>w$}")
            } else {
                format!("{cell:<w$}")
            }
        })
        .collect::<Vec<_>>()
        .join(SEPARATOR);
    let _ = writeln!(out, "{}", line.trim_end());
}

// ── JSON ───────────────────────────────────────────────────────────────────────

/// Pretty-printed JSON array of `entries`.
pub fn render_json(entries: &[&ExpenseEntity]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(entries)
}

// ── Summary ────────────────────────────────────────────────────────────────────

/// Per-month totals with macro-category breakdown and budget overruns.
pub fn render_summary(months: &[MonthSummary], daily_budget: f64) -> String {
    if months.is_empty() {
        return format!("{NO_DATA_MESSAGE}\n");
    }

    let mut out = String::new();
    for (i, month) in months.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "== {} ==", month.period_key);
        let _ = writeln!(
            out,
            "Totale: {} ({} spese, {} giorni)",
            format_currency(month.total),
            month.count,
            month.active_days()
        );
        let _ = writeln!(out, "Media giornaliera: {}", format_currency(month.average_per_day()));
        let _ = writeln!(
            out,
            "Giorni sopra il budget ({}): {}",
            format_currency(daily_budget),
            month.days_over_budget(daily_budget)
        );

        let mut categories: Vec<(&String, &f64)> = month.by_macro_category.iter().collect();
        categories.sort_by(|a, b| b.1.total_cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (name, amount) in categories {
            let _ = writeln!(
                out,
                "  {:<12} {:>14} {:>6.1}%",
                name,
                format_currency(*amount),
                percentage(*amount, month.total, 1)
            );
        }
    }
    out
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use expense_core::categories::MacroCategoryMap;
    use expense_data::aggregator::ExpenseAggregator;

    fn entry(date: &str, name: &str, amount: f64, category: &str, note: &str) -> ExpenseEntity {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        ExpenseEntity::new(name, amount, date, category, "Perù", note).unwrap()
    }

    fn sample() -> Vec<ExpenseEntity> {
        vec![
            entry("2024-06-10", "Ostello Lima", 30.0, "Ostello", "10/06-11/06 (Day 1/1)"),
            entry("2024-06-10", "Cena", 12.5, "Ristorante", ""),
            entry("2024-06-11", "Bus Cusco", 1234.0, "Bus", ""),
        ]
    }

    #[test]
    fn test_render_table_rows_and_total() {
        let entries = sample();
        let refs: Vec<&ExpenseEntity> = entries.iter().collect();
        let out = render_table("2024-06", &refs);

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Spese 2024-06");
        assert!(lines[1].starts_with("Data"));
        assert!(lines[1].contains("Totale"));
        assert!(lines[3].starts_with("10/06/2024"));
        assert!(lines[3].contains("€ 30.00"));
        assert!(lines[5].contains("€ 1,234.00"));
        assert_eq!(*lines.last().unwrap(), "Totale: € 1,276.50 (3 spese)");
    }

    #[test]
    fn test_render_table_aligns_amounts() {
        let entries = sample();
        let refs: Vec<&ExpenseEntity> = entries.iter().collect();
        let out = render_table("2024-06", &refs);

        // Right-aligned amounts end at the same column.
        let ends: Vec<usize> = out
            .lines()
            .skip(3)
            .zip(&entries)
            .map(|(line, e)| {
                let amount = format_currency(e.amount());
                line.find(&amount).unwrap() + amount.len()
            })
            .collect();
        assert_eq!(ends.len(), 3);
        assert!(ends.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_render_table_empty() {
        assert_eq!(render_table("2024-06", &[]), "2024-06: Nessun dato disponibile.\n");
    }

    #[test]
    fn test_render_json() {
        let entries = sample();
        let refs: Vec<&ExpenseEntity> = entries.iter().take(1).collect();
        let json = render_json(&refs).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["name"], "Ostello Lima");
        assert_eq!(value[0]["amount"], 30.0);
        assert_eq!(value[0]["date"], "2024-06-10");
        assert_eq!(value[0]["category"], "Ostello");
    }

    #[test]
    fn test_render_summary() {
        let months = ExpenseAggregator::aggregate_monthly(&sample(), &MacroCategoryMap::default());
        let out = render_summary(&months, 30.0);

        assert!(out.starts_with("== 2024-06 ==\n"));
        assert!(out.contains("Totale: € 1,276.50 (3 spese, 2 giorni)"));
        assert!(out.contains("Media giornaliera: € 638.25"));
        assert!(out.contains("Giorni sopra il budget (€ 30.00): 2"));

        // Largest macro-category first.
        let trasporti = out.find("Trasporti").unwrap();
        let alloggio = out.find("Alloggio").unwrap();
        let cibo = out.find("Cibo").unwrap();
        assert!(trasporti < alloggio && alloggio < cibo);
    }

    #[test]
    fn test_render_summary_empty() {
        assert_eq!(render_summary(&[], 30.0), "Nessun dato disponibile.\n");
    }
}
