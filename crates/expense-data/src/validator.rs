//! Raw row → [`ExpenseEntity`] validation.
//!
//! Two kinds of rejection exist. Blank rows and domestic expenses are noise
//! and are skipped silently; every other failure is a hard error for that
//! row only. Neither kind ever stops the batch.

use chrono::NaiveDate;
use expense_core::models::ExpenseEntity;
use expense_core::raw::{Column, RawRow, RawValue};
use thiserror::Error;

/// Country value (trimmed, lower-cased) that marks a domestic expense.
pub const DOMESTIC_COUNTRY: &str = "italia";

/// Glyphs stripped from textual amounts before parsing.
const CURRENCY_GLYPHS: [char; 3] = ['€', '$', '£'];

// ── RejectionReason ───────────────────────────────────────────────────────────

/// Why a raw row did not produce an entity.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RejectionReason {
    /// Both name and total are blank.
    #[error("blank row")]
    Blank,

    /// The row belongs to the domestic country.
    #[error("domestic expense")]
    Domestic,

    #[error("missing column {0}")]
    MissingField(Column),

    #[error("column {0} is empty")]
    EmptyField(Column),

    #[error("column {column} holds a {found} value")]
    WrongType { column: Column, found: &'static str },

    #[error("amount is not a number: {0:?}")]
    InvalidAmount(String),

    #[error("amount is negative: {0}")]
    NegativeAmount(f64),

    #[error("date is not DD/MM/YYYY: {0:?}")]
    InvalidDate(String),

    #[error("{0}")]
    InvalidEntity(String),
}

impl RejectionReason {
    /// `true` for the noise filters that are not validation failures.
    pub fn is_silent(&self) -> bool {
        matches!(self, RejectionReason::Blank | RejectionReason::Domestic)
    }
}

// ── RecordValidator ───────────────────────────────────────────────────────────

/// Stateless validator for expense sheet rows.
pub struct RecordValidator;

impl RecordValidator {
    /// Validate one raw row.
    pub fn validate(row: &RawRow) -> Result<ExpenseEntity, RejectionReason> {
        if row.is_blank(Column::Name) && row.is_blank(Column::Total) {
            return Err(RejectionReason::Blank);
        }
        if Self::is_domestic(row) {
            return Err(RejectionReason::Domestic);
        }

        let name = Self::required_text(row, Column::Name)?;
        let amount = Self::parse_amount(Self::required(row, Column::Total)?)?;
        let date = Self::parse_date(Self::required(row, Column::Date)?)?;
        let category = Self::required_text(row, Column::Type)?;
        let country = Self::text(Self::required(row, Column::Country)?, Column::Country)?;
        let note = match row.get(Column::Note) {
            None | Some(RawValue::Empty) => String::new(),
            Some(value) => Self::text(value, Column::Note)?,
        };

        ExpenseEntity::new(name, amount, date, category, country, note)
            .map_err(|e| RejectionReason::InvalidEntity(e.to_string()))
    }

    /// Coerce a total cell into a non-negative amount.
    ///
    /// Numbers are taken as-is. Text has currency glyphs and whitespace
    /// removed and `,` read as the decimal separator; an empty remainder is
    /// `0.0`.
    pub fn parse_amount(value: &RawValue) -> Result<f64, RejectionReason> {
        let amount = match value {
            RawValue::Number(n) => *n,
            RawValue::Empty => 0.0,
            RawValue::Text(s) => {
                let cleaned: String = s
                    .chars()
                    .filter(|c| !CURRENCY_GLYPHS.contains(c) && !c.is_whitespace())
                    .map(|c| if c == ',' { '.' } else { c })
                    .collect();
                if cleaned.is_empty() {
                    return Ok(0.0);
                }
                cleaned
                    .parse::<f64>()
                    .map_err(|_| RejectionReason::InvalidAmount(s.clone()))?
            }
            other => {
                return Err(RejectionReason::WrongType {
                    column: Column::Total,
                    found: other.kind(),
                })
            }
        };

        if !amount.is_finite() {
            return Err(RejectionReason::InvalidAmount(amount.to_string()));
        }
        if amount < 0.0 {
            return Err(RejectionReason::NegativeAmount(amount));
        }
        Ok(amount)
    }

    /// Coerce a date cell. Text must be exactly `DD/MM/YYYY`.
    pub fn parse_date(value: &RawValue) -> Result<NaiveDate, RejectionReason> {
        match value {
            RawValue::Date(d) => Ok(*d),
            RawValue::DateTime(dt) => Ok(dt.date()),
            RawValue::Text(s) => {
                Self::parse_dmy(s.trim()).ok_or_else(|| RejectionReason::InvalidDate(s.clone()))
            }
            other => Err(RejectionReason::WrongType {
                column: Column::Date,
                found: other.kind(),
            }),
        }
    }

    // ── Private helpers ───────────────────────────────────────────────────

    fn is_domestic(row: &RawRow) -> bool {
        row.get(Column::Country)
            .and_then(RawValue::as_text)
            .map(|c| c.trim().to_lowercase() == DOMESTIC_COUNTRY)
            .unwrap_or(false)
    }

    fn required(row: &RawRow, column: Column) -> Result<&RawValue, RejectionReason> {
        row.get(column).ok_or(RejectionReason::MissingField(column))
    }

    fn text(value: &RawValue, column: Column) -> Result<String, RejectionReason> {
        match value {
            RawValue::Text(s) => Ok(s.trim().to_string()),
            RawValue::Empty => Ok(String::new()),
            other => Err(RejectionReason::WrongType {
                column,
                found: other.kind(),
            }),
        }
    }

    fn required_text(row: &RawRow, column: Column) -> Result<String, RejectionReason> {
        let text = Self::text(Self::required(row, column)?, column)?;
        if text.is_empty() {
            return Err(RejectionReason::EmptyField(column));
        }
        Ok(text)
    }

    /// Strict `DD/MM/YYYY`: two-digit day, two-digit month, four-digit year.
    fn parse_dmy(s: &str) -> Option<NaiveDate> {
        let mut parts = s.split('/');
        let (day, month, year) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }
        let all_digits = |p: &str, len: usize| p.len() == len && p.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(day, 2) || !all_digits(month, 2) || !all_digits(year, 4) {
            return None;
        }
        NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> RawRow {
        RawRow::from_json(&value).unwrap()
    }

    fn valid_row() -> RawRow {
        row(json!({
            "Nome": "Ostello Cusco",
            "Totale": "€ 45,00",
            "Data": "12/07/2024",
            "Tipo": "Ostello",
            "Paese": "Perù",
            "Note": "12/07-15/07",
        }))
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ── validate ──────────────────────────────────────────────────────────────

    #[test]
    fn test_validate_full_row() {
        let entity = RecordValidator::validate(&valid_row()).unwrap();
        assert_eq!(entity.name(), "Ostello Cusco");
        assert_eq!(entity.amount(), 45.0);
        assert_eq!(entity.date(), day(2024, 7, 12));
        assert_eq!(entity.category(), "Ostello");
        assert_eq!(entity.country(), "Perù");
        assert_eq!(entity.note(), "12/07-15/07");
    }

    #[test]
    fn test_validate_blank_row_is_silent() {
        let reason = RecordValidator::validate(&row(json!({
            "Nome": "",
            "Totale": "",
            "Data": "nonsense",
        })))
        .unwrap_err();
        assert_eq!(reason, RejectionReason::Blank);
        assert!(reason.is_silent());

        let missing = RecordValidator::validate(&RawRow::new()).unwrap_err();
        assert_eq!(missing, RejectionReason::Blank);
    }

    #[test]
    fn test_validate_domestic_row_is_silent() {
        for country in ["Italia", "  italia ", "ITALIA"] {
            let mut r = valid_row();
            r.insert("Paese", country);
            let reason = RecordValidator::validate(&r).unwrap_err();
            assert_eq!(reason, RejectionReason::Domestic, "country {country:?}");
            assert!(reason.is_silent());
        }
    }

    #[test]
    fn test_validate_domestic_even_when_invalid() {
        let reason = RecordValidator::validate(&row(json!({
            "Nome": "Caffè",
            "Totale": "abc",
            "Paese": " Italia",
        })))
        .unwrap_err();
        assert_eq!(reason, RejectionReason::Domestic);
    }

    #[test]
    fn test_validate_missing_note_defaults_to_empty() {
        let r = row(json!({
            "Nome": "Bus",
            "Totale": 3,
            "Data": "01/08/2024",
            "Tipo": "Bus",
            "Paese": "Bolivia",
        }));
        let entity = RecordValidator::validate(&r).unwrap();
        assert_eq!(entity.note(), "");
        assert_eq!(entity.amount(), 3.0);
    }

    #[test]
    fn test_validate_missing_required_column() {
        let r = row(json!({
            "Nome": "Treno",
            "Totale": 20,
            "Tipo": "Treno",
            "Paese": "Perù",
        }));
        assert_eq!(
            RecordValidator::validate(&r).unwrap_err(),
            RejectionReason::MissingField(Column::Date)
        );
    }

    #[test]
    fn test_validate_empty_name_with_total_is_hard_error() {
        let mut r = valid_row();
        r.insert("Nome", "");
        let reason = RecordValidator::validate(&r).unwrap_err();
        assert_eq!(reason, RejectionReason::EmptyField(Column::Name));
        assert!(!reason.is_silent());
    }

    #[test]
    fn test_validate_empty_category_is_hard_error() {
        let mut r = valid_row();
        r.insert("Tipo", " ");
        assert_eq!(
            RecordValidator::validate(&r).unwrap_err(),
            RejectionReason::EmptyField(Column::Type)
        );
    }

    #[test]
    fn test_validate_numeric_name_is_wrong_type() {
        let mut r = valid_row();
        r.insert("Nome", 42.0);
        assert!(matches!(
            RecordValidator::validate(&r).unwrap_err(),
            RejectionReason::WrongType {
                column: Column::Name,
                ..
            }
        ));
    }

    #[test]
    fn test_validate_structured_date() {
        let mut r = valid_row();
        r.insert("Data", day(2024, 3, 5));
        assert_eq!(RecordValidator::validate(&r).unwrap().date(), day(2024, 3, 5));
    }

    // ── parse_amount ──────────────────────────────────────────────────────────

    #[test]
    fn test_parse_amount_comma_decimal() {
        assert_eq!(RecordValidator::parse_amount(&"12,50".into()), Ok(12.5));
    }

    #[test]
    fn test_parse_amount_currency_glyph_and_spaces() {
        assert_eq!(RecordValidator::parse_amount(&"€ 7,00".into()), Ok(7.0));
        assert_eq!(RecordValidator::parse_amount(&"1 200,5 €".into()), Ok(1200.5));
        assert_eq!(RecordValidator::parse_amount(&"\u{a0}9,90".into()), Ok(9.9));
    }

    #[test]
    fn test_parse_amount_empty_is_zero() {
        assert_eq!(RecordValidator::parse_amount(&"".into()), Ok(0.0));
        assert_eq!(RecordValidator::parse_amount(&"€ ".into()), Ok(0.0));
        assert_eq!(RecordValidator::parse_amount(&RawValue::Empty), Ok(0.0));
    }

    #[test]
    fn test_parse_amount_non_numeric_is_error() {
        assert_eq!(
            RecordValidator::parse_amount(&"abc".into()),
            Err(RejectionReason::InvalidAmount("abc".to_string()))
        );
        assert!(RecordValidator::parse_amount(&"1.234,50".into()).is_err());
    }

    #[test]
    fn test_parse_amount_rejects_non_finite() {
        assert!(RecordValidator::parse_amount(&"nan".into()).is_err());
        assert!(RecordValidator::parse_amount(&"inf".into()).is_err());
        assert!(RecordValidator::parse_amount(&RawValue::Number(f64::INFINITY)).is_err());
    }

    #[test]
    fn test_parse_amount_rejects_negative() {
        assert_eq!(
            RecordValidator::parse_amount(&RawValue::Number(-4.0)),
            Err(RejectionReason::NegativeAmount(-4.0))
        );
        assert!(RecordValidator::parse_amount(&"-3,00".into()).is_err());
    }

    #[test]
    fn test_parse_amount_numeric_passthrough() {
        assert_eq!(RecordValidator::parse_amount(&RawValue::Number(18.75)), Ok(18.75));
    }

    #[test]
    fn test_parse_amount_rejects_date() {
        let value = RawValue::Date(day(2024, 1, 1));
        assert!(matches!(
            RecordValidator::parse_amount(&value),
            Err(RejectionReason::WrongType { .. })
        ));
    }

    // ── parse_date ────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_date_day_month_year() {
        assert_eq!(
            RecordValidator::parse_date(&"05/03/2024".into()),
            Ok(day(2024, 3, 5))
        );
    }

    #[test]
    fn test_parse_date_rejects_iso() {
        assert_eq!(
            RecordValidator::parse_date(&"2024-03-05".into()),
            Err(RejectionReason::InvalidDate("2024-03-05".to_string()))
        );
    }

    #[test]
    fn test_parse_date_is_strict_on_widths() {
        assert!(RecordValidator::parse_date(&"5/3/2024".into()).is_err());
        assert!(RecordValidator::parse_date(&"05/03/24".into()).is_err());
        assert!(RecordValidator::parse_date(&"05/03/2024/1".into()).is_err());
    }

    #[test]
    fn test_parse_date_rejects_impossible_dates() {
        assert!(RecordValidator::parse_date(&"31/02/2024".into()).is_err());
        assert!(RecordValidator::parse_date(&"29/02/2023".into()).is_err());
        assert!(RecordValidator::parse_date(&"29/02/2024".into()).is_ok());
    }

    #[test]
    fn test_parse_date_rejects_number() {
        assert!(RecordValidator::parse_date(&RawValue::Number(45000.0)).is_err());
    }

    #[test]
    fn test_parse_date_datetime_keeps_date() {
        let dt = day(2024, 3, 5).and_hms_opt(18, 30, 0).unwrap();
        assert_eq!(
            RecordValidator::parse_date(&RawValue::DateTime(dt)),
            Ok(day(2024, 3, 5))
        );
    }
}
