//! Loosely-typed rows as delivered by a spreadsheet source.
//!
//! A [`RawRow`] maps localized column labels to [`RawValue`] cells. Nothing
//! here is validated; that is the job of the record validator.

use std::collections::HashMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

// ── Column ────────────────────────────────────────────────────────────────────

/// The columns an expense sheet is expected to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Name,
    Total,
    Date,
    Type,
    Country,
    Note,
}

impl Column {
    /// Header label used in the source spreadsheet.
    pub fn label(self) -> &'static str {
        match self {
            Column::Name => "Nome",
            Column::Total => "Totale",
            Column::Date => "Data",
            Column::Type => "Tipo",
            Column::Country => "Paese",
            Column::Note => "Note",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── RawValue ──────────────────────────────────────────────────────────────────

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Present but blank.
    Empty,
    Text(String),
    Number(f64),
    /// Structured calendar date.
    Date(NaiveDate),
    /// Structured date and time.
    DateTime(NaiveDateTime),
}

impl RawValue {
    /// `true` for blank cells, whitespace-only text and the number zero.
    pub fn is_blank(&self) -> bool {
        match self {
            RawValue::Empty => true,
            RawValue::Text(s) => s.trim().is_empty(),
            RawValue::Number(n) => *n == 0.0,
            RawValue::Date(_) | RawValue::DateTime(_) => false,
        }
    }

    /// Short name of the cell kind, used in rejection messages.
    pub fn kind(&self) -> &'static str {
        match self {
            RawValue::Empty => "empty",
            RawValue::Text(_) => "text",
            RawValue::Number(_) => "number",
            RawValue::Date(_) => "date",
            RawValue::DateTime(_) => "datetime",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<NaiveDate> for RawValue {
    fn from(value: NaiveDate) -> Self {
        RawValue::Date(value)
    }
}

impl From<NaiveDateTime> for RawValue {
    fn from(value: NaiveDateTime) -> Self {
        RawValue::DateTime(value)
    }
}

impl From<&Value> for RawValue {
    /// Map a JSON cell to a [`RawValue`].
    ///
    /// * `null` → `Empty`
    /// * string → `Text`, number → `Number`, bool → `Text`
    /// * `{"date": "YYYY-MM-DD"}` → `Date`
    /// * `{"datetime": "YYYY-MM-DDTHH:MM:SS"}` → `DateTime`
    ///
    /// Anything else becomes `Text` holding the JSON rendering, which the
    /// validator will then reject where a typed value is required.
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => RawValue::Empty,
            Value::String(s) => RawValue::Text(s.clone()),
            Value::Number(n) => n
                .as_f64()
                .map(RawValue::Number)
                .unwrap_or_else(|| RawValue::Text(n.to_string())),
            Value::Bool(b) => RawValue::Text(b.to_string()),
            Value::Object(map) if map.len() == 1 => {
                if let Some(date) = map
                    .get("date")
                    .and_then(Value::as_str)
                    .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                {
                    return RawValue::Date(date);
                }
                if let Some(dt) = map
                    .get("datetime")
                    .and_then(Value::as_str)
                    .and_then(|s| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").ok())
                {
                    return RawValue::DateTime(dt);
                }
                RawValue::Text(value.to_string())
            }
            other => RawValue::Text(other.to_string()),
        }
    }
}

// ── RawRow ────────────────────────────────────────────────────────────────────

/// One untyped spreadsheet row keyed by header label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: HashMap<String, RawValue>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert keyed by a known [`Column`].
    pub fn with(mut self, column: Column, value: impl Into<RawValue>) -> Self {
        self.insert(column.label(), value);
        self
    }

    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<RawValue>) {
        self.cells.insert(label.into(), value.into());
    }

    /// The cell under `column`, or `None` when the key is absent.
    pub fn get(&self, column: Column) -> Option<&RawValue> {
        self.cells.get(column.label())
    }

    /// `true` when `column` is absent or blank.
    pub fn is_blank(&self, column: Column) -> bool {
        self.get(column).map(RawValue::is_blank).unwrap_or(true)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Build a row from a JSON object; returns `None` for non-object values.
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let cells = object
            .iter()
            .map(|(k, v)| (k.clone(), RawValue::from(v)))
            .collect();
        Some(Self { cells })
    }
}

impl<K: Into<String>, V: Into<RawValue>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
