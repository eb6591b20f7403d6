//! Category tables shared between the pipeline and the reporting layer.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{ExpenseError, Result};

/// Categories whose charges cover a stay and may be split per night.
pub const LODGING_CATEGORIES: [&str; 4] = ["Ostello", "Albergo", "Appartamento", "Alloggio - Altro"];

/// Macro-category assigned to any category missing from the map.
pub const UNMAPPED_MACRO_CATEGORY: &str = "Altro";

/// `true` when `category` is one of [`LODGING_CATEGORIES`] (exact match).
pub fn is_lodging(category: &str) -> bool {
    LODGING_CATEGORIES.contains(&category)
}

const DEFAULT_MACRO_CATEGORIES: &[(&str, &str)] = &[
    ("Ostello", "Alloggio"),
    ("Albergo", "Alloggio"),
    ("Appartamento", "Alloggio"),
    ("Alloggio - Altro", "Alloggio"),
    ("Ristorante", "Cibo"),
    ("Supermercato", "Cibo"),
    ("Street food", "Cibo"),
    ("Bar", "Cibo"),
    ("Cibo - Altro", "Cibo"),
    ("Aereo", "Trasporti"),
    ("Treno", "Trasporti"),
    ("Bus", "Trasporti"),
    ("Taxi", "Trasporti"),
    ("Traghetto", "Trasporti"),
    ("Trasporti - Altro", "Trasporti"),
    ("Museo", "Attività"),
    ("Escursione", "Attività"),
    ("Attività - Altro", "Attività"),
    ("Visto", "Burocrazia"),
    ("Assicurazione", "Burocrazia"),
    ("SIM", "Servizi"),
    ("Lavanderia", "Servizi"),
];

/// Read-only category → macro-category lookup.
///
/// Built once and handed to whichever consumer needs it; the pipeline itself
/// never consults it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroCategoryMap {
    entries: HashMap<String, String>,
}

impl MacroCategoryMap {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    /// Load a `{"category": "macro"}` JSON object from `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ExpenseError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let entries: HashMap<String, String> = serde_json::from_str(&content)?;
        Ok(Self::new(entries))
    }

    /// Macro-category for `category`, or [`UNMAPPED_MACRO_CATEGORY`].
    pub fn macro_for<'a>(&'a self, category: &str) -> &'a str {
        self.entries
            .get(category)
            .map(String::as_str)
            .unwrap_or(UNMAPPED_MACRO_CATEGORY)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MacroCategoryMap {
    fn default() -> Self {
        let entries = DEFAULT_MACRO_CATEGORIES
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self::new(entries)
    }
}
