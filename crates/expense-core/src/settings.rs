use chrono::NaiveDate;
use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ExpenseError, Result};

/// Default memoization window for the fetched dataset, in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 600;

/// Default daily spending budget used by the summary view.
pub const DEFAULT_DAILY_BUDGET: f64 = 30.0;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Ingest travel expenses from an exported spreadsheet and report on them
#[derive(Parser, Debug, Clone)]
#[command(
    name = "expense-report",
    about = "Ingest travel expenses from an exported spreadsheet and report on them",
    version
)]
pub struct Settings {
    /// Exported workbook (JSON file) or directory of per-sheet JSON exports
    #[arg(long, env = "EXPENSE_SOURCE")]
    pub source: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", value_parser = ["table", "json", "summary"])]
    pub format: String,

    /// Month to report on (YYYY-MM); defaults to the latest month in the data
    #[arg(long, value_parser = parse_month)]
    pub month: Option<String>,

    /// Daily budget used to flag expensive days in the summary
    #[arg(long, default_value_t = DEFAULT_DAILY_BUDGET)]
    pub daily_budget: f64,

    /// Seconds the fetched dataset stays cached
    #[arg(long, default_value_t = DEFAULT_CACHE_TTL_SECS)]
    pub cache_ttl: u64,

    /// Year used to resolve DD/MM stay ranges (defaults to the current year)
    #[arg(long)]
    pub reference_year: Option<i32>,

    /// JSON file mapping categories to macro-categories
    #[arg(long)]
    pub categories: Option<PathBuf>,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

/// Accept `YYYY-MM` and normalise it.
fn parse_month(value: &str) -> std::result::Result<String, String> {
    NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m").to_string())
        .map_err(|_| format!("expected YYYY-MM, got \"{value}\""))
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.expense-report/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_budget: Option<f64>,
}

impl LastUsedParams {
    /// Default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Config path rooted at `base_dir`.
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".expense-report").join("last_used.json")
    }

    /// Load persisted params; `Default` when the file is absent or unreadable.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Write params to `path` via a temp file and rename.
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at `path` if it exists.
    pub fn clear_at(path: &Path) -> std::io::Result<()> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, fill unset values from the last run, and persist
    /// the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Same as [`Settings::load_with_last_used`] with explicit arguments and
    /// config path.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::warn!(error = %e, "could not clear saved configuration");
            }
            return settings.apply_debug();
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI and environment always win over persisted values.
        if !is_arg_user_set(&matches, "source") && settings.source.is_none() {
            settings.source = last.source;
        }
        if !is_arg_user_set(&matches, "format") {
            if let Some(v) = last.format {
                settings.format = v;
            }
        }
        if !is_arg_user_set(&matches, "daily_budget") {
            if let Some(v) = last.daily_budget {
                settings.daily_budget = v;
            }
        }

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::debug!(error = %e, "could not persist last-used settings");
        }

        settings.apply_debug()
    }

    /// The configured source path, or a configuration error.
    pub fn require_source(&self) -> Result<&Path> {
        self.source.as_deref().ok_or_else(|| {
            ExpenseError::Config(
                "no source given; pass --source or set EXPENSE_SOURCE".to_string(),
            )
        })
    }

    fn apply_debug(mut self) -> Self {
        if self.debug {
            self.log_level = "DEBUG".to_string();
        }
        self
    }
}

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            source: s.source.clone(),
            format: Some(s.format.clone()),
            daily_budget: Some(s.daily_budget),
        }
    }
}

/// `true` when `name` came from the command line or the environment.
///
/// Clap stores the arg id under the field name (underscores).
fn is_arg_user_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches!(
        matches.value_source(name),
        Some(clap::parser::ValueSource::CommandLine) | Some(clap::parser::ValueSource::EnvVariable)
    )
}

// ── Tests ──────────────────────────────────────────────────────────────────────
