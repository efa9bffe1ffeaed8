#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Sinks for the clean catalog table.
//!
//! Each sink writes the whole table to one destination and reports a
//! [`LoadOutcome`]. Sinks never return errors: a failure is logged and
//! reported as [`LoadOutcome::Failed`] so the remaining sinks still run.

pub mod csv_file;
pub mod postgres;
pub mod sheets;

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

pub use csv_file::load_to_csv;
pub use postgres::{PostgresSettings, load_to_postgres};
pub use sheets::{SheetsSettings, load_to_sheets};

/// Errors raised inside a sink before it is reduced to a [`LoadOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// The target table name is not a plain SQL identifier.
    #[error("Invalid table identifier: '{0}'")]
    InvalidIdentifier(String),

    /// A remote API answered with a non-success status.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
}

/// Result of running one sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The table was written; `rows` data rows (header excluded).
    Written { rows: usize },
    /// The sink was not configured and did nothing.
    Skipped,
    /// The sink failed; the cause has been logged.
    Failed,
}

impl LoadOutcome {
    /// Logs the result of `sink` and reduces it to an outcome.
    #[must_use]
    pub fn from_result(sink: &str, result: Result<usize, LoadError>) -> Self {
        match result {
            Ok(rows) => {
                log::info!("{sink}: wrote {rows} rows");
                Self::Written { rows }
            }
            Err(e) => {
                log::error!("{sink}: load failed: {e}");
                Self::Failed
            }
        }
    }

    #[must_use]
    pub const fn is_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }
}

impl fmt::Display for LoadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Written { rows } => write!(f, "wrote {rows} rows"),
            Self::Skipped => f.write_str("skipped"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// Destinations of the load stage.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Output path of the CSV sink.
    pub csv_path: PathBuf,
    pub sheets: SheetsSettings,
    pub postgres: PostgresSettings,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("products.csv"),
            sheets: SheetsSettings::default(),
            postgres: PostgresSettings::default(),
        }
    }
}
