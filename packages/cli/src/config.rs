//! Pipeline configuration: `fashion_etl.toml` plus environment overrides.

use std::path::{Path, PathBuf};

use fashion_etl_load::LoadConfig;
use fashion_etl_scraper::ScrapeConfig;
use fashion_etl_transform::NormalizeConfig;
use serde::Deserialize;

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "fashion_etl.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {name}: '{value}'")]
    Env { name: &'static str, value: String },
}

/// Settings for every pipeline stage. Every field has a default, so an
/// empty or partial file is valid.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    pub scrape: ScrapeConfig,
    pub normalize: NormalizeConfig,
    pub load: LoadConfig,
}

impl EtlConfig {
    /// Reads the config file.
    ///
    /// Without an explicit path, a missing [`DEFAULT_CONFIG_PATH`] yields
    /// the defaults. An explicit path must exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = path.map_or_else(
            || (Path::new(DEFAULT_CONFIG_PATH), false),
            |p| (p, true),
        );

        if !explicit && !path.exists() {
            log::debug!("No {DEFAULT_CONFIG_PATH} found, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&contents).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;

        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parses TOML config text.
    ///
    /// # Errors
    ///
    /// Returns [`toml::de::Error`] on malformed TOML or mistyped fields.
    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Applies overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Env`] if a numeric variable does not parse.
    pub fn apply_process_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env(|name| std::env::var(name).ok())
    }

    /// Applies overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Env`] if a numeric variable does not parse.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = lookup("DATABASE_URL") {
            self.load.postgres.database_url = Some(url);
        }
        if let Some(id) = lookup("SPREADSHEET_ID") {
            self.load.sheets.spreadsheet_id = id;
        }
        if let Some(path) = lookup("GOOGLE_SHEETS_CREDENTIALS") {
            self.load.sheets.credentials_path = PathBuf::from(path);
        }
        if let Some(value) = lookup("FASHION_ETL_MAX_PAGES") {
            self.scrape.max_pages = parse_env("FASHION_ETL_MAX_PAGES", value)?;
        }
        if let Some(value) = lookup("FASHION_ETL_DELAY_MS") {
            self.scrape.delay_ms = parse_env("FASHION_ETL_DELAY_MS", value)?;
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { name, value })
}
