#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Normalization of scraped product records.
//!
//! Turns the raw, text-only output of the scraper into a [`CleanTable`]:
//! incomplete, duplicated and sentinel rows are dropped, prices are
//! converted to the local currency, and rating/colors/size/gender are
//! parsed out of their display text.
//!
//! The public entry points never fail. An untyped payload goes through
//! [`try_normalize`]; if that returns an error the cause is logged and an
//! empty table is returned, so callers treat "empty" as "nothing usable".

mod fields;
mod stages;

use fashion_etl_catalog_models::{CleanTable, RawRecord};
use serde::Deserialize;

/// Errors that abort a whole normalization run.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// The input is not a list of raw records.
    #[error("Input shape error: {0}")]
    Shape(#[from] serde_json::Error),
}

/// Constants applied while normalizing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Multiplier from the listed currency to the local one.
    pub exchange_rate: f64,
    /// Currency symbol stripped from the front of the price text.
    pub currency_symbol: String,
    /// Title marking a placeholder product.
    pub unknown_title: String,
    /// Price text marking a product without a price.
    pub unavailable_price: String,
    /// Rating text marking an unrated product.
    pub unrated: String,
    /// Prefix removed from the size line.
    pub size_prefix: String,
    /// Prefix removed from the gender line.
    pub gender_prefix: String,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            exchange_rate: 16_000.0,
            currency_symbol: "$".to_owned(),
            unknown_title: "Unknown Product".to_owned(),
            unavailable_price: "Price Unavailable".to_owned(),
            unrated: "Not Rated".to_owned(),
            size_prefix: "Size: ".to_owned(),
            gender_prefix: "Gender: ".to_owned(),
        }
    }
}

/// Normalizes raw records into a clean table.
///
/// Returns an empty table if nothing survives.
#[must_use]
pub fn normalize(raw: &[RawRecord], config: &NormalizeConfig) -> CleanTable {
    let table = run_stages(raw, config);
    log::info!("Transform complete -- {} clean rows", table.len());
    table
}

/// Normalizes an untyped JSON payload (a raw scrape dump).
///
/// A payload that is not an array of raw record objects yields an empty
/// table and a logged error.
#[must_use]
pub fn normalize_value(value: serde_json::Value, config: &NormalizeConfig) -> CleanTable {
    match try_normalize(value, config) {
        Ok(table) => {
            log::info!("Transform complete -- {} clean rows", table.len());
            table
        }
        Err(e) => {
            log::error!("Transform failed: {e}");
            CleanTable::new()
        }
    }
}

/// Reads `value` as raw records and runs every normalization stage.
///
/// # Errors
///
/// Returns [`TransformError::Shape`] if `value` is not an array of raw
/// record objects.
pub fn try_normalize(
    value: serde_json::Value,
    config: &NormalizeConfig,
) -> Result<CleanTable, TransformError> {
    let raw: Vec<RawRecord> = serde_json::from_value(value)?;
    Ok(run_stages(&raw, config))
}

fn run_stages(raw: &[RawRecord], config: &NormalizeConfig) -> CleanTable {
    let complete = stages::drop_incomplete(raw);
    log::debug!("{} of {} records complete", complete.len(), raw.len());

    let unique = stages::drop_duplicates(complete);
    log::debug!("{} unique records", unique.len());

    let valid = stages::drop_sentinels(unique, config);
    log::debug!("{} records without sentinel values", valid.len());

    stages::drop_unconverted(stages::convert(valid, config))
}

/// Re-checks an already clean table: rows with a NaN measure or the
/// placeholder title are dropped, then exact duplicates.
///
/// On a table produced by [`normalize`] this returns the same table.
#[must_use]
pub fn revalidate(table: CleanTable, config: &NormalizeConfig) -> CleanTable {
    stages::revalidate(table.into_rows(), config)
}
