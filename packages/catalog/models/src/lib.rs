#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Product record types shared by every stage of the fashion catalog ETL.
//!
//! The scraper produces [`RawRecord`]s (free text, possibly missing
//! fields), the transform stage turns them into a [`CleanTable`] of
//! [`CleanRecord`]s, and the sinks only ever read the clean table.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Column names of the clean table, in output order.
pub const COLUMNS: [&str; 7] = [
    "title",
    "price",
    "rating",
    "colors",
    "size",
    "gender",
    "scraped_at",
];

/// One scraped, unvalidated product observation.
///
/// Every text field is `None` when the element was not found on the card.
/// Present fields may still hold sentinel text such as
/// `"Price Unavailable"`. The serde names match the keys of a raw scrape
/// dump so previously exported JSON can be fed back into the transform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawRecord {
    /// Product title (`h3.product-title`).
    #[serde(rename = "Title")]
    pub title: Option<String>,
    /// Price text, e.g. `"$102.15"`.
    #[serde(rename = "Price")]
    pub price_text: Option<String>,
    /// Rating line, e.g. `"Rating: ⭐ 3.9 / 5"`.
    #[serde(rename = "Rating")]
    pub rating_text: Option<String>,
    /// Colors line, e.g. `"3 Colors"`.
    #[serde(rename = "Colors", default)]
    pub colors_text: Option<String>,
    /// Size line, e.g. `"Size: M"`.
    #[serde(rename = "Size")]
    pub size_text: Option<String>,
    /// Gender line, e.g. `"Gender: Women"`.
    #[serde(rename = "Gender")]
    pub gender_text: Option<String>,
    /// Capture time of this record (ISO-8601, local time).
    #[serde(rename = "timestamp")]
    pub scraped_at: String,
}

impl RawRecord {
    /// Creates a record with only the capture timestamp set.
    #[must_use]
    pub fn empty(scraped_at: impl Into<String>) -> Self {
        Self {
            title: None,
            price_text: None,
            rating_text: None,
            colors_text: None,
            size_text: None,
            gender_text: None,
            scraped_at: scraped_at.into(),
        }
    }
}

/// One validated, typed product row.
///
/// Field order matches [`COLUMNS`]; serializing with `csv` produces the
/// header row `title,price,rating,colors,size,gender,scraped_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRecord {
    pub title: String,
    /// Price converted to the local currency.
    pub price: f64,
    pub rating: f64,
    /// Number of available colors.
    pub colors: i64,
    /// Size with the `"Size: "` prefix removed.
    pub size: String,
    /// Gender with the `"Gender: "` prefix removed.
    pub gender: String,
    pub scraped_at: String,
}

/// Storage type of a clean table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Float64,
    Int64,
}

impl ColumnType {
    /// Column types in [`COLUMNS`] order.
    pub const SCHEMA: [Self; 7] = [
        Self::Text,
        Self::Float64,
        Self::Float64,
        Self::Int64,
        Self::Text,
        Self::Text,
        Self::Text,
    ];
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Float64 => "float64",
            Self::Int64 => "int64",
        })
    }
}

/// Ordered collection of clean rows.
///
/// Row order is the order in which the surviving raw records were
/// scraped. There is no key; uniqueness is whole-row equality.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CleanTable {
    rows: Vec<CleanRecord>,
}

impl CleanTable {
    #[must_use]
    pub const fn new() -> Self {
        Self { rows: Vec::new() }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn rows(&self) -> &[CleanRecord] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CleanRecord> {
        self.rows.iter()
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<CleanRecord> {
        self.rows
    }

    /// Describes the table shape: row count plus each column's type.
    #[must_use]
    pub fn summary(&self) -> TableSummary {
        TableSummary {
            rows: self.rows.len(),
        }
    }
}

impl From<Vec<CleanRecord>> for CleanTable {
    fn from(rows: Vec<CleanRecord>) -> Self {
        Self { rows }
    }
}

impl FromIterator<CleanRecord> for CleanTable {
    fn from_iter<I: IntoIterator<Item = CleanRecord>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a CleanTable {
    type Item = &'a CleanRecord;
    type IntoIter = std::slice::Iter<'a, CleanRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Printable overview of a [`CleanTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSummary {
    pub rows: usize,
}

impl fmt::Display for TableSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} rows x {} columns", self.rows, COLUMNS.len())?;
        for (i, (name, ty)) in COLUMNS.iter().zip(ColumnType::SCHEMA).enumerate() {
            writeln!(f, "  {i:>2}  {name:<12} {:>6} non-null  {ty}", self.rows)?;
        }
        Ok(())
    }
}
