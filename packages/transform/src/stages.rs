//! The ordered normalization stages.
//!
//! Each stage consumes the whole collection produced by the previous one.
//! Row order is preserved throughout.

use std::collections::HashSet;

use fashion_etl_catalog_models::{CleanRecord, CleanTable, RawRecord};

use crate::NormalizeConfig;
use crate::fields;

/// A raw record with every field present.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompleteRecord {
    title: String,
    price_text: String,
    rating_text: String,
    colors_text: String,
    size_text: String,
    gender_text: String,
    scraped_at: String,
}

impl CompleteRecord {
    fn from_raw(raw: &RawRecord) -> Option<Self> {
        Some(Self {
            title: raw.title.clone()?,
            price_text: raw.price_text.clone()?,
            rating_text: raw.rating_text.clone()?,
            colors_text: raw.colors_text.clone()?,
            size_text: raw.size_text.clone()?,
            gender_text: raw.gender_text.clone()?,
            scraped_at: raw.scraped_at.clone(),
        })
    }
}

/// A row after field conversion; `None` marks a value that failed to
/// parse.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedRow {
    title: String,
    price: Option<f64>,
    rating: Option<f64>,
    colors: Option<i64>,
    size: String,
    gender: String,
    scraped_at: String,
}

/// Stage 1: drop records with any absent field.
pub fn drop_incomplete(raw: &[RawRecord]) -> Vec<CompleteRecord> {
    raw.iter().filter_map(CompleteRecord::from_raw).collect()
}

/// Stage 2: keep the first of each group of identical records.
pub fn drop_duplicates(records: Vec<CompleteRecord>) -> Vec<CompleteRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| seen.insert(record.clone()))
        .collect()
}

/// Stage 3: drop placeholder titles, unavailable prices and unrated
/// products.
pub fn drop_sentinels(
    records: Vec<CompleteRecord>,
    config: &NormalizeConfig,
) -> Vec<CompleteRecord> {
    records
        .into_iter()
        .filter(|r| {
            r.title != config.unknown_title
                && r.price_text != config.unavailable_price
                && r.rating_text != config.unrated
        })
        .collect()
}

/// Stage 4: convert every field to its target type.
pub fn convert(records: Vec<CompleteRecord>, config: &NormalizeConfig) -> Vec<ConvertedRow> {
    records
        .into_iter()
        .map(|r| ConvertedRow {
            price: fields::price(&r.price_text, &config.currency_symbol, config.exchange_rate),
            rating: fields::rating(&r.rating_text),
            colors: fields::colors(&r.colors_text),
            size: fields::strip_prefix(&r.size_text, &config.size_prefix),
            gender: fields::strip_prefix(&r.gender_text, &config.gender_prefix),
            title: r.title,
            scraped_at: r.scraped_at,
        })
        .collect()
}

/// Stages 5 and 6: drop rows with a failed conversion and build the typed
/// table.
///
/// Distinct raw texts can convert to the same row (`"$10.0"` and
/// `"$10.00"`), so identical typed rows are collapsed again, keeping the
/// first.
pub fn drop_unconverted(rows: Vec<ConvertedRow>) -> CleanTable {
    let typed = rows
        .into_iter()
        .filter_map(|row| {
            Some(CleanRecord {
                price: row.price?,
                rating: row.rating?,
                colors: row.colors?,
                title: row.title,
                size: row.size,
                gender: row.gender,
                scraped_at: row.scraped_at,
            })
        })
        .collect();

    retain_first_unique(typed, |_| true)
}

/// Bitwise identity of a clean row, usable as a set key.
type RowKey<'a> = (&'a str, u64, u64, i64, &'a str, &'a str, &'a str);

fn row_key(row: &CleanRecord) -> RowKey<'_> {
    (
        &row.title,
        row.price.to_bits(),
        row.rating.to_bits(),
        row.colors,
        &row.size,
        &row.gender,
        &row.scraped_at,
    )
}

/// Keeps rows accepted by `accept`, dropping any row identical to an
/// earlier kept one.
fn retain_first_unique(
    rows: Vec<CleanRecord>,
    accept: impl Fn(&CleanRecord) -> bool,
) -> CleanTable {
    let keep: Vec<bool> = {
        let mut seen = HashSet::with_capacity(rows.len());
        rows.iter()
            .map(|row| accept(row) && seen.insert(row_key(row)))
            .collect()
    };

    rows.into_iter()
        .zip(keep)
        .filter_map(|(row, keep)| keep.then_some(row))
        .collect()
}

/// Row-level checks on an already typed table.
pub fn revalidate(rows: Vec<CleanRecord>, config: &NormalizeConfig) -> CleanTable {
    retain_first_unique(rows, |row| {
        !row.price.is_nan() && !row.rating.is_nan() && row.title != config.unknown_title
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(title: &str) -> CompleteRecord {
        CompleteRecord {
            title: title.to_owned(),
            price_text: "$10.00".to_owned(),
            rating_text: "Rating: ⭐ 4.0 / 5".to_owned(),
            colors_text: "3 Colors".to_owned(),
            size_text: "Size: M".to_owned(),
            gender_text: "Gender: Men".to_owned(),
            scraped_at: "t".to_owned(),
        }
    }

    #[test]
    fn incomplete_records_are_dropped() {
        let mut partial = RawRecord::empty("t");
        partial.title = Some("only a title".to_owned());
        assert!(drop_incomplete(&[partial, RawRecord::empty("t")]).is_empty());
    }

    #[test]
    fn duplicates_keep_first_occurrence_in_order() {
        let records = vec![complete("a"), complete("b"), complete("a"), complete("c")];
        let titles: Vec<String> = drop_duplicates(records)
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, ["a", "b", "c"]);
    }

    #[test]
    fn sentinel_rating_is_exact_match_only() {
        let config = NormalizeConfig::default();
        let mut exact = complete("exact");
        exact.rating_text = "Not Rated".to_owned();
        let mut prefixed = complete("prefixed");
        prefixed.rating_text = "Rating: Not Rated".to_owned();

        let kept = drop_sentinels(vec![exact, prefixed], &config);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "prefixed");
    }

    #[test]
    fn failed_conversion_drops_row_after_sentinels_pass() {
        let config = NormalizeConfig::default();
        let mut prefixed = complete("prefixed");
        prefixed.rating_text = "Rating: Not Rated".to_owned();

        let converted = convert(vec![prefixed, complete("ok")], &config);
        assert_eq!(converted[0].rating, None);

        let table = drop_unconverted(converted);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].title, "ok");
    }

    #[test]
    fn rows_equal_after_conversion_collapse_to_first() {
        let config = NormalizeConfig::default();
        let mut short_price = complete("same");
        short_price.price_text = "$10.0".to_owned();
        let mut bare_size = complete("same");
        bare_size.size_text = "M".to_owned();
        let records = vec![short_price, complete("same"), bare_size, complete("other")];

        assert_eq!(drop_duplicates(records.clone()).len(), 4);

        let table = drop_unconverted(convert(records, &config));
        let titles: Vec<&str> = table.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["same", "other"]);
        assert!((table.rows()[0].price - 160_000.0).abs() < 1e-9);
    }
}
