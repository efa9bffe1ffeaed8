//! Product card extraction.
//!
//! Parses a catalog page, locates every product card via CSS selector and
//! turns each card into a [`RawRecord`]. Extraction is pure text
//! inspection: a card either yields a record or is skipped, it never
//! fails.

use fashion_etl_catalog_models::RawRecord;
use scraper::{ElementRef, Html, Selector};

use crate::{ScrapeError, SelectorConfig};

/// Timestamp format of [`RawRecord::scraped_at`].
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Compiled form of [`SelectorConfig`].
#[derive(Debug, Clone)]
pub struct CatalogSelectors {
    card: Selector,
    details: Selector,
    title: Selector,
    price: Selector,
    line: Selector,
}

impl CatalogSelectors {
    /// Compiles every selector in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Parse`] naming the first selector that does
    /// not parse.
    pub fn parse(config: &SelectorConfig) -> Result<Self, ScrapeError> {
        Ok(Self {
            card: parse_selector(&config.card)?,
            details: parse_selector(&config.details)?,
            title: parse_selector(&config.title)?,
            price: parse_selector(&config.price)?,
            line: parse_selector(&config.line)?,
        })
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector)
        .map_err(|e| ScrapeError::Parse(format!("invalid CSS selector '{selector}': {e}")))
}

/// Result of inspecting one catalog page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// The page holds no product cards: the catalog has ended.
    EndOfCatalog,
    /// Records extracted from the page's cards, in document order.
    Records(Vec<RawRecord>),
}

/// Parses an HTML page and extracts a record from every product card.
#[must_use]
pub fn parse_page(html: &str, selectors: &CatalogSelectors) -> PageOutcome {
    let document = Html::parse_document(html);
    let mut cards = document.select(&selectors.card).peekable();

    if cards.peek().is_none() {
        return PageOutcome::EndOfCatalog;
    }

    PageOutcome::Records(
        cards
            .filter_map(|card| extract_card(card, selectors))
            .collect(),
    )
}

/// Which raw field a free-text line populates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineField {
    Rating,
    Colors,
    Size,
    Gender,
}

/// Ordered classification rules. The first rule matching a line decides
/// its field.
const LINE_RULES: &[(fn(&str) -> bool, LineField)] = &[
    (is_rating_line, LineField::Rating),
    (is_colors_line, LineField::Colors),
    (is_size_line, LineField::Size),
    (is_gender_line, LineField::Gender),
];

fn is_rating_line(text: &str) -> bool {
    text.starts_with("Rating:")
}

fn is_colors_line(text: &str) -> bool {
    text.ends_with("Colors") || text.ends_with("Colors:")
}

fn is_size_line(text: &str) -> bool {
    text.starts_with("Size:")
}

fn is_gender_line(text: &str) -> bool {
    text.starts_with("Gender:")
}

fn classify_line(text: &str) -> Option<LineField> {
    LINE_RULES
        .iter()
        .find(|(matches, _)| matches(text))
        .map(|&(_, field)| field)
}

/// Extracts one raw record from a product card.
///
/// Returns `None` when the card has no detail container. Every other
/// field is optional; `scraped_at` is always set to the current local
/// time.
#[must_use]
pub fn extract_card(card: ElementRef<'_>, selectors: &CatalogSelectors) -> Option<RawRecord> {
    let details = card.select(&selectors.details).next()?;

    let mut record = RawRecord::empty(now_timestamp());
    record.title = details.select(&selectors.title).next().map(element_text);
    record.price_text = details.select(&selectors.price).next().map(element_text);

    for line in details.select(&selectors.line).map(element_text) {
        let Some(field) = classify_line(&line) else {
            continue;
        };
        let slot = match field {
            LineField::Rating => &mut record.rating_text,
            LineField::Colors => &mut record.colors_text,
            LineField::Size => &mut record.size_text,
            LineField::Gender => &mut record.gender_text,
        };
        if slot.is_none() {
            *slot = Some(line);
        }
    }

    Some(record)
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join("").trim().to_owned()
}

fn now_timestamp() -> String {
    chrono::Local::now()
        .naive_local()
        .format(TIMESTAMP_FORMAT)
        .to_string()
}
