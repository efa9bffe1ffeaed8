#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Paginated product catalog scraper.
//!
//! Walks the catalog page by page ([`paginate`]), pulls every product card
//! out of each page ([`catalog`]) and returns the accumulated
//! [`RawRecord`](fashion_etl_catalog_models::RawRecord)s. Network access
//! goes through the [`PageFetcher`] trait so the pagination logic can be
//! driven by scripted pages in tests.
//!
//! Nothing in here validates field contents; that is the transform
//! crate's job.

pub mod catalog;
pub mod paginate;
pub mod progress;

use std::collections::BTreeMap;

use serde::Deserialize;

/// Browser identification sent with every catalog request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/96.0.4664.110 Safari/537.36";

/// Catalog page URL; `{page}` is replaced by the 1-based page number.
pub const DEFAULT_URL_TEMPLATE: &str = "https://fashion-studio.dicoding.dev/?page={page}";

/// Errors that can occur during scraping operations.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// An HTTP request failed or returned a non-2xx status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A selector or header in the configuration is malformed.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// CSS selectors locating the pieces of a product card.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// One product card per match.
    pub card: String,
    /// Detail container inside a card; cards without it are skipped.
    pub details: String,
    /// Product title inside the detail container.
    pub title: String,
    /// Price element inside the detail container (first match wins).
    pub price: String,
    /// Free-text lines classified into rating/colors/size/gender.
    pub line: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            card: "div.collection-card".to_owned(),
            details: "div.product-details".to_owned(),
            title: "h3.product-title".to_owned(),
            price: "div.price-container, p.price".to_owned(),
            line: "p".to_owned(),
        }
    }
}

/// Configuration for a catalog scrape.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Page URL template containing a `{page}` placeholder.
    pub url_template: String,
    /// HTTP headers sent with every request.
    pub headers: BTreeMap<String, String>,
    /// Last page number to attempt (pages are numbered from 1).
    pub max_pages: u32,
    /// Delay in milliseconds after each page that yielded cards.
    pub delay_ms: u64,
    /// Card selectors.
    pub selectors: SelectorConfig,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self::new(DEFAULT_URL_TEMPLATE)
    }
}

impl ScrapeConfig {
    /// Creates a new `ScrapeConfig` for the given URL template with the
    /// catalog defaults (browser user agent, 50 pages, 1 second delay).
    #[must_use]
    pub fn new(url_template: &str) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("User-Agent".to_owned(), DEFAULT_USER_AGENT.to_owned());
        Self {
            url_template: url_template.to_owned(),
            headers,
            max_pages: 50,
            delay_ms: 1000,
            selectors: SelectorConfig::default(),
        }
    }

    /// Sets the last page number to attempt.
    #[must_use]
    pub const fn with_max_pages(mut self, max: u32) -> Self {
        self.max_pages = max;
        self
    }

    /// Sets the delay between page fetches.
    #[must_use]
    pub const fn with_delay_ms(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    /// Adds an HTTP header to include in requests.
    #[must_use]
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_owned(), value.to_owned());
        self
    }

    /// Builds the URL of the given 1-based page number.
    #[must_use]
    pub fn page_url(&self, page: u32) -> String {
        self.url_template.replace("{page}", &page.to_string())
    }
}

/// Source of raw page bodies.
///
/// Implementations never fail outward: any error is logged and reported
/// as `None`, which the pagination loop treats as a skipped page.
pub trait PageFetcher: Send + Sync {
    /// Fetches the body at `url`, or `None` if the request failed.
    fn fetch(&self, url: &str) -> impl std::future::Future<Output = Option<Vec<u8>>> + Send;
}

/// [`PageFetcher`] backed by a single reusable [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    /// Builds a client that sends `headers` with every request.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Parse`] if a header name or value is invalid,
    /// or [`ScrapeError::Http`] if the client cannot be constructed.
    pub fn new(headers: &BTreeMap<String, String>) -> Result<Self, ScrapeError> {
        let mut header_map = reqwest::header::HeaderMap::new();
        for (key, value) in headers {
            let name = reqwest::header::HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| ScrapeError::Parse(format!("invalid header name '{key}': {e}")))?;
            let val = reqwest::header::HeaderValue::from_str(value)
                .map_err(|e| ScrapeError::Parse(format!("invalid header value '{value}': {e}")))?;
            header_map.insert(name, val);
        }
        let client = reqwest::Client::builder()
            .default_headers(header_map)
            .build()
            .map_err(ScrapeError::Http)?;
        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<Vec<u8>, ScrapeError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        log::debug!("Downloaded {} bytes from {url}", bytes.len());
        Ok(bytes.to_vec())
    }
}

impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Option<Vec<u8>> {
        match self.get(url).await {
            Ok(body) => Some(body),
            Err(e) => {
                log::warn!("Request to {url} failed: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_page_urls_from_template() {
        let config = ScrapeConfig::default();
        assert_eq!(
            config.page_url(1),
            "https://fashion-studio.dicoding.dev/?page=1"
        );
        assert_eq!(
            config.page_url(50),
            "https://fashion-studio.dicoding.dev/?page=50"
        );
    }

    #[test]
    fn default_config_sends_browser_user_agent() {
        let config = ScrapeConfig::default();
        assert_eq!(config.max_pages, 50);
        assert_eq!(config.delay_ms, 1000);
        assert!(config.headers["User-Agent"].contains("Chrome/96"));
    }

    #[test]
    fn builder_overrides_bounds() {
        let config = ScrapeConfig::new("http://localhost/{page}")
            .with_max_pages(3)
            .with_delay_ms(0)
            .with_header("Accept", "text/html");
        assert_eq!(config.max_pages, 3);
        assert_eq!(config.delay_ms, 0);
        assert_eq!(config.headers["Accept"], "text/html");
        assert_eq!(config.page_url(2), "http://localhost/2");
    }

    #[test]
    fn rejects_invalid_header_value() {
        let mut headers = BTreeMap::new();
        headers.insert("User-Agent".to_owned(), "bad\nvalue".to_owned());
        assert!(matches!(
            HttpPageFetcher::new(&headers),
            Err(ScrapeError::Parse(_))
        ));
    }
}
