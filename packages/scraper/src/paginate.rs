//! Page loop over the catalog.
//!
//! Pages are visited strictly in order, `1..=max_pages`. A page that cannot
//! be fetched is skipped; the first page without product cards ends the
//! scrape.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use fashion_etl_catalog_models::RawRecord;

use crate::catalog::{CatalogSelectors, PageOutcome, parse_page};
use crate::progress::ProgressCallback;
use crate::{PageFetcher, ScrapeConfig, ScrapeError};

/// A catalog scrape with its selectors compiled.
#[derive(Debug, Clone)]
pub struct CatalogScraper {
    config: ScrapeConfig,
    selectors: CatalogSelectors,
}

impl CatalogScraper {
    /// # Errors
    ///
    /// Returns [`ScrapeError::Parse`] if a configured selector is invalid.
    pub fn new(config: ScrapeConfig) -> Result<Self, ScrapeError> {
        let selectors = CatalogSelectors::parse(&config.selectors)?;
        Ok(Self { config, selectors })
    }

    #[must_use]
    pub const fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// Decodes a fetched body and extracts its cards.
    ///
    /// Invalid UTF-8 sequences become U+FFFD; the rest of the page is
    /// still parsed.
    #[must_use]
    pub fn process_page(&self, body: &[u8]) -> PageOutcome {
        let html = String::from_utf8_lossy(body);
        if let Cow::Owned(_) = html {
            log::warn!("Page body is not valid UTF-8, replacing invalid bytes");
        }
        parse_page(&html, &self.selectors)
    }
}

/// Scrapes the catalog from page 1 up to the configured bound.
///
/// Never fails: fetch failures are logged and skipped. Returns every extracted record in page order, then document
/// order within a page. The result may be empty.
pub async fn scrape_all(
    scraper: &CatalogScraper,
    fetcher: &impl PageFetcher,
    progress: &Arc<dyn ProgressCallback>,
) -> Vec<RawRecord> {
    let config = scraper.config();
    let mut all_records = Vec::new();

    progress.set_total(u64::from(config.max_pages));

    for page in 1..=config.max_pages {
        let url = config.page_url(page);
        log::info!("Scraping page {page}: {url}");
        progress.inc(1);

        let Some(body) = fetcher.fetch(&url).await else {
            log::warn!("Failed to fetch page {page}, continuing");
            continue;
        };

        let records = match scraper.process_page(&body) {
            PageOutcome::Records(records) => records,
            PageOutcome::EndOfCatalog => {
                log::info!("No products on page {page}, assuming last page");
                break;
            }
        };

        log::debug!("Page {page}: {} records", records.len());
        all_records.extend(records);
        progress.set_message(format!("{} records", all_records.len()));

        if config.delay_ms > 0 && page < config.max_pages {
            tokio::time::sleep(Duration::from_millis(config.delay_ms)).await;
        }
    }

    log::info!("Scrape complete -- {} total records", all_records.len());
    progress.finish(format!("scraped {} records", all_records.len()));
    all_records
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::progress::null_progress;

    const PAGE_WITH_TWO: &str = r#"
        <div class="collection-card">
            <div class="product-details">
                <h3 class="product-title">Fake T-Shirt</h3>
                <div class="price-container"><span class="price">$100.00</span></div>
                <p>Rating: ⭐ 4.0 / 5</p>
                <p>3 Colors</p>
                <p>Size: M</p>
                <p>Gender: Men</p>
            </div>
        </div>
        <div class="collection-card">
            <div class="product-details">
                <h3 class="product-title">Fake Hoodie</h3>
                <div class="price-container"><span class="price">$200.00</span></div>
                <p>Rating: ⭐ 5.0 / 5</p>
                <p>5 Colors</p>
                <p>Size: L</p>
                <p>Gender: Unisex</p>
            </div>
        </div>
    "#;

    const PAGE_WITH_ONE: &str = r#"
        <div class="collection-card">
            <div class="product-details">
                <h3 class="product-title">Fake Jacket</h3>
                <p>Rating: ⭐ 3.0 / 5</p>
            </div>
        </div>
    "#;

    const EMPTY_PAGE: &str = "<html><body></body></html>";

    /// Replays scripted responses in order, `None` once they run out.
    struct ScriptedFetcher {
        responses: Mutex<VecDeque<Option<Vec<u8>>>>,
        requested: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        fn new(responses: Vec<Option<&str>>) -> Self {
            Self {
                responses: Mutex::new(
                    responses
                        .into_iter()
                        .map(|r| r.map(|html| html.as_bytes().to_vec()))
                        .collect(),
                ),
                requested: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    impl PageFetcher for ScriptedFetcher {
        async fn fetch(&self, url: &str) -> Option<Vec<u8>> {
            self.requested.lock().unwrap().push(url.to_owned());
            self.responses.lock().unwrap().pop_front().flatten()
        }
    }

    fn scraper(max_pages: u32) -> CatalogScraper {
        let config = ScrapeConfig::new("http://catalog.test/?page={page}")
            .with_max_pages(max_pages)
            .with_delay_ms(0);
        CatalogScraper::new(config).unwrap()
    }

    #[tokio::test]
    async fn stops_at_first_page_without_cards() {
        let fetcher = ScriptedFetcher::new(vec![Some(PAGE_WITH_TWO), Some(EMPTY_PAGE)]);

        let records = scrape_all(&scraper(50), &fetcher, &null_progress()).await;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title.as_deref(), Some("Fake T-Shirt"));
        assert_eq!(records[1].title.as_deref(), Some("Fake Hoodie"));
        assert_eq!(
            fetcher.calls(),
            ["http://catalog.test/?page=1", "http://catalog.test/?page=2"]
        );
    }

    #[tokio::test]
    async fn skips_failed_fetch_and_continues() {
        let fetcher =
            ScriptedFetcher::new(vec![None, Some(PAGE_WITH_ONE), Some(EMPTY_PAGE)]);

        let records = scrape_all(&scraper(50), &fetcher, &null_progress()).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title.as_deref(), Some("Fake Jacket"));
        assert_eq!(fetcher.calls().len(), 3);
    }

    #[tokio::test]
    async fn attempts_every_page_when_all_fetches_fail() {
        let fetcher = ScriptedFetcher::new(Vec::new());

        let records = scrape_all(&scraper(7), &fetcher, &null_progress()).await;

        assert!(records.is_empty());
        assert_eq!(fetcher.calls().len(), 7);
        assert_eq!(fetcher.calls()[6], "http://catalog.test/?page=7");
    }

    #[tokio::test]
    async fn stops_at_page_bound() {
        let fetcher = ScriptedFetcher::new(vec![
            Some(PAGE_WITH_ONE),
            Some(PAGE_WITH_TWO),
            Some(PAGE_WITH_ONE),
        ]);

        let records = scrape_all(&scraper(2), &fetcher, &null_progress()).await;

        let titles: Vec<_> = records.iter().filter_map(|r| r.title.as_deref()).collect();
        assert_eq!(titles, ["Fake Jacket", "Fake T-Shirt", "Fake Hoodie"]);
        assert_eq!(fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn keeps_cards_from_page_with_invalid_utf8() {
        struct Latin1ThenEmpty(Mutex<u32>);

        impl PageFetcher for Latin1ThenEmpty {
            async fn fetch(&self, _url: &str) -> Option<Vec<u8>> {
                let mut calls = self.0.lock().unwrap();
                *calls += 1;
                if *calls == 1 {
                    let page = PAGE_WITH_ONE.replace("Fake Jacket", "Caf# Jacket");
                    Some(
                        page.bytes()
                            .map(|b| if b == b'#' { 0xE9 } else { b })
                            .collect(),
                    )
                } else {
                    Some(EMPTY_PAGE.as_bytes().to_vec())
                }
            }
        }

        let fetcher = Latin1ThenEmpty(Mutex::new(0));
        let records = scrape_all(&scraper(50), &fetcher, &null_progress()).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title.as_deref(), Some("Caf\u{fffd} Jacket"));
        assert_eq!(*fetcher.0.lock().unwrap(), 2);
    }

    #[test]
    fn rejects_invalid_selector_config() {
        let mut config = ScrapeConfig::default();
        config.selectors.title = "div[".to_owned();
        assert!(CatalogScraper::new(config).is_err());
    }
}
