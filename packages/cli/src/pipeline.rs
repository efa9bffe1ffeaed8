//! Extract → transform → load orchestration.
//!
//! Each stage hands its whole result to the next. The run halts early (and
//! successfully) when extraction yields nothing or when no row survives
//! normalization. Sinks run independently of each other.

use std::path::Path;
use std::sync::Arc;

use fashion_etl_catalog_models::{CleanTable, RawRecord};
use fashion_etl_load::{LoadConfig, LoadOutcome, load_to_csv, load_to_postgres, load_to_sheets};
use fashion_etl_scraper::paginate::{CatalogScraper, scrape_all};
use fashion_etl_scraper::progress::ProgressCallback;
use fashion_etl_scraper::{HttpPageFetcher, PageFetcher, ScrapeConfig, ScrapeError};
use fashion_etl_transform::normalize;

use crate::config::EtlConfig;

/// Which optional sinks to run. The CSV sink always runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkSelection {
    pub sheets: bool,
    pub postgres: bool,
}

/// Outcome of every sink in one load stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub csv: LoadOutcome,
    pub sheets: LoadOutcome,
    pub postgres: LoadOutcome,
}

/// How a pipeline run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// Extraction produced no records; nothing was loaded.
    NoRawRecords,
    /// No row survived normalization; nothing was loaded.
    NoCleanRows { raw: usize },
    /// The clean table was handed to every selected sink.
    Loaded {
        raw: usize,
        table: CleanTable,
        report: LoadReport,
    },
}

/// Scrapes the live catalog with an HTTP fetcher.
///
/// # Errors
///
/// Returns [`ScrapeError`] if the selectors or headers in `config` are
/// invalid. Page-level failures never surface here.
pub async fn extract(
    config: &ScrapeConfig,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Vec<RawRecord>, ScrapeError> {
    let fetcher = HttpPageFetcher::new(&config.headers)?;
    extract_with(config, &fetcher, progress).await
}

async fn extract_with(
    config: &ScrapeConfig,
    fetcher: &impl PageFetcher,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Vec<RawRecord>, ScrapeError> {
    let scraper = CatalogScraper::new(config.clone())?;
    Ok(scrape_all(&scraper, fetcher, progress).await)
}

/// Runs the full pipeline against the live catalog.
///
/// # Errors
///
/// Returns [`ScrapeError`] if the scrape configuration is invalid.
pub async fn run(
    config: &EtlConfig,
    sinks: SinkSelection,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<PipelineOutcome, ScrapeError> {
    let fetcher = HttpPageFetcher::new(&config.scrape.headers)?;
    run_with(config, &fetcher, sinks, progress).await
}

async fn run_with(
    config: &EtlConfig,
    fetcher: &impl PageFetcher,
    sinks: SinkSelection,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<PipelineOutcome, ScrapeError> {
    log::info!("Starting extract stage");
    let raw = extract_with(&config.scrape, fetcher, progress).await?;
    if raw.is_empty() {
        return Ok(PipelineOutcome::NoRawRecords);
    }
    log::info!("Extract stage finished: {} raw records", raw.len());

    log::info!("Starting transform stage");
    let table = normalize(&raw, &config.normalize);
    if table.is_empty() {
        return Ok(PipelineOutcome::NoCleanRows { raw: raw.len() });
    }

    log::info!("Starting load stage");
    let report = load(&table, &config.load, sinks).await;

    Ok(PipelineOutcome::Loaded {
        raw: raw.len(),
        table,
        report,
    })
}

/// Hands `table` to every selected sink. A failing sink does not stop the
/// others.
pub async fn load(table: &CleanTable, config: &LoadConfig, sinks: SinkSelection) -> LoadReport {
    let csv = load_to_csv(table, &config.csv_path);

    let sheets = if sinks.sheets {
        load_to_sheets(table, &config.sheets).await
    } else {
        log::info!("Google Sheets sink disabled");
        LoadOutcome::Skipped
    };

    let postgres = match (&config.postgres.database_url, sinks.postgres) {
        (_, false) => {
            log::info!("PostgreSQL sink disabled");
            LoadOutcome::Skipped
        }
        (None, true) => {
            log::warn!("PostgreSQL: DATABASE_URL not set, skipping");
            LoadOutcome::Skipped
        }
        (Some(url), true) => load_to_postgres(table, url, &config.postgres.table_name).await,
    };

    LoadReport {
        csv,
        sheets,
        postgres,
    }
}

/// Writes raw records as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_raw_dump(records: &[RawRecord], path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), records)?;
    Ok(())
}

/// Reads a raw dump as untyped JSON, so a malformed payload reaches the
/// transform stage instead of failing here.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not JSON at all.
pub fn read_raw_dump(path: &Path) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use fashion_etl_scraper::progress::null_progress;

    use super::*;

    const PAGE: &str = r#"
        <div class="collection-card">
            <div class="product-details">
                <h3 class="product-title">T-shirt 2</h3>
                <div class="price-container"><span class="price">$102.15</span></div>
                <p>Rating: ⭐ 3.9 / 5</p>
                <p>3 Colors</p>
                <p>Size: M</p>
                <p>Gender: Women</p>
            </div>
        </div>
        <div class="collection-card">
            <div class="product-details">
                <h3 class="product-title">Unknown Product</h3>
                <div class="price-container"><span class="price">$100.00</span></div>
                <p>Rating: ⭐ 4.0 / 5</p>
                <p>5 Colors</p>
                <p>Size: M</p>
                <p>Gender: Men</p>
            </div>
        </div>
    "#;

    const PLACEHOLDERS_ONLY: &str = r#"
        <div class="collection-card">
            <div class="product-details">
                <h3 class="product-title">Unknown Product</h3>
                <p class="price">Price Unavailable</p>
                <p>Rating: Not Rated</p>
            </div>
        </div>
    "#;

    struct Pages(Mutex<VecDeque<&'static str>>);

    impl Pages {
        fn new(pages: &[&'static str]) -> Self {
            Self(Mutex::new(pages.iter().copied().collect()))
        }
    }

    impl PageFetcher for Pages {
        async fn fetch(&self, _url: &str) -> Option<Vec<u8>> {
            let page = self.0.lock().unwrap().pop_front().unwrap_or("<html></html>");
            Some(page.as_bytes().to_vec())
        }
    }

    fn config(csv_name: &str) -> EtlConfig {
        let mut config = EtlConfig::default();
        config.scrape = ScrapeConfig::new("http://catalog.test/?page={page}").with_delay_ms(0);
        config.load.csv_path = std::env::temp_dir().join(csv_name);
        config
    }

    const NO_REMOTE_SINKS: SinkSelection = SinkSelection {
        sheets: false,
        postgres: false,
    };

    #[tokio::test]
    async fn loads_clean_rows_to_csv() {
        let config = config("fashion_etl_pipeline_test.csv");
        let fetcher = Pages::new(&[PAGE]);

        let outcome = run_with(&config, &fetcher, NO_REMOTE_SINKS, &null_progress())
            .await
            .unwrap();

        let PipelineOutcome::Loaded { raw, table, report } = outcome else {
            panic!("expected the table to be loaded");
        };
        assert_eq!(raw, 2);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].title, "T-shirt 2");
        assert_eq!(report.csv, LoadOutcome::Written { rows: 1 });
        assert_eq!(report.sheets, LoadOutcome::Skipped);
        assert_eq!(report.postgres, LoadOutcome::Skipped);

        let csv = std::fs::read_to_string(&config.load.csv_path).unwrap();
        assert_eq!(csv.lines().count(), 2);

        let _ = std::fs::remove_file(&config.load.csv_path);
    }

    #[tokio::test]
    async fn halts_when_nothing_is_scraped() {
        let config = config("fashion_etl_pipeline_empty_test.csv");
        let fetcher = Pages::new(&[]);

        let outcome = run_with(&config, &fetcher, NO_REMOTE_SINKS, &null_progress())
            .await
            .unwrap();

        assert_eq!(outcome, PipelineOutcome::NoRawRecords);
        assert!(!config.load.csv_path.exists());
    }

    #[tokio::test]
    async fn halts_when_no_row_survives() {
        let config = config("fashion_etl_pipeline_dirty_test.csv");
        let fetcher = Pages::new(&[PLACEHOLDERS_ONLY]);

        let outcome = run_with(&config, &fetcher, NO_REMOTE_SINKS, &null_progress())
            .await
            .unwrap();

        assert_eq!(outcome, PipelineOutcome::NoCleanRows { raw: 1 });
        assert!(!config.load.csv_path.exists());
    }

    #[tokio::test]
    async fn failing_sink_does_not_stop_the_others() {
        let mut config = config("fashion_etl_pipeline_sinks_test.csv");
        config.load.postgres.database_url = Some("not a url".to_owned());
        let sinks = SinkSelection {
            sheets: true,
            postgres: true,
        };
        let table = normalize(
            &[RawRecord {
                title: Some("Hoodie 3".to_owned()),
                price_text: Some("$496.88".to_owned()),
                rating_text: Some("Rating: ⭐ 4.8 / 5".to_owned()),
                colors_text: Some("3 Colors".to_owned()),
                size_text: Some("Size: L".to_owned()),
                gender_text: Some("Gender: Unisex".to_owned()),
                scraped_at: "...".to_owned(),
            }],
            &config.normalize,
        );

        let report = load(&table, &config.load, sinks).await;

        assert_eq!(report.csv, LoadOutcome::Written { rows: 1 });
        assert_eq!(report.sheets, LoadOutcome::Skipped);
        assert_eq!(report.postgres, LoadOutcome::Failed);

        let _ = std::fs::remove_file(&config.load.csv_path);
    }

    #[test]
    fn raw_dump_round_trips_through_transform_input() {
        let path = std::env::temp_dir().join("fashion_etl_raw_dump_test.json");
        let records = vec![RawRecord::empty("2025-05-01T10:00:00.000000")];

        write_raw_dump(&records, &path).unwrap();
        let value = read_raw_dump(&path).unwrap();

        assert!(value.is_array());
        assert_eq!(value[0]["timestamp"], "2025-05-01T10:00:00.000000");

        let _ = std::fs::remove_file(&path);
    }
}
