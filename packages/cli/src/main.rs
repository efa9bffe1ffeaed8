#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the fashion catalog ETL.
//!
//! `fashion_etl` (or `fashion_etl run`) scrapes the catalog, normalizes the
//! records and loads the clean table into CSV, Google Sheets and
//! PostgreSQL. `extract` and `transform` run the first two stages on their
//! own, exchanging a raw JSON dump.
//!
//! Uses `indicatif-log-bridge` (via [`fashion_etl_cli_utils::init_logger`])
//! so log lines and the page bar never fight for the terminal.

mod config;
mod pipeline;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use fashion_etl_cli_utils::{MultiProgress, PageProgress};
use fashion_etl_load::{LoadOutcome, load_to_csv};
use fashion_etl_transform::normalize_value;

use crate::config::EtlConfig;
use crate::pipeline::{PipelineOutcome, SinkSelection};

#[derive(Parser)]
#[command(name = "fashion_etl", about = "Fashion catalog ETL pipeline")]
struct Cli {
    /// Path to the TOML config file (default: `fashion_etl.toml` if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Last catalog page to scrape (overrides config and `FASHION_ETL_MAX_PAGES`)
    #[arg(long, global = true)]
    max_pages: Option<u32>,

    /// Delay between page requests in milliseconds
    #[arg(long, global = true)]
    delay_ms: Option<u64>,

    /// Do not write to Google Sheets
    #[arg(long, global = true)]
    skip_sheets: bool,

    /// Do not write to PostgreSQL
    #[arg(long, global = true)]
    skip_postgres: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run extract, transform and load (the default)
    Run,
    /// Scrape the catalog and write the raw records as JSON
    Extract {
        #[arg(long, default_value = "raw.json")]
        output: PathBuf,
    },
    /// Normalize a raw JSON dump and write the clean table as CSV
    Transform {
        #[arg(long)]
        input: PathBuf,
        /// Output CSV (default: the configured `load.csv_path`)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = fashion_etl_cli_utils::init_logger("warn");
    let cli = Cli::parse();

    let mut config = EtlConfig::load(cli.config.as_deref())?;
    config.apply_process_env()?;
    if let Some(max_pages) = cli.max_pages {
        config.scrape.max_pages = max_pages;
    }
    if let Some(delay_ms) = cli.delay_ms {
        config.scrape.delay_ms = delay_ms;
    }

    let start = Instant::now();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let sinks = SinkSelection {
                sheets: !cli.skip_sheets,
                postgres: !cli.skip_postgres,
            };
            run(&config, sinks, &multi).await?;
        }
        Commands::Extract { output } => {
            let progress = PageProgress::new(&multi, "Scraping catalog");
            let records = pipeline::extract(&config.scrape, &progress).await?;
            pipeline::write_raw_dump(&records, &output)?;
            println!("Wrote {} raw records to {}", records.len(), output.display());
        }
        Commands::Transform { input, output } => {
            let value = pipeline::read_raw_dump(&input)?;
            let table = normalize_value(value, &config.normalize);
            if table.is_empty() {
                println!("Transform produced no clean rows; nothing written.");
            } else {
                print!("{}", table.summary());
                let path = output.unwrap_or_else(|| config.load.csv_path.clone());
                if let LoadOutcome::Written { rows } = load_to_csv(&table, &path) {
                    println!("Wrote {rows} rows to {}", path.display());
                }
            }
        }
    }

    println!(
        "Pipeline finished in {:.2}s",
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

async fn run(
    config: &EtlConfig,
    sinks: SinkSelection,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let progress = PageProgress::new(multi, "Scraping catalog");

    match pipeline::run(config, sinks, &progress).await? {
        PipelineOutcome::NoRawRecords => {
            println!("Extract produced no records. Pipeline stopped.");
        }
        PipelineOutcome::NoCleanRows { raw } => {
            println!("Transform kept none of {raw} raw records. Pipeline stopped.");
        }
        PipelineOutcome::Loaded { raw, table, report } => {
            println!("Extracted {raw} raw records, {} clean rows", table.len());
            print!("{}", table.summary());
            println!();
            println!("  CSV:           {}", report.csv);
            println!("  Google Sheets: {}", report.sheets);
            println!("  PostgreSQL:    {}", report.postgres);
        }
    }

    Ok(())
}
