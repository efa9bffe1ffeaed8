#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal setup for the `fashion_etl` binary.
//!
//! [`init_logger`] installs `pretty_env_logger` behind
//! `indicatif-log-bridge` so log lines are suspended while the page bar
//! redraws, and [`PageProgress`] renders the catalog walk through the
//! scraper's [`ProgressCallback`] trait.

use std::sync::Arc;
use std::time::Duration;

use fashion_etl_scraper::progress::ProgressCallback;
use indicatif::{ProgressBar, ProgressStyle};

pub use indicatif::MultiProgress;

/// Page bar for the catalog walk.
///
/// Spins until the page bound arrives, then counts attempted pages
/// against it. The message slot carries the running record count, and
/// the finished bar keeps the final count plus elapsed time on screen.
pub struct PageProgress {
    bar: ProgressBar,
    counting: ProgressStyle,
    finished: ProgressStyle,
}

impl PageProgress {
    /// Adds a page bar labelled `label` to `multi`.
    #[must_use]
    pub fn new(multi: &MultiProgress, label: &str) -> Arc<dyn ProgressCallback> {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(120));
        Arc::new(Self::attach(bar, label))
    }

    fn attach(bar: ProgressBar, label: &str) -> Self {
        bar.set_prefix(label.to_owned());
        bar.set_style(
            ProgressStyle::with_template("{spinner:.magenta} {prefix:.bold}: waiting for page 1")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );

        let counting = ProgressStyle::with_template(
            "{prefix:.bold} page {pos:>2}/{len} [{bar:30.magenta/blue}] {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");

        let finished = ProgressStyle::with_template("{prefix:.bold}: {msg} in {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());

        Self {
            bar,
            counting,
            finished,
        }
    }
}

impl ProgressCallback for PageProgress {
    fn set_total(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
        self.bar.set_style(self.counting.clone());
        self.bar.set_message("0 records");
    }

    fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    fn finish(&self, msg: String) {
        self.bar.set_style(self.finished.clone());
        self.bar.finish_with_message(msg);
    }
}

/// Installs the global logger behind `indicatif-log-bridge`.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` applies (the
/// binary passes `warn` so skipped pages and sink failures still show).
/// Returns the [`MultiProgress`] every bar must be added to.
#[must_use]
pub fn init_logger(default_filter: &str) -> MultiProgress {
    let multi = MultiProgress::new();

    let filters = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_owned());
    let logger = pretty_env_logger::formatted_builder()
        .parse_filters(&filters)
        .build();
    let level = logger.filter();

    if indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .is_err()
    {
        log::debug!("Logger already installed, keeping it");
    }

    log::set_max_level(level);

    multi
}
