//! Progress reporting for the page loop.
//!
//! The scraper only talks to [`ProgressCallback`]; the CLI plugs in an
//! `indicatif` bar while tests use [`NullProgress`].

use std::sync::Arc;

/// Receives page-loop progress updates.
pub trait ProgressCallback: Send + Sync {
    /// Total number of pages that may be attempted.
    fn set_total(&self, total: u64);

    /// Advance by `delta` pages.
    fn inc(&self, delta: u64);

    /// Update the status line.
    fn set_message(&self, msg: String);

    /// The loop has terminated.
    fn finish(&self, msg: String);
}

/// Discards every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
