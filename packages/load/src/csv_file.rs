//! CSV sink.

use std::path::Path;

use fashion_etl_catalog_models::{COLUMNS, CleanTable};

use crate::{LoadError, LoadOutcome};

/// Writes `table` to `path` with a header row and no index column.
///
/// An existing file is overwritten. Write failures are logged and
/// reported as [`LoadOutcome::Failed`].
pub fn load_to_csv(table: &CleanTable, path: &Path) -> LoadOutcome {
    let outcome = LoadOutcome::from_result("CSV", write_csv(table, path));
    if outcome.is_written() {
        log::info!("Saved clean table to {}", path.display());
    }
    outcome
}

fn write_csv(table: &CleanTable, path: &Path) -> Result<usize, LoadError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    // Written explicitly so an empty table still gets its header.
    writer.write_record(COLUMNS)?;
    for row in table {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(table.len())
}
