//! Output formatting and persistence for decoded feed data.
//!
//! Supports JSON rendering, CSV stop listings, and raw snapshot archival.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::fetch::FeedResponse;
use crate::model::StopListingRow;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Renders any decoded record set as pretty-printed JSON.
pub fn to_json<T: Serialize + ?Sized>(records: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Writes stop-listing rows as CSV with a header line.
pub fn write_stop_listing<W: Write>(writer: W, rows: &[StopListingRow]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Appends stop-listing rows to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_stop_listing(path: &str, rows: &[StopListingRow]) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, rows = rows.len(), "Appending stop listing");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // header only on a fresh file
        .from_writer(file);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

/// Saves a raw feed body as `<dir>/<%Y%m%d.%H%M%S>.<source>.xml`, creating `dir`.
pub fn write_raw_snapshot(
    dir: &Path,
    source: &str,
    response: &FeedResponse,
) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let name = format!("{}.{}.xml", response.timestamp.format("%Y%m%d.%H%M%S"), source);
    let path = dir.join(name);
    std::fs::write(&path, &response.body)?;
    info!(path = %path.display(), bytes = response.body.len(), "Raw snapshot saved");
    Ok(path)
}
