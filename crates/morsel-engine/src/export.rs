//! Fixed-schema CSV serialization of cookie rows and stats.

use std::path::Path;

use thiserror::Error;

use morsel_common::protocol::{COOKIE_CSV_HEADER, CookieRecord, CookieStats, STATS_CSV_HEADER};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Write the raw cookie rows, header first. The header is written even for
/// an empty set so the file always declares its schema.
pub fn export_cookies(cookies: &[CookieRecord], path: &Path) -> Result<(), ExportError> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(COOKIE_CSV_HEADER)?;
    for cookie in cookies {
        writer.serialize(cookie)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the single stats row for one (site, date, flow).
pub fn export_stats(stats: &CookieStats, path: &Path) -> Result<(), ExportError> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(STATS_CSV_HEADER)?;
    writer.serialize(stats)?;
    writer.flush()?;
    Ok(())
}
