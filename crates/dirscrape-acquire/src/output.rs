use crate::error::AcquireError;
use crate::normalize;
use chrono::NaiveDate;
use dirscrape_model::{DetailRecord, ListingRecord, OutputFormat};
use indexmap::IndexSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Dated output file for one run: `{dir}/{label}-{YYYY-MM-DD}.{ext}`.
///
/// A second run on the same day overwrites the first.
pub fn output_path(dir: &Path, label: &str, date: NaiveDate, format: OutputFormat) -> PathBuf {
    dir.join(format!(
        "{label}-{}.{}",
        date.format("%Y-%m-%d"),
        format.extension()
    ))
}

/// Write every record to `path` in one go, creating parent directories as needed.
pub fn save(records: &[DetailRecord], path: &Path, format: OutputFormat) -> Result<(), AcquireError> {
    ensure_parent(path)?;
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(records)?;
            fs::write(path, json).map_err(AcquireError::io(path))?;
        }
        OutputFormat::Csv => write_csv(records, path)?,
    }
    tracing::info!(path = %path.display(), records = records.len(), "Wrote records");
    Ok(())
}

/// Read a JSON output file back into records.
pub fn load(path: &Path) -> Result<Vec<DetailRecord>, AcquireError> {
    let contents = fs::read_to_string(path).map_err(AcquireError::io(path))?;
    Ok(serde_json::from_str(&contents)?)
}

/// Write the index-stage listings as a JSON array.
pub fn save_listings(listings: &[ListingRecord], path: &Path) -> Result<(), AcquireError> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(listings)?;
    fs::write(path, json).map_err(AcquireError::io(path))?;
    tracing::info!(path = %path.display(), listings = listings.len(), "Wrote listings");
    Ok(())
}

/// Cache raw HTML for a fetched address so the page can be re-examined
/// without re-fetching.
pub fn cache_html(dir: &Path, url: &str, html: &str) -> Result<PathBuf, AcquireError> {
    fs::create_dir_all(dir).map_err(AcquireError::io(dir))?;
    let path = dir.join(format!("{}.html", normalize::file_stem(url)));
    fs::write(&path, html).map_err(AcquireError::io(&path))?;
    tracing::debug!(path = %path.display(), bytes = html.len(), "Cached raw HTML");
    Ok(path)
}

fn ensure_parent(path: &Path) -> Result<(), AcquireError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(AcquireError::io(dir))
        }
        _ => Ok(()),
    }
}

/// Records have no fixed schema, so the header is the union of all keys in
/// first-seen order and missing fields become empty cells. No records means
/// no columns, which is written as an empty file.
fn write_csv(records: &[DetailRecord], path: &Path) -> Result<(), AcquireError> {
    let columns: IndexSet<&str> = records.iter().flat_map(|r| r.keys()).collect();
    if columns.is_empty() {
        return fs::write(path, "").map_err(AcquireError::io(path));
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(columns.iter())?;
    for record in records {
        writer.write_record(columns.iter().map(|c| record.get(c).unwrap_or("")))?;
    }
    writer.flush().map_err(AcquireError::io(path))?;
    Ok(())
}
