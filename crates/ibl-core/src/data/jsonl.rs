//! JSON Lines datasets.
//!
//! Each line holds one trial as a JSON object. The format streams line by
//! line, appends cleanly, and works with `jq` and friends.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{IblError, IblResult};

/// Statistics from an export operation.
#[derive(Debug, Default, Clone)]
pub struct ExportStats {
    /// Total records processed.
    pub total: u64,
    /// Successfully written records.
    pub exported: u64,
    /// Error messages for failed records.
    pub errors: Vec<String>,
}

impl ExportStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if export completed without errors.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.total == self.exported
    }
}

/// Statistics from an import operation.
#[derive(Debug, Default, Clone)]
pub struct ImportStats {
    /// Non-empty lines processed.
    pub total: u64,
    /// Successfully parsed records.
    pub imported: u64,
    /// Error messages for malformed lines, with line numbers.
    pub errors: Vec<String>,
}

impl ImportStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if import completed without errors.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Error rate as a percentage of processed lines.
    pub fn error_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.errors.len() as f64 / self.total as f64) * 100.0
        }
    }
}

/// Write `records` as JSON Lines.
///
/// Serialization failures are recorded per record and do not abort the
/// export; I/O failures do.
pub fn export_jsonl<'a, T, I, W>(records: I, writer: W) -> IblResult<ExportStats>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
    W: Write,
{
    let mut stats = ExportStats::new();
    let mut writer = BufWriter::new(writer);

    for record in records {
        stats.total += 1;
        match serde_json::to_string(record) {
            Ok(json) => {
                writer.write_all(json.as_bytes())?;
                writer.write_all(b"\n")?;
                stats.exported += 1;
            }
            Err(e) => {
                stats
                    .errors
                    .push(format!("Serialization error for record {}: {}", stats.total, e));
            }
        }
    }

    writer.flush()?;
    Ok(stats)
}

/// Read JSON Lines into records.
///
/// Blank lines are skipped. Malformed lines are recorded in the stats with
/// their 1-based line number and do not abort the import.
pub fn import_jsonl<T, R>(reader: R) -> IblResult<(Vec<T>, ImportStats)>
where
    T: DeserializeOwned,
    R: BufRead,
{
    let mut stats = ImportStats::new();
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        stats.total += 1;
        match serde_json::from_str::<T>(line) {
            Ok(record) => {
                records.push(record);
                stats.imported += 1;
            }
            Err(e) => {
                stats.errors.push(format!("Line {}: {}", index + 1, e));
            }
        }
    }

    Ok((records, stats))
}

/// Write `records` to a JSON Lines file, replacing it.
pub fn save_jsonl<T: Serialize>(path: impl AsRef<Path>, records: &[T]) -> IblResult<ExportStats> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let stats = export_jsonl(records, File::create(path)?)?;
    debug!(path = %path.display(), records = stats.exported, "saved dataset");
    Ok(stats)
}

/// Load a JSON Lines file, failing if any line is malformed.
pub fn load_jsonl<T: DeserializeOwned>(path: impl AsRef<Path>) -> IblResult<Vec<T>> {
    let path = path.as_ref();
    let (records, stats) = import_jsonl(BufReader::new(File::open(path)?))?;
    if !stats.is_success() {
        for error in &stats.errors {
            warn!(path = %path.display(), "{}", error);
        }
        return Err(IblError::parse(format!(
            "{}: {} malformed line(s), first: {}",
            path.display(),
            stats.errors.len(),
            stats.errors[0]
        )));
    }
    debug!(path = %path.display(), records = records.len(), "loaded dataset");
    Ok(records)
}
