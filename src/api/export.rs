//! CSV export of the position history

use crate::core::HistoryEntry;
use crate::processing::HistoryStore;
use chrono::{DateTime, FixedOffset, Local, Offset, Utc};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Placeholder written for values the device did not report
pub const NOT_AVAILABLE: &str = "N/D";

/// CSV column names, in output order
pub const CSV_HEADER: [&str; 9] = [
    "date",
    "time",
    "latitude",
    "longitude",
    "accuracy_m",
    "altitude_m",
    "altitude_accuracy_m",
    "speed_mps",
    "heading_deg",
];

/// Finished export ready to hand to a sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPayload {
    /// Suggested file name
    pub filename: String,
    pub content: String,
}

/// Export failures
#[derive(Debug, Clone, PartialEq)]
pub enum ExportError {
    /// Nothing recorded yet
    EmptyHistory,
    /// Timestamp outside the range chrono can represent
    InvalidTimestamp { timestamp_ms: u64 },
    /// CSV encoding failed
    CsvError { message: String },
    /// The sink could not store the payload
    IoError { message: String },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::EmptyHistory => write!(f, "No positions recorded, nothing to export"),
            ExportError::InvalidTimestamp { timestamp_ms } => {
                write!(f, "Invalid timestamp: {}", timestamp_ms)
            }
            ExportError::CsvError { message } => write!(f, "CSV error: {}", message),
            ExportError::IoError { message } => write!(f, "I/O error: {}", message),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<csv::Error> for ExportError {
    fn from(error: csv::Error) -> Self {
        ExportError::CsvError { message: error.to_string() }
    }
}

/// Destination of finished exports
pub trait ExportSink {
    fn deliver(&mut self, payload: &ExportPayload) -> Result<(), ExportError>;
}

/// Writes each payload as a file inside a directory
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            written: Vec::new(),
        }
    }

    /// Paths written so far, oldest first
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl ExportSink for DirectorySink {
    fn deliver(&mut self, payload: &ExportPayload) -> Result<(), ExportError> {
        let path = self.dir.join(&payload.filename);
        fs::write(&path, &payload.content).map_err(|e| ExportError::IoError {
            message: format!("Failed to write '{}': {}", path.display(), e),
        })?;
        info!(path = %path.display(), bytes = payload.content.len(), "export written");
        self.written.push(path);
        Ok(())
    }
}

/// Keeps payloads in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub payloads: Vec<ExportPayload>,
}

impl ExportSink for MemorySink {
    fn deliver(&mut self, payload: &ExportPayload) -> Result<(), ExportError> {
        self.payloads.push(payload.clone());
        Ok(())
    }
}

/// Builds CSV exports with dates rendered in a fixed time zone
#[derive(Debug, Clone, Copy)]
pub struct CsvExporter {
    offset: FixedOffset,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self::local()
    }
}

impl CsvExporter {
    /// Dates in the host's current local offset
    pub fn local() -> Self {
        Self::with_offset(Local::now().offset().fix())
    }

    pub fn with_offset(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// File name for an export created at `now_ms`
    pub fn filename(&self, now_ms: u64) -> Result<String, ExportError> {
        let now = self.datetime(now_ms)?;
        Ok(format!("geotracker_export_{}.csv", now.format("%Y%m%d_%H%M")))
    }

    /// Render entries as CSV, one row per entry in the given order
    pub fn to_csv(&self, entries: &[HistoryEntry]) -> Result<String, ExportError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(CSV_HEADER)?;

        for entry in entries {
            let when = self.datetime(entry.position.timestamp_ms)?;
            let coord = &entry.position.coordinate;
            writer.write_record([
                when.format("%Y-%m-%d").to_string(),
                when.format("%H:%M:%S").to_string(),
                format!("{:.8}", coord.latitude),
                format!("{:.8}", coord.longitude),
                format!("{:.2}", coord.accuracy),
                optional(coord.altitude, 2),
                optional(coord.altitude_accuracy, 2),
                optional(coord.speed, 2),
                optional(coord.known_heading().map(f64::round), 0),
            ])?;
        }

        let bytes = writer.into_inner().map_err(|e| ExportError::CsvError {
            message: e.to_string(),
        })?;
        String::from_utf8(bytes).map_err(|e| ExportError::CsvError { message: e.to_string() })
    }

    /// Export the whole history, oldest entry first
    pub fn export(&self, history: &HistoryStore, now_ms: u64) -> Result<ExportPayload, ExportError> {
        if history.is_empty() {
            warn!("export requested with empty history");
            return Err(ExportError::EmptyHistory);
        }
        Ok(ExportPayload {
            filename: self.filename(now_ms)?,
            content: self.to_csv(&history.export())?,
        })
    }

    fn datetime(&self, timestamp_ms: u64) -> Result<DateTime<FixedOffset>, ExportError> {
        i64::try_from(timestamp_ms)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|utc| utc.with_timezone(&self.offset))
            .ok_or(ExportError::InvalidTimestamp { timestamp_ms })
    }
}

fn optional(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", decimals, v),
        None => NOT_AVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Coordinate, RefinedPosition};
    use tempfile::tempdir;

    // 2024-03-05 14:07:09 UTC
    const TS: u64 = 1_709_647_629_000;

    fn utc() -> CsvExporter {
        CsvExporter::with_offset(FixedOffset::east_opt(0).unwrap())
    }

    fn history() -> HistoryStore {
        let mut history = HistoryStore::new(10);
        history.append(RefinedPosition {
            timestamp_ms: TS,
            coordinate: Coordinate::new(-23.5505199, -46.6333094, 4.567),
        });
        let full = Coordinate::new(-23.55, -46.63, 12.0)
            .with_altitude(760.456, Some(3.0))
            .with_heading(179.6)
            .with_speed(1.234);
        history.append(RefinedPosition { timestamp_ms: TS + 1000, coordinate: full });
        history
    }

    #[test]
    fn test_filename() {
        assert_eq!(utc().filename(TS).unwrap(), "geotracker_export_20240305_1407.csv");

        let brt = CsvExporter::with_offset(FixedOffset::west_opt(3 * 3600).unwrap());
        assert_eq!(brt.filename(TS).unwrap(), "geotracker_export_20240305_1107.csv");
    }

    #[test]
    fn test_csv_rows_oldest_first() {
        let payload = utc().export(&history(), TS).unwrap();
        let lines: Vec<&str> = payload.content.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER.join(","));
        assert_eq!(
            lines[1],
            "2024-03-05,14:07:09,-23.55051990,-46.63330940,4.57,N/D,N/D,N/D,N/D"
        );
        assert_eq!(
            lines[2],
            "2024-03-05,14:07:10,-23.55000000,-46.63000000,12.00,760.46,3.00,1.23,180"
        );
    }

    #[test]
    fn test_empty_history_is_an_error() {
        let history = HistoryStore::new(10);
        assert_eq!(utc().export(&history, TS), Err(ExportError::EmptyHistory));
    }

    #[test]
    fn test_directory_sink() {
        let dir = tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path());
        let payload = utc().export(&history(), TS).unwrap();

        sink.deliver(&payload).unwrap();
        let written = fs::read_to_string(dir.path().join(&payload.filename)).unwrap();
        assert_eq!(written, payload.content);
        assert_eq!(sink.written().len(), 1);
    }
}
