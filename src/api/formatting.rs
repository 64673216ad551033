//! Position output formatting and serialization
//!
//! Display strings for the position panel and history table, plus JSON
//! rendering of session snapshots.

use crate::api::export::NOT_AVAILABLE;
use crate::api::types::TrackingStatus;
use crate::core::{AccuracyTier, Coordinate, GeoPoint, HistoryEntry, RefinedPosition};
use crate::processing::HistoryStore;
use chrono::{DateTime, FixedOffset, Local, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Position panel strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionDisplay {
    pub latitude: String,
    pub longitude: String,
    pub accuracy: String,
    /// Width of the accuracy bar in percent; fuller is better
    pub accuracy_percent: f64,
    pub tier: AccuracyTier,
    pub altitude: String,
    pub altitude_accuracy: String,
    pub speed: String,
    pub heading: String,
    pub time: String,
}

/// One row of the history table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub time: String,
    pub latitude: String,
    pub longitude: String,
    pub accuracy: String,
    pub altitude: String,
    pub speed: String,
}

/// Serializable view of a tracking session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub status: TrackingStatus,
    pub tracking: bool,
    pub watchers: usize,
    pub current: Option<RefinedPosition>,
    pub history_len: usize,
    pub zoom: f64,
    pub reference_center: Option<GeoPoint>,
    pub last_error: Option<String>,
    pub update_delta_ms: Option<u64>,
}

/// Accuracy bar fill: 0 m is a full bar, 100 m or worse is empty
pub fn accuracy_percent(accuracy_m: f64) -> f64 {
    (100.0 - accuracy_m).clamp(0.0, 100.0)
}

/// Formats positions for display in a fixed time zone
#[derive(Debug, Clone, Copy)]
pub struct PositionFormatter {
    offset: FixedOffset,
}

impl Default for PositionFormatter {
    fn default() -> Self {
        Self::local()
    }
}

impl PositionFormatter {
    /// Formatter using the machine's current UTC offset
    pub fn local() -> Self {
        Self::with_offset(Local::now().offset().fix())
    }

    pub fn with_offset(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Panel strings for a position
    pub fn format_position(&self, position: &RefinedPosition) -> PositionDisplay {
        let c = &position.coordinate;
        PositionDisplay {
            latitude: format!("{:.8}", c.latitude),
            longitude: format!("{:.8}", c.longitude),
            accuracy: format!("{:.2}", c.accuracy),
            accuracy_percent: accuracy_percent(c.accuracy),
            tier: c.accuracy_tier(),
            altitude: or_not_available(c.altitude, |v| format!("{:.2}", v)),
            altitude_accuracy: or_not_available(c.altitude_accuracy, |v| format!("{:.2}", v)),
            speed: or_not_available(c.speed, |v| format!("{:.2}", v)),
            heading: or_not_available(c.known_heading(), |v| format!("{:.0}", v.round())),
            time: self.time_of_day(position.timestamp_ms),
        }
    }

    /// History table row with units attached
    pub fn format_row(&self, entry: &HistoryEntry) -> HistoryRow {
        let c: &Coordinate = &entry.position.coordinate;
        HistoryRow {
            time: self.time_of_day(entry.position.timestamp_ms),
            latitude: format!("{:.8}", c.latitude),
            longitude: format!("{:.8}", c.longitude),
            accuracy: format!("{:.2} m", c.accuracy),
            altitude: or_not_available(c.altitude, |v| format!("{:.2} m", v)),
            speed: or_not_available(c.speed, |v| format!("{:.2} m/s", v)),
        }
    }

    /// Rows for the whole history, most recent first
    pub fn history_rows(&self, history: &HistoryStore) -> Vec<HistoryRow> {
        history.display_order().map(|entry| self.format_row(entry)).collect()
    }

    fn time_of_day(&self, timestamp_ms: u64) -> String {
        i64::try_from(timestamp_ms)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|utc| utc.with_timezone(&self.offset).format("%H:%M:%S").to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }
}

fn or_not_available(value: Option<f64>, format: impl Fn(f64) -> String) -> String {
    value.map(format).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// JSON formatter
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    /// Create a compact JSON formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pretty-printing JSON formatter
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    pub fn format_json<T: Serialize>(&self, value: &T) -> Result<String, serde_json::Error> {
        if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-03-05 14:07:09 UTC
    const TS: u64 = 1_709_647_629_000;

    fn utc() -> PositionFormatter {
        PositionFormatter::with_offset(FixedOffset::east_opt(0).unwrap())
    }

    fn position(coordinate: Coordinate) -> RefinedPosition {
        RefinedPosition { timestamp_ms: TS, coordinate }
    }

    #[test]
    fn test_accuracy_percent_clamps() {
        assert_eq!(accuracy_percent(0.0), 100.0);
        assert_eq!(accuracy_percent(12.5), 87.5);
        assert_eq!(accuracy_percent(100.0), 0.0);
        assert_eq!(accuracy_percent(250.0), 0.0);
    }

    #[test]
    fn test_format_position_with_missing_fields() {
        let display = utc().format_position(&position(Coordinate::new(-23.5505199, -46.6333094, 4.567)));

        assert_eq!(display.latitude, "-23.55051990");
        assert_eq!(display.longitude, "-46.63330940");
        assert_eq!(display.accuracy, "4.57");
        assert_eq!(display.tier, AccuracyTier::Good);
        assert_eq!(display.altitude, "N/D");
        assert_eq!(display.speed, "N/D");
        assert_eq!(display.heading, "N/D");
        assert_eq!(display.time, "14:07:09");
    }

    #[test]
    fn test_format_position_with_all_fields() {
        let coordinate = Coordinate::new(1.0, 2.0, 45.0)
            .with_altitude(760.456, Some(3.0))
            .with_speed(1.234)
            .with_heading(179.6);
        let display = utc().format_position(&position(coordinate));

        assert_eq!(display.altitude, "760.46");
        assert_eq!(display.altitude_accuracy, "3.00");
        assert_eq!(display.speed, "1.23");
        assert_eq!(display.heading, "180");
        assert_eq!(display.tier, AccuracyTier::Poor);
        assert_eq!(display.accuracy_percent, 55.0);
    }

    #[test]
    fn test_history_rows_most_recent_first() {
        let mut history = HistoryStore::new(10);
        history.append(position(Coordinate::new(1.0, 1.0, 5.0)));
        history.append(RefinedPosition {
            timestamp_ms: TS + 1000,
            coordinate: Coordinate::new(2.0, 2.0, 5.0).with_altitude(10.0, None),
        });

        let rows = utc().history_rows(&history);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].latitude, "2.00000000");
        assert_eq!(rows[0].time, "14:07:10");
        assert_eq!(rows[0].altitude, "10.00 m");
        assert_eq!(rows[1].accuracy, "5.00 m");
        assert_eq!(rows[1].speed, "N/D");
    }

    #[test]
    fn test_json_snapshot() {
        let snapshot = SessionSnapshot {
            status: TrackingStatus::Online,
            tracking: true,
            watchers: 4,
            current: None,
            history_len: 0,
            zoom: 2.0,
            reference_center: None,
            last_error: None,
            update_delta_ms: Some(1000),
        };

        let compact = JsonFormatter::new().format_json(&snapshot).unwrap();
        assert!(compact.contains("\"status\":\"online\""));
        assert!(!compact.contains('\n'));

        let pretty = JsonFormatter::pretty().format_json(&snapshot).unwrap();
        let parsed: SessionSnapshot = serde_json::from_str(&pretty).unwrap();
        assert_eq!(parsed, snapshot);
    }
}
