//! Core data types for the tracking pipeline

use crate::core::constants::{FAIR_ACCURACY_M, GOOD_ACCURACY_M};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A position reading as reported by a position source.
///
/// Only latitude, longitude and accuracy are always present. The remaining
/// fields are `None` when the device does not report them, which is distinct
/// from a reported zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// 1-sigma horizontal error radius (meters)
    pub accuracy: f64,
    /// Altitude above the ellipsoid (meters)
    pub altitude: Option<f64>,
    /// 1-sigma vertical error (meters)
    pub altitude_accuracy: Option<f64>,
    /// Direction of travel, degrees clockwise from true north
    pub heading: Option<f64>,
    /// Ground speed (m/s)
    pub speed: Option<f64>,
}

impl Coordinate {
    /// Create a coordinate with only the mandatory fields set
    pub fn new(latitude: f64, longitude: f64, accuracy: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy,
            altitude: None,
            altitude_accuracy: None,
            heading: None,
            speed: None,
        }
    }

    pub fn with_altitude(mut self, altitude: f64, altitude_accuracy: Option<f64>) -> Self {
        self.altitude = Some(altitude);
        self.altitude_accuracy = altitude_accuracy;
        self
    }

    /// Set the heading. NaN headings (reported by stationary devices) are
    /// stored as absent.
    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = if heading.is_nan() { None } else { Some(heading) };
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    /// Heading if it is present and a real number
    pub fn known_heading(&self) -> Option<f64> {
        self.heading.filter(|h| !h.is_nan())
    }

    /// Latitude/longitude pair of this coordinate
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    pub fn accuracy_tier(&self) -> AccuracyTier {
        AccuracyTier::from_accuracy(self.accuracy)
    }
}

/// Bare latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl From<&Coordinate> for GeoPoint {
    fn from(coord: &Coordinate) -> Self {
        coord.point()
    }
}

/// Identifies which subscription produced a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceTag {
    /// The main position watcher
    Primary,
    /// One of the additional, differently parameterized watchers
    Triangulation(u8),
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceTag::Primary => write!(f, "primary"),
            SourceTag::Triangulation(index) => write!(f, "triangulation-{}", index),
        }
    }
}

/// One raw reading held in the sample window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub source: SourceTag,
    /// Reading timestamp (milliseconds since epoch)
    pub timestamp_ms: u64,
    pub coordinate: Coordinate,
}

impl Sample {
    pub fn new(source: SourceTag, timestamp_ms: u64, coordinate: Coordinate) -> Self {
        Self { source, timestamp_ms, coordinate }
    }
}

/// Fused estimate produced from the sample window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RefinedPosition {
    /// Time the estimate was committed (milliseconds since epoch)
    pub timestamp_ms: u64,
    pub coordinate: Coordinate,
}

/// Unique key of a history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(pub u64);

/// Accepted position stored in the history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: EntryId,
    pub position: RefinedPosition,
}

/// Accuracy classification used for coloring and display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccuracyTier {
    /// Error radius up to 10 m
    Good,
    /// Error radius up to 30 m
    Fair,
    /// Anything worse
    Poor,
}

impl AccuracyTier {
    pub fn from_accuracy(accuracy_m: f64) -> Self {
        if accuracy_m <= GOOD_ACCURACY_M {
            AccuracyTier::Good
        } else if accuracy_m <= FAIR_ACCURACY_M {
            AccuracyTier::Fair
        } else {
            AccuracyTier::Poor
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nan_heading_is_absent() {
        let coord = Coordinate::new(1.0, 2.0, 5.0).with_heading(f64::NAN);
        assert!(coord.heading.is_none());
        assert!(coord.known_heading().is_none());

        let coord = Coordinate::new(1.0, 2.0, 5.0).with_heading(90.0);
        assert_eq!(coord.known_heading(), Some(90.0));
    }

    #[test]
    fn test_accuracy_tiers() {
        assert_eq!(AccuracyTier::from_accuracy(3.0), AccuracyTier::Good);
        assert_eq!(AccuracyTier::from_accuracy(10.0), AccuracyTier::Good);
        assert_eq!(AccuracyTier::from_accuracy(10.5), AccuracyTier::Fair);
        assert_eq!(AccuracyTier::from_accuracy(30.0), AccuracyTier::Fair);
        assert_eq!(AccuracyTier::from_accuracy(31.0), AccuracyTier::Poor);
    }

    #[test]
    fn test_source_tag_display() {
        assert_eq!(SourceTag::Primary.to_string(), "primary");
        assert_eq!(SourceTag::Triangulation(2).to_string(), "triangulation-2");
    }
}
