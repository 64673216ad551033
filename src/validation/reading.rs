//! Sanity checks for readings before they enter the sample window

use crate::core::Coordinate;
use crate::source::Reading;
use std::fmt;

/// Reasons a reading is refused
#[derive(Debug, Clone, PartialEq)]
pub enum ReadingError {
    NonFinite { field: &'static str },
    LatitudeOutOfRange { latitude: f64 },
    LongitudeOutOfRange { longitude: f64 },
    NegativeAccuracy { accuracy: f64 },
}

impl fmt::Display for ReadingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadingError::NonFinite { field } => write!(f, "Non-finite value in {}", field),
            ReadingError::LatitudeOutOfRange { latitude } => {
                write!(f, "Latitude out of range: {}", latitude)
            }
            ReadingError::LongitudeOutOfRange { longitude } => {
                write!(f, "Longitude out of range: {}", longitude)
            }
            ReadingError::NegativeAccuracy { accuracy } => {
                write!(f, "Negative accuracy: {}", accuracy)
            }
        }
    }
}

impl std::error::Error for ReadingError {}

/// Validator for incoming readings, keeping simple counters
#[derive(Debug, Clone, Default)]
pub struct ReadingValidator {
    accepted: u64,
    rejected: u64,
}

impl ReadingValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check a reading and update the counters
    pub fn validate(&mut self, reading: &Reading) -> Result<(), ReadingError> {
        let result = Self::check(&reading.coordinate);
        match result {
            Ok(()) => self.accepted += 1,
            Err(_) => self.rejected += 1,
        }
        result
    }

    /// Stateless check of a coordinate.
    ///
    /// Optional fields only fail on infinities; a NaN heading means
    /// "unknown" and passes.
    pub fn check(coord: &Coordinate) -> Result<(), ReadingError> {
        if !coord.latitude.is_finite() {
            return Err(ReadingError::NonFinite { field: "latitude" });
        }
        if !coord.longitude.is_finite() {
            return Err(ReadingError::NonFinite { field: "longitude" });
        }
        if !coord.accuracy.is_finite() {
            return Err(ReadingError::NonFinite { field: "accuracy" });
        }
        if !(-90.0..=90.0).contains(&coord.latitude) {
            return Err(ReadingError::LatitudeOutOfRange { latitude: coord.latitude });
        }
        if !(-180.0..=180.0).contains(&coord.longitude) {
            return Err(ReadingError::LongitudeOutOfRange { longitude: coord.longitude });
        }
        if coord.accuracy < 0.0 {
            return Err(ReadingError::NegativeAccuracy { accuracy: coord.accuracy });
        }

        let optional = [
            ("altitude", coord.altitude),
            ("altitude_accuracy", coord.altitude_accuracy),
            ("heading", coord.heading),
            ("speed", coord.speed),
        ];
        for (field, value) in optional {
            if value.is_some_and(f64::is_infinite) {
                return Err(ReadingError::NonFinite { field });
            }
        }
        Ok(())
    }

    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_reading() {
        let coord = Coordinate::new(-23.55, -46.63, 12.0)
            .with_altitude(760.0, Some(4.0))
            .with_speed(1.2);
        assert_eq!(ReadingValidator::check(&coord), Ok(()));
    }

    #[test]
    fn test_rejects_bad_coordinates() {
        assert_eq!(
            ReadingValidator::check(&Coordinate::new(f64::NAN, 0.0, 5.0)),
            Err(ReadingError::NonFinite { field: "latitude" })
        );
        assert!(matches!(
            ReadingValidator::check(&Coordinate::new(91.0, 0.0, 5.0)),
            Err(ReadingError::LatitudeOutOfRange { .. })
        ));
        assert!(matches!(
            ReadingValidator::check(&Coordinate::new(0.0, -180.5, 5.0)),
            Err(ReadingError::LongitudeOutOfRange { .. })
        ));
        assert!(matches!(
            ReadingValidator::check(&Coordinate::new(0.0, 0.0, -1.0)),
            Err(ReadingError::NegativeAccuracy { .. })
        ));
    }

    #[test]
    fn test_nan_heading_passes_but_infinite_speed_fails() {
        let mut coord = Coordinate::new(0.0, 0.0, 5.0);
        coord.heading = Some(f64::NAN);
        assert_eq!(ReadingValidator::check(&coord), Ok(()));

        coord.speed = Some(f64::INFINITY);
        assert_eq!(
            ReadingValidator::check(&coord),
            Err(ReadingError::NonFinite { field: "speed" })
        );
    }

    #[test]
    fn test_counters() {
        let mut validator = ReadingValidator::new();
        let good = Reading { timestamp_ms: 1, coordinate: Coordinate::new(0.0, 0.0, 5.0) };
        let bad = Reading { timestamp_ms: 2, coordinate: Coordinate::new(100.0, 0.0, 5.0) };
        assert!(validator.validate(&good).is_ok());
        assert!(validator.validate(&bad).is_err());
        assert_eq!(validator.accepted(), 1);
        assert_eq!(validator.rejected(), 1);
    }
}
