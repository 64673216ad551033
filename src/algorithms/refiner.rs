//! Confidence-weighted fusion of the sample window
//!
//! Every sample contributes in proportion to `10 / accuracy`, so a 5 m
//! reading weighs four times as much as a 20 m one. There is no motion
//! model; recency only matters through buffer eviction.

use crate::core::{Coordinate, Sample, REFERENCE_ACCURACY_M};

/// Fuses buffered samples into a single coordinate
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionRefiner;

/// Weighted running sum for an optional field
#[derive(Debug, Clone, Copy, Default)]
struct OptionalSum {
    sum: f64,
    count: usize,
}

impl OptionalSum {
    fn add(&mut self, value: Option<f64>, weight: f64) {
        if let Some(v) = value.filter(|v| !v.is_nan()) {
            self.sum += v * weight;
            self.count += 1;
        }
    }

    fn finish(self) -> Option<f64> {
        if self.count > 0 {
            Some(self.sum)
        } else {
            None
        }
    }
}

impl PositionRefiner {
    pub fn new() -> Self {
        Self
    }

    /// Raw (unnormalized) weight of a single sample
    pub fn sample_weight(sample: &Sample) -> f64 {
        let accuracy = sample.coordinate.accuracy;
        if accuracy.is_finite() && accuracy != 0.0 {
            REFERENCE_ACCURACY_M / accuracy
        } else {
            1.0
        }
    }

    /// Weights of all samples normalized to sum to 1
    pub fn normalized_weights<'a, I>(samples: I) -> Vec<f64>
    where
        I: IntoIterator<Item = &'a Sample>,
    {
        let raw: Vec<f64> = samples.into_iter().map(Self::sample_weight).collect();
        let total: f64 = raw.iter().sum();
        if raw.is_empty() || total == 0.0 || !total.is_finite() {
            let n = raw.len().max(1) as f64;
            return raw.iter().map(|_| 1.0 / n).collect();
        }
        raw.iter().map(|w| w / total).collect()
    }

    /// Fuse the given samples.
    ///
    /// Returns `None` for an empty window; callers treat that as "no update
    /// this tick". A single sample is returned unchanged.
    pub fn refine<'a, I>(&self, samples: I) -> Option<Coordinate>
    where
        I: IntoIterator<Item = &'a Sample>,
        I::IntoIter: Clone,
    {
        let samples = samples.into_iter();
        let mut peek = samples.clone();
        let first = peek.next()?;
        if peek.next().is_none() {
            return Some(first.coordinate);
        }

        let weights = Self::normalized_weights(samples.clone());

        let mut latitude = 0.0;
        let mut longitude = 0.0;
        let mut accuracy = 0.0;
        let mut altitude = OptionalSum::default();
        let mut altitude_accuracy = OptionalSum::default();
        let mut heading = OptionalSum::default();
        let mut speed = OptionalSum::default();

        for (sample, w) in samples.zip(weights) {
            let c = &sample.coordinate;
            latitude += c.latitude * w;
            longitude += c.longitude * w;
            accuracy += c.accuracy * w;

            altitude.add(c.altitude, w);
            altitude_accuracy.add(c.altitude_accuracy, w);
            heading.add(c.heading, w);
            speed.add(c.speed, w);
        }

        Some(Coordinate {
            latitude,
            longitude,
            accuracy,
            altitude: altitude.finish(),
            altitude_accuracy: altitude_accuracy.finish(),
            heading: heading.finish(),
            speed: speed.finish(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SourceTag;

    fn sample(lat: f64, lon: f64, accuracy: f64) -> Sample {
        Sample::new(SourceTag::Primary, 0, Coordinate::new(lat, lon, accuracy))
    }

    #[test]
    fn test_empty_window_has_no_data() {
        let refiner = PositionRefiner::new();
        let samples: Vec<Sample> = Vec::new();
        assert!(refiner.refine(&samples).is_none());
    }

    #[test]
    fn test_single_sample_is_returned_unchanged() {
        let refiner = PositionRefiner::new();
        let coord = Coordinate::new(-23.5, -46.6, 12.0)
            .with_altitude(760.0, Some(4.0))
            .with_speed(1.2);
        let samples = vec![Sample::new(SourceTag::Primary, 10, coord)];
        assert_eq!(refiner.refine(&samples), Some(coord));
    }

    #[test]
    fn test_weights_sum_to_one() {
        let samples = vec![
            sample(0.0, 0.0, 5.0),
            sample(0.0, 0.0, 10.0),
            sample(0.0, 0.0, 20.0),
            sample(0.0, 0.0, 0.0),
            sample(0.0, 0.0, 3.3),
        ];
        let weights = PositionRefiner::normalized_weights(&samples);
        let total: f64 = weights.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_accuracy_gets_unit_weight() {
        let s = sample(0.0, 0.0, 0.0);
        assert_eq!(PositionRefiner::sample_weight(&s), 1.0);
        let s = sample(0.0, 0.0, 5.0);
        assert_eq!(PositionRefiner::sample_weight(&s), 2.0);
    }

    #[test]
    fn test_identical_coordinates_refine_to_themselves() {
        let refiner = PositionRefiner::new();
        let samples = vec![
            sample(45.0, 7.0, 5.0),
            sample(45.0, 7.0, 10.0),
            sample(45.0, 7.0, 20.0),
        ];
        let refined = refiner.refine(&samples).unwrap();
        assert!((refined.latitude - 45.0).abs() < 1e-12);
        assert!((refined.longitude - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_more_accurate_samples_dominate() {
        let refiner = PositionRefiner::new();
        // Weights 2.0 and 0.5 normalize to 0.8 and 0.2
        let samples = vec![sample(1.0, 1.0, 5.0), sample(2.0, 2.0, 20.0)];
        let refined = refiner.refine(&samples).unwrap();
        assert!((refined.latitude - 1.2).abs() < 1e-12);
        assert!((refined.longitude - 1.2).abs() < 1e-12);
        assert!((refined.accuracy - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_optional_fields_only_from_present_samples() {
        let refiner = PositionRefiner::new();
        let samples = vec![
            Sample::new(SourceTag::Primary, 0, Coordinate::new(0.0, 0.0, 10.0).with_speed(2.0)),
            Sample::new(SourceTag::Triangulation(0), 0, Coordinate::new(0.0, 0.0, 10.0)),
        ];
        let refined = refiner.refine(&samples).unwrap();
        // Equal weights of 0.5; only the first sample reports speed
        assert_eq!(refined.speed, Some(1.0));
        assert!(refined.altitude.is_none());
        assert!(refined.altitude_accuracy.is_none());
        assert!(refined.heading.is_none());
    }

    #[test]
    fn test_nan_heading_is_ignored() {
        let refiner = PositionRefiner::new();
        let mut with_nan = Coordinate::new(0.0, 0.0, 10.0);
        with_nan.heading = Some(f64::NAN);
        let samples = vec![
            Sample::new(SourceTag::Primary, 0, with_nan),
            Sample::new(SourceTag::Primary, 0, with_nan),
        ];
        let refined = refiner.refine(&samples).unwrap();
        assert!(refined.heading.is_none());
    }
}
