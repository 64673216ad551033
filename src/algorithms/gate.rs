//! Distance gate between refined positions

use crate::algorithms::geodesy;
use crate::core::Coordinate;

/// Decides whether a refined position moved far enough to be committed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateGate {
    /// Minimum movement (meters); zero or negative disables the filter
    pub filter_m: f64,
}

impl UpdateGate {
    pub fn new(filter_m: f64) -> Self {
        Self { filter_m }
    }

    pub fn is_enabled(&self) -> bool {
        self.filter_m > 0.0
    }

    pub fn should_commit(&self, candidate: &Coordinate, last_accepted: Option<&Coordinate>) -> bool {
        should_commit(candidate, last_accepted, self.filter_m)
    }
}

impl Default for UpdateGate {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// True when `candidate` should replace `last_accepted`.
///
/// Always true for the first position and when the filter is disabled.
pub fn should_commit(candidate: &Coordinate, last_accepted: Option<&Coordinate>, filter_m: f64) -> bool {
    let Some(last) = last_accepted else {
        return true;
    };
    if filter_m <= 0.0 {
        return true;
    }
    geodesy::distance(last.point(), candidate.point()) >= filter_m
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GeoPoint;
    use nalgebra::Vector2;

    fn offset_north(meters: f64) -> Coordinate {
        let p = geodesy::unproject(Vector2::new(0.0, meters), GeoPoint::new(0.0, 0.0));
        Coordinate::new(p.latitude, p.longitude, 5.0)
    }

    #[test]
    fn test_first_position_always_commits() {
        let candidate = Coordinate::new(10.0, 10.0, 5.0);
        for filter in [-1.0, 0.0, 50.0, 1e9] {
            assert!(should_commit(&candidate, None, filter));
        }
    }

    #[test]
    fn test_disabled_filter_always_commits() {
        let last = Coordinate::new(0.0, 0.0, 5.0);
        assert!(should_commit(&last, Some(&last), 0.0));
        assert!(should_commit(&offset_north(0.1), Some(&last), -5.0));
    }

    #[test]
    fn test_fifty_meter_filter() {
        let gate = UpdateGate::new(50.0);
        let last = Coordinate::new(0.0, 0.0, 5.0);

        assert!(!gate.should_commit(&offset_north(10.0), Some(&last)));
        assert!(gate.should_commit(&offset_north(60.0), Some(&last)));
    }
}
