//! Physical constants and system defaults

/// Mean Earth radius used by the haversine and local projections (m)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Accuracy (m) that maps to a fusion weight of exactly 1.0
pub const REFERENCE_ACCURACY_M: f64 = 10.0;

/// Upper bound (m) of the "good" accuracy tier
pub const GOOD_ACCURACY_M: f64 = 10.0;

/// Upper bound (m) of the "fair" accuracy tier
pub const FAIR_ACCURACY_M: f64 = 30.0;
