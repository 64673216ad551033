//! Great-circle distance and local planar projection
//!
//! Both functions assume a spherical Earth of radius [`EARTH_RADIUS_M`]. The
//! projection is equirectangular around a reference point and is only meant
//! for the tens-of-kilometres range a tracking session covers.

use crate::core::{GeoPoint, EARTH_RADIUS_M};
use nalgebra::Vector2;

/// Haversine distance between two points (meters)
pub fn distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Offset of `point` from `reference` in local meters.
///
/// `x` is east, `y` is north.
pub fn project(point: GeoPoint, reference: GeoPoint) -> Vector2<f64> {
    let north = (point.latitude - reference.latitude).to_radians() * EARTH_RADIUS_M;
    let east = (point.longitude - reference.longitude).to_radians()
        * EARTH_RADIUS_M
        * reference.latitude.to_radians().cos();

    Vector2::new(east, north)
}

/// Inverse of [`project`]: the point lying `offset` meters (east, north) away
/// from `reference`.
pub fn unproject(offset: Vector2<f64>, reference: GeoPoint) -> GeoPoint {
    let latitude = reference.latitude + (offset.y / EARTH_RADIUS_M).to_degrees();

    let cos_lat = reference.latitude.to_radians().cos();
    let longitude = if cos_lat.abs() < f64::EPSILON {
        reference.longitude
    } else {
        reference.longitude + (offset.x / (EARTH_RADIUS_M * cos_lat)).to_degrees()
    };

    GeoPoint::new(latitude, longitude)
}
