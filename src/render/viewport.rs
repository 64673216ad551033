//! Pan/zoom state and geo-to-pixel projection

use crate::algorithms::geodesy;
use crate::core::GeoPoint;
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Zoom limits and projection scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportConfig {
    /// Zoom restored by a reset
    pub default_zoom: f64,
    /// Multiplicative step of one zoom action
    pub zoom_factor: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Pixels per meter at zoom 1.0
    pub scale: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            default_zoom: 2.0,
            zoom_factor: 1.5,
            min_zoom: 0.5,
            max_zoom: 25.0,
            scale: 0.1,
        }
    }
}

/// View onto the local plane around a reference center.
///
/// The pan offset is kept in unzoomed pixels, so the same drag distance
/// moves the map less when zoomed in.
#[derive(Debug, Clone)]
pub struct Viewport {
    config: ViewportConfig,
    zoom: f64,
    offset: Vector2<f64>,
    reference_center: Option<GeoPoint>,
    width: f64,
    height: f64,
    drag_origin: Option<Point2<f64>>,
}

impl Viewport {
    pub fn new(width: f64, height: f64, config: ViewportConfig) -> Self {
        let zoom = config.default_zoom.clamp(config.min_zoom, config.max_zoom);
        Self {
            config,
            zoom,
            offset: Vector2::zeros(),
            reference_center: None,
            width,
            height,
            drag_origin: None,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn offset(&self) -> Vector2<f64> {
        self.offset
    }

    pub fn reference_center(&self) -> Option<GeoPoint> {
        self.reference_center
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_origin.is_some()
    }

    /// Replace zoom limits, keeping the current zoom inside them
    pub fn set_config(&mut self, config: ViewportConfig) {
        self.config = config;
        self.zoom = self.clamp_zoom(self.zoom);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// Start a drag at a pointer position
    pub fn begin_drag(&mut self, x: f64, y: f64) {
        self.drag_origin = Some(Point2::new(x, y));
    }

    /// Move an active drag; the delta is divided by the zoom at this moment
    pub fn drag_to(&mut self, x: f64, y: f64) {
        let Some(origin) = self.drag_origin else {
            return;
        };
        let pointer = Point2::new(x, y);
        self.offset += (pointer - origin) / self.zoom;
        self.drag_origin = Some(pointer);
    }

    /// End a drag (pointer released or left the surface)
    pub fn end_drag(&mut self) {
        self.drag_origin = None;
    }

    pub fn zoom_in(&mut self) {
        self.zoom = self.clamp_zoom(self.zoom * self.config.zoom_factor);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = self.clamp_zoom(self.zoom / self.config.zoom_factor);
    }

    /// Wheel scroll: negative delta zooms in, anything else zooms out
    pub fn wheel(&mut self, delta_y: f64) {
        if delta_y < 0.0 {
            self.zoom_in();
        } else {
            self.zoom_out();
        }
    }

    /// Restore default zoom and clear the pan offset
    pub fn reset(&mut self) {
        self.zoom = self.clamp_zoom(self.config.default_zoom);
        self.offset = Vector2::zeros();
    }

    /// Anchor the projection and reset the view
    pub fn set_reference_center(&mut self, center: GeoPoint) {
        self.reference_center = Some(center);
        self.reset();
    }

    /// Forget the reference center; the next accepted position sets a new one
    pub fn clear_reference_center(&mut self) {
        self.reference_center = None;
    }

    /// Pixel length of `meters` at the current zoom
    pub fn meters_to_pixels(&self, meters: f64) -> f64 {
        meters * self.config.scale * self.zoom
    }

    /// Pixel position of the reference center, accounting for pan
    pub fn origin_pixel(&self) -> Point2<f64> {
        Point2::new(
            self.width / 2.0 + self.offset.x * self.zoom,
            self.height / 2.0 + self.offset.y * self.zoom,
        )
    }

    /// Project a geographic point to surface pixels. North is up.
    pub fn project(&self, point: GeoPoint) -> Option<Point2<f64>> {
        let center = self.reference_center?;
        let local = geodesy::project(point, center);
        let origin = self.origin_pixel();
        Some(Point2::new(
            origin.x + self.meters_to_pixels(local.x),
            origin.y - self.meters_to_pixels(local.y),
        ))
    }

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.config.min_zoom, self.config.max_zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport::new(400.0, 300.0, ViewportConfig::default())
    }

    #[test]
    fn test_zoom_in_multiplies() {
        let mut vp = viewport();
        assert_eq!(vp.zoom(), 2.0);
        vp.zoom_in();
        assert!((vp.zoom() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_zoom_clamps_at_max() {
        let mut vp = viewport();
        for _ in 0..20 {
            vp.zoom_in();
        }
        assert_eq!(vp.zoom(), 25.0);
    }

    #[test]
    fn test_zoom_stays_in_range() {
        let mut vp = viewport();
        let actions: [fn(&mut Viewport); 4] = [
            |v| v.zoom_in(),
            |v| v.zoom_out(),
            |v| v.wheel(-1.0),
            |v| v.wheel(3.0),
        ];
        let pattern = [1usize, 1, 1, 3, 0, 0, 0, 0, 0, 0, 0, 0, 2, 2, 2, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 3];
        for &i in &pattern {
            actions[i](&mut vp);
            assert!(vp.zoom() >= 0.5 && vp.zoom() <= 25.0);
        }
    }

    #[test]
    fn test_wheel_direction() {
        let mut vp = viewport();
        vp.wheel(-100.0);
        assert!((vp.zoom() - 3.0).abs() < 1e-12);
        vp.wheel(100.0);
        assert!((vp.zoom() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_drag_divides_by_zoom() {
        let mut vp = viewport();
        vp.begin_drag(10.0, 10.0);
        vp.drag_to(30.0, 0.0);
        assert_eq!(vp.offset(), Vector2::new(10.0, -5.0));

        // Zoom is read live on each move
        vp.zoom_in();
        vp.drag_to(60.0, 0.0);
        assert!((vp.offset().x - 20.0).abs() < 1e-12);

        vp.end_drag();
        vp.drag_to(500.0, 500.0);
        assert!((vp.offset().x - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut vp = viewport();
        vp.zoom_in();
        vp.begin_drag(0.0, 0.0);
        vp.drag_to(50.0, 50.0);
        vp.end_drag();
        vp.reset();
        assert_eq!(vp.zoom(), 2.0);
        assert_eq!(vp.offset(), Vector2::zeros());
    }

    #[test]
    fn test_project_without_center() {
        let vp = viewport();
        assert!(vp.project(GeoPoint::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn test_project_center_and_north_up() {
        let mut vp = viewport();
        let center = GeoPoint::new(0.0, 0.0);
        vp.set_reference_center(center);

        let p = vp.project(center).unwrap();
        assert_eq!(p, Point2::new(200.0, 150.0));

        // ~111 m north and east; scale 0.1 px/m at zoom 2 gives ~22 px
        let ne = vp.project(GeoPoint::new(0.001, 0.001)).unwrap();
        assert!(ne.x > 200.0 && ne.y < 150.0);
        assert!((ne.x - 200.0 - 22.24).abs() < 0.1);
        assert!((150.0 - ne.y - 22.24).abs() < 0.1);
    }

    #[test]
    fn test_project_applies_pan_scaled_by_zoom() {
        let mut vp = viewport();
        vp.set_reference_center(GeoPoint::new(0.0, 0.0));
        vp.begin_drag(0.0, 0.0);
        vp.drag_to(20.0, 10.0);
        let p = vp.project(GeoPoint::new(0.0, 0.0)).unwrap();
        assert_eq!(p, Point2::new(220.0, 160.0));
    }
}
