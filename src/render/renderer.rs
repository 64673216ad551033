//! Turns viewport, history and current position into drawing calls
//!
//! The renderer keeps no state of its own; every frame is a pure function of
//! its inputs.

use crate::core::{AccuracyTier, Coordinate, RefinedPosition};
use crate::processing::HistoryStore;
use crate::render::surface::{Color, DrawSurface, TextAlign};
use crate::render::viewport::Viewport;
use nalgebra::Point2;

/// Message drawn while there is nothing to show
pub const PLACEHOLDER_TEXT: &str = "Waiting for position data...";

/// Length of the scale bar (meters)
pub const SCALE_BAR_M: f64 = 100.0;

const GRID_CELL_PX: f64 = 20.0;
const MARGIN_PX: f64 = 20.0;
const SCALE_BAR_HEIGHT_PX: f64 = 5.0;

const PLACEHOLDER: Color = Color::rgba(153, 153, 153, 1.0);
const GRID: Color = Color::rgba(200, 200, 200, 0.3);
const AXIS: Color = Color::rgba(100, 100, 100, 0.5);
const PATH: Color = Color::rgba(0, 102, 204, 0.7);
const ACCURACY_FILL: Color = Color::rgba(0, 102, 204, 0.1);
const ACCURACY_EDGE: Color = Color::rgba(0, 102, 204, 0.5);
const MARKER: Color = Color::rgba(0, 102, 204, 1.0);
const HEADING: Color = Color::rgba(0, 102, 204, 0.8);
const LABEL: Color = Color::rgba(0, 0, 0, 0.7);

/// Point color for an accuracy tier
pub fn tier_color(tier: AccuracyTier) -> Color {
    match tier {
        AccuracyTier::Good => Color::rgba(40, 167, 69, 0.8),
        AccuracyTier::Fair => Color::rgba(255, 193, 7, 0.8),
        AccuracyTier::Poor => Color::rgba(220, 53, 69, 0.8),
    }
}

/// Stateless map renderer
#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    /// Draw one frame
    pub fn render(
        &self,
        surface: &mut dyn DrawSurface,
        viewport: &Viewport,
        history: &HistoryStore,
        current: Option<&RefinedPosition>,
    ) {
        let (width, height) = viewport.size();
        surface.clear(width, height);

        if viewport.reference_center().is_none() || history.is_empty() {
            surface.text(
                PLACEHOLDER_TEXT,
                Point2::new(width / 2.0, height / 2.0),
                16.0,
                TextAlign::Center,
                PLACEHOLDER,
            );
            return;
        }

        self.draw_grid(surface, viewport);
        self.draw_history(surface, viewport, history);
        if let Some(position) = current {
            self.draw_current(surface, viewport, &position.coordinate);
        }
        self.draw_scale(surface, viewport);
    }

    fn draw_grid(&self, surface: &mut dyn DrawSurface, viewport: &Viewport) {
        let (width, height) = viewport.size();
        let zoom = viewport.zoom();
        let cell = GRID_CELL_PX * zoom;
        let offset = viewport.offset();

        let mut y = (offset.y * zoom).rem_euclid(cell);
        while y < height {
            surface.line(Point2::new(0.0, y), Point2::new(width, y), GRID, 1.0);
            y += cell;
        }

        let mut x = (offset.x * zoom).rem_euclid(cell);
        while x < width {
            surface.line(Point2::new(x, 0.0), Point2::new(x, height), GRID, 1.0);
            x += cell;
        }

        let origin = viewport.origin_pixel();
        surface.line(Point2::new(0.0, origin.y), Point2::new(width, origin.y), AXIS, 2.0);
        surface.line(Point2::new(origin.x, 0.0), Point2::new(origin.x, height), AXIS, 2.0);
    }

    fn draw_history(&self, surface: &mut dyn DrawSurface, viewport: &Viewport, history: &HistoryStore) {
        // A path needs two entries; a lone fix is shown by the current marker
        if history.len() < 2 {
            return;
        }

        let zoom = viewport.zoom();
        let points: Vec<(Point2<f64>, AccuracyTier)> = history
            .iter()
            .filter_map(|entry| {
                let coord = &entry.position.coordinate;
                viewport.project(coord.point()).map(|p| (p, coord.accuracy_tier()))
            })
            .collect();

        if points.len() >= 2 {
            let path: Vec<Point2<f64>> = points.iter().map(|(p, _)| *p).collect();
            surface.polyline(&path, PATH, 2.0 * zoom);
        }

        let last = points.len().saturating_sub(1);
        for (index, (point, tier)) in points.iter().enumerate() {
            let radius = if index == 0 || index == last { 5.0 } else { 3.0 } * zoom;
            surface.fill_circle(*point, radius, tier_color(*tier));
        }
    }

    fn draw_current(&self, surface: &mut dyn DrawSurface, viewport: &Viewport, coord: &Coordinate) {
        let Some(point) = viewport.project(coord.point()) else {
            return;
        };
        let zoom = viewport.zoom();

        let accuracy_radius = viewport.meters_to_pixels(coord.accuracy);
        surface.fill_circle(point, accuracy_radius, ACCURACY_FILL);
        surface.stroke_circle(point, accuracy_radius, ACCURACY_EDGE, zoom);

        let marker = 8.0 * zoom;
        surface.fill_circle(point, marker, Color::WHITE);
        surface.fill_circle(point, marker * 0.6, MARKER);

        if let Some(heading) = coord.known_heading() {
            let rad = heading.to_radians();
            let length = 20.0 * zoom;
            let tip = Point2::new(point.x + rad.sin() * length, point.y - rad.cos() * length);
            surface.line(point, tip, HEADING, 2.0 * zoom);
        }

        surface.text(
            &format!("{:.6}, {:.6}", coord.latitude, coord.longitude),
            Point2::new(point.x, point.y + marker * 2.5),
            12.0 * zoom,
            TextAlign::Center,
            LABEL,
        );
    }

    fn draw_scale(&self, surface: &mut dyn DrawSurface, viewport: &Viewport) {
        let (width, height) = viewport.size();
        let bar = viewport.meters_to_pixels(SCALE_BAR_M);
        let left = width - MARGIN_PX - bar;
        let top = height - MARGIN_PX - SCALE_BAR_HEIGHT_PX;

        surface.fill_rect(Point2::new(left, top), bar, SCALE_BAR_HEIGHT_PX, LABEL);
        surface.fill_rect(Point2::new(left, top - 5.0), 2.0, 15.0, LABEL);
        surface.fill_rect(Point2::new(width - MARGIN_PX, top - 5.0), 2.0, 15.0, LABEL);

        surface.text(
            &format!("{} m", SCALE_BAR_M),
            Point2::new(left + bar / 2.0, top - 8.0),
            12.0,
            TextAlign::Center,
            LABEL,
        );
        surface.text(
            &format!("Zoom: {:.1}x", viewport.zoom()),
            Point2::new(MARGIN_PX, height - MARGIN_PX),
            12.0,
            TextAlign::Left,
            LABEL,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GeoPoint;
    use crate::render::surface::{CommandRecorder, DrawCommand};
    use crate::render::viewport::ViewportConfig;

    fn position(lat: f64, accuracy: f64) -> RefinedPosition {
        RefinedPosition {
            timestamp_ms: 0,
            coordinate: Coordinate::new(lat, 0.0, accuracy),
        }
    }

    #[test]
    fn test_placeholder_without_data() {
        let viewport = Viewport::new(400.0, 300.0, ViewportConfig::default());
        let history = HistoryStore::new(10);
        let mut recorder = CommandRecorder::new();

        Renderer::new().render(&mut recorder, &viewport, &history, None);

        assert_eq!(recorder.texts(), vec![PLACEHOLDER_TEXT]);
        assert!(matches!(recorder.commands()[0], DrawCommand::Clear { .. }));
    }

    #[test]
    fn test_placeholder_with_center_but_empty_history() {
        let mut viewport = Viewport::new(400.0, 300.0, ViewportConfig::default());
        viewport.set_reference_center(GeoPoint::new(0.0, 0.0));
        let history = HistoryStore::new(10);
        let mut recorder = CommandRecorder::new();

        Renderer::new().render(&mut recorder, &viewport, &history, None);
        assert_eq!(recorder.texts(), vec![PLACEHOLDER_TEXT]);
    }

    #[test]
    fn test_full_frame() {
        let mut viewport = Viewport::new(400.0, 300.0, ViewportConfig::default());
        viewport.set_reference_center(GeoPoint::new(0.0, 0.0));

        let mut history = HistoryStore::new(10);
        history.append(position(0.0, 5.0));
        history.append(position(0.0001, 20.0));
        history.append(position(0.0002, 50.0));

        let mut current = position(0.0002, 50.0);
        current.coordinate.heading = Some(90.0);

        let mut recorder = CommandRecorder::new();
        Renderer::new().render(&mut recorder, &viewport, &history, Some(&current));

        let polylines: Vec<&DrawCommand> = recorder
            .commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::Polyline { .. }))
            .collect();
        assert_eq!(polylines.len(), 1);

        let point_colors: Vec<Color> = recorder
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillCircle { color, .. } if color.a == 0.8 => Some(*color),
                _ => None,
            })
            .collect();
        assert_eq!(
            point_colors,
            vec![
                tier_color(AccuracyTier::Good),
                tier_color(AccuracyTier::Fair),
                tier_color(AccuracyTier::Poor),
            ]
        );

        let texts = recorder.texts();
        assert!(texts.contains(&"100 m"));
        assert!(texts.contains(&"Zoom: 2.0x"));
        assert!(texts.iter().any(|t| t.starts_with("0.000200, ")));

        let heading_line = recorder.commands().iter().any(|c| {
            matches!(c, DrawCommand::Line { color, .. } if *color == HEADING)
        });
        assert!(heading_line);
    }

    #[test]
    fn test_single_entry_draws_no_history() {
        let mut viewport = Viewport::new(400.0, 300.0, ViewportConfig::default());
        viewport.set_reference_center(GeoPoint::new(0.0, 0.0));
        let mut history = HistoryStore::new(10);
        history.append(position(0.0, 5.0));

        let mut recorder = CommandRecorder::new();
        Renderer::new().render(&mut recorder, &viewport, &history, None);

        let history_marks = recorder.commands().iter().any(|c| {
            matches!(c, DrawCommand::Polyline { .. } | DrawCommand::FillCircle { .. })
        });
        assert!(!history_marks);
        assert!(recorder.texts().contains(&"100 m"));
    }

    #[test]
    fn test_scale_bar_tracks_zoom() {
        let mut viewport = Viewport::new(400.0, 300.0, ViewportConfig::default());
        viewport.set_reference_center(GeoPoint::new(0.0, 0.0));
        viewport.zoom_in();
        let mut history = HistoryStore::new(10);
        history.append(position(0.0, 5.0));

        let mut recorder = CommandRecorder::new();
        Renderer::new().render(&mut recorder, &viewport, &history, None);

        let bar_width = recorder.commands().iter().find_map(|c| match c {
            DrawCommand::FillRect { width, height, .. } if *height == SCALE_BAR_HEIGHT_PX => Some(*width),
            _ => None,
        });
        // 100 m * 0.1 px/m * zoom 3.0
        assert!((bar_width.unwrap() - 30.0).abs() < 1e-9);
    }
}
