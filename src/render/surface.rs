//! Drawing primitives consumed by the renderer

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// RGBA color with alpha in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const WHITE: Color = Color::rgba(255, 255, 255, 1.0);
}

/// Horizontal text anchoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Center,
}

/// Minimal 2D drawing interface a display backend implements
pub trait DrawSurface {
    /// Erase the whole surface
    fn clear(&mut self, width: f64, height: f64);

    fn line(&mut self, from: Point2<f64>, to: Point2<f64>, color: Color, width: f64);

    /// Connected line through all points
    fn polyline(&mut self, points: &[Point2<f64>], color: Color, width: f64);

    fn fill_circle(&mut self, center: Point2<f64>, radius: f64, color: Color);

    fn stroke_circle(&mut self, center: Point2<f64>, radius: f64, color: Color, width: f64);

    fn fill_rect(&mut self, origin: Point2<f64>, width: f64, height: f64, color: Color);

    fn text(&mut self, text: &str, at: Point2<f64>, size_px: f64, align: TextAlign, color: Color);
}

/// A recorded drawing call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear { width: f64, height: f64 },
    Line { from: Point2<f64>, to: Point2<f64>, color: Color, width: f64 },
    Polyline { points: Vec<Point2<f64>>, color: Color, width: f64 },
    FillCircle { center: Point2<f64>, radius: f64, color: Color },
    StrokeCircle { center: Point2<f64>, radius: f64, color: Color, width: f64 },
    FillRect { origin: Point2<f64>, width: f64, height: f64, color: Color },
    Text { text: String, at: Point2<f64>, size_px: f64, align: TextAlign, color: Color },
}

/// Surface that stores every call instead of drawing it
#[derive(Debug, Clone, Default)]
pub struct CommandRecorder {
    commands: Vec<DrawCommand>,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Take the recorded commands, leaving the recorder empty
    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// All text strings drawn, in order
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl DrawSurface for CommandRecorder {
    fn clear(&mut self, width: f64, height: f64) {
        self.commands.push(DrawCommand::Clear { width, height });
    }

    fn line(&mut self, from: Point2<f64>, to: Point2<f64>, color: Color, width: f64) {
        self.commands.push(DrawCommand::Line { from, to, color, width });
    }

    fn polyline(&mut self, points: &[Point2<f64>], color: Color, width: f64) {
        self.commands.push(DrawCommand::Polyline {
            points: points.to_vec(),
            color,
            width,
        });
    }

    fn fill_circle(&mut self, center: Point2<f64>, radius: f64, color: Color) {
        self.commands.push(DrawCommand::FillCircle { center, radius, color });
    }

    fn stroke_circle(&mut self, center: Point2<f64>, radius: f64, color: Color, width: f64) {
        self.commands.push(DrawCommand::StrokeCircle { center, radius, color, width });
    }

    fn fill_rect(&mut self, origin: Point2<f64>, width: f64, height: f64, color: Color) {
        self.commands.push(DrawCommand::FillRect { origin, width, height, color });
    }

    fn text(&mut self, text: &str, at: Point2<f64>, size_px: f64, align: TextAlign, color: Color) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            at,
            size_px,
            align,
            color,
        });
    }
}
