//! Drawing surface abstraction.
//!
//! The compositor never touches a real graphics API. It issues primitive
//! draw calls against [`Canvas`]; hosts adapt that to their toolkit, and
//! [`RecordingCanvas`] keeps the calls as data for tests and export.

use crate::heliodos_camera::ViewPoint;
use serde::{Deserialize, Serialize};

// ============================================================================
// PAINT
// ============================================================================

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }
}

/// Line paint: color and width in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
}

impl Stroke {
    pub fn new(color: Color, width: f64) -> Self {
        Self { color, width }
    }
}

/// Axis-aligned rectangle in view pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// A `width` x `height` rectangle centered on `center`.
    pub fn centered(center: ViewPoint, width: f64, height: f64) -> Self {
        Self {
            left: center.x - width / 2.0,
            top: center.y - height / 2.0,
            width,
            height,
        }
    }

    pub fn center(&self) -> ViewPoint {
        ViewPoint::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }
}

/// Measured extent of a rendered string.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TextBounds {
    pub width: f64,
    pub height: f64,
}

// ============================================================================
// CANVAS
// ============================================================================

/// Host drawing surface.
///
/// # Implementations
///
/// - **Production**: an adapter over the platform's 2D canvas
/// - **Testing / Simulation**: [`RecordingCanvas`]
pub trait Canvas {
    fn draw_line(&mut self, from: ViewPoint, to: ViewPoint, stroke: Stroke);

    /// Filled circle.
    fn draw_circle(&mut self, center: ViewPoint, radius: f64, fill: Color);

    /// Filled rectangle.
    fn draw_rect(&mut self, rect: Rect, fill: Color);

    /// Draws `text` centered on `center`.
    fn draw_text(&mut self, text: &str, center: ViewPoint, size_px: f64, color: Color);

    /// Bounds `text` would occupy at `size_px`.
    fn measure_text(&self, text: &str, size_px: f64) -> TextBounds;
}

/// One recorded canvas call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawCommand {
    Line {
        from: ViewPoint,
        to: ViewPoint,
        stroke: Stroke,
    },
    Circle {
        center: ViewPoint,
        radius: f64,
        fill: Color,
    },
    Rect {
        rect: Rect,
        fill: Color,
    },
    Text {
        text: String,
        center: ViewPoint,
        size_px: f64,
        color: Color,
    },
}

/// Canvas that records every call instead of rasterizing.
///
/// Text is measured with a fixed-advance model: each character is
/// `glyph_advance_em * size` wide and a line is `line_height_em * size` tall.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingCanvas {
    commands: Vec<DrawCommand>,

    /// Horizontal advance per character, in ems (default: 0.6)
    pub glyph_advance_em: f64,

    /// Line height, in ems (default: 1.2)
    pub line_height_em: f64,
}

impl Default for RecordingCanvas {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            glyph_advance_em: 0.6,
            line_height_em: 1.2,
        }
    }
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Returns the recorded commands and starts a fresh recording.
    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Recorded line segments drawn with `color`.
    pub fn lines_with_color(&self, color: Color) -> Vec<(ViewPoint, ViewPoint, f64)> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Line { from, to, stroke } if stroke.color == color => {
                    Some((*from, *to, stroke.width))
                }
                _ => None,
            })
            .collect()
    }

    /// Recorded filled circles.
    pub fn circles(&self) -> Vec<(ViewPoint, f64, Color)> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Circle { center, radius, fill } => Some((*center, *radius, *fill)),
                _ => None,
            })
            .collect()
    }

    /// Recorded text strings, in draw order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Canvas for RecordingCanvas {
    fn draw_line(&mut self, from: ViewPoint, to: ViewPoint, stroke: Stroke) {
        self.commands.push(DrawCommand::Line { from, to, stroke });
    }

    fn draw_circle(&mut self, center: ViewPoint, radius: f64, fill: Color) {
        self.commands.push(DrawCommand::Circle { center, radius, fill });
    }

    fn draw_rect(&mut self, rect: Rect, fill: Color) {
        self.commands.push(DrawCommand::Rect { rect, fill });
    }

    fn draw_text(&mut self, text: &str, center: ViewPoint, size_px: f64, color: Color) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            center,
            size_px,
            color,
        });
    }

    fn measure_text(&self, text: &str, size_px: f64) -> TextBounds {
        TextBounds {
            width: text.chars().count() as f64 * self.glyph_advance_em * size_px,
            height: self.line_height_em * size_px,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_recording_keeps_order() {
        let mut canvas = RecordingCanvas::new();
        canvas.draw_rect(Rect::centered(ViewPoint::new(50.0, 50.0), 10.0, 10.0), Color::BLACK);
        canvas.draw_text("hi", ViewPoint::new(50.0, 50.0), 12.0, Color::WHITE);
        canvas.draw_line(ViewPoint::origin(), ViewPoint::new(1.0, 1.0), Stroke::new(Color::YELLOW, 3.0));

        assert_eq!(canvas.len(), 3);
        assert!(matches!(canvas.commands()[0], DrawCommand::Rect { .. }));
        assert!(matches!(canvas.commands()[1], DrawCommand::Text { .. }));
        assert_eq!(canvas.lines_with_color(Color::YELLOW).len(), 1);
        assert!(canvas.lines_with_color(Color::RED).is_empty());
    }

    #[test]
    fn test_take_resets_recording() {
        let mut canvas = RecordingCanvas::new();
        canvas.draw_circle(ViewPoint::origin(), 20.0, Color::YELLOW);

        let taken = canvas.take();
        assert_eq!(taken.len(), 1);
        assert!(canvas.is_empty());
    }

    #[test]
    fn test_fixed_advance_measurement() {
        let canvas = RecordingCanvas::new();
        let bounds = canvas.measure_text("abcde", 10.0);
        assert_relative_eq!(bounds.width, 30.0);
        assert_relative_eq!(bounds.height, 12.0);
    }

    #[test]
    fn test_centered_rect() {
        let rect = Rect::centered(ViewPoint::new(100.0, 40.0), 50.0, 20.0);
        assert_relative_eq!(rect.left, 75.0);
        assert_relative_eq!(rect.top, 30.0);
        assert_relative_eq!(rect.width, 50.0);
        assert_relative_eq!(rect.height, 20.0);
        assert_eq!(rect.center(), ViewPoint::new(100.0, 40.0));
    }

    #[test]
    fn test_draw_command_json_is_tagged() {
        let cmd = DrawCommand::Circle {
            center: ViewPoint::new(1.0, 2.0),
            radius: 20.0,
            fill: Color::YELLOW,
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["kind"], "circle");
        assert_eq!(json["radius"], 20.0);
    }
}
