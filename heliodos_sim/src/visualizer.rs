//! Rerun visualization of recorded overlay frames.
//!
//! Only available with the `visualization` feature; otherwise every method is
//! a no-op.
//!
//! # What Gets Logged
//!
//! - Path segments as 2D line strips, colored and sized like the strokes
//! - The sun marker and cardinal markers as 2D points
//! - Placeholder text and simulation events as text logs

use crate::exporter::SimExport;
#[cfg(feature = "visualization")]
use heliodos_core::Color;
use heliodos_core::DrawCommand;
#[cfg(feature = "visualization")]
use rerun::{LineStrips2D, Points2D, Radius, RecordingStream};

/// Rerun logger for overlay frames.
pub struct RerunLogger {
    #[cfg(feature = "visualization")]
    rec: Option<RecordingStream>,

    /// Whether visualization is enabled
    enabled: bool,
}

#[cfg(feature = "visualization")]
fn to_rerun(color: Color) -> rerun::Color {
    rerun::Color::from_unmultiplied_rgba(color.r, color.g, color.b, color.a)
}

impl RerunLogger {
    /// Creates a new logger with visualization disabled.
    pub fn disabled() -> Self {
        Self {
            #[cfg(feature = "visualization")]
            rec: None,
            enabled: false,
        }
    }

    /// Creates a new logger with visualization enabled.
    #[cfg(feature = "visualization")]
    pub fn new(name: &str) -> Self {
        match rerun::RecordingStreamBuilder::new(name).spawn() {
            Ok(rec) => {
                tracing::info!("Rerun visualization enabled - open Rerun Viewer to see the overlay");
                Self {
                    rec: Some(rec),
                    enabled: true,
                }
            }
            Err(e) => {
                tracing::warn!("Failed to initialize Rerun: {:?}", e);
                Self::disabled()
            }
        }
    }

    /// Creates a logger - returns disabled if visualization feature not enabled.
    #[cfg(not(feature = "visualization"))]
    pub fn new(_name: &str) -> Self {
        tracing::info!("Rerun visualization not available (compile with --features visualization)");
        Self::disabled()
    }

    /// Returns whether visualization is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Sets the simulation time for subsequent logs.
    #[cfg(feature = "visualization")]
    pub fn set_time(&self, seconds: f64) {
        if let Some(ref rec) = self.rec {
            rec.set_time_seconds("sim_time", seconds);
        }
    }

    #[cfg(not(feature = "visualization"))]
    pub fn set_time(&self, _seconds: f64) {}

    /// Logs one frame's draw calls in view coordinates.
    #[cfg(feature = "visualization")]
    pub fn log_commands(&self, commands: &[DrawCommand]) {
        let Some(ref rec) = self.rec else {
            return;
        };

        let mut strips = Vec::new();
        let mut strip_colors = Vec::new();
        let mut strip_radii = Vec::new();
        let mut points = Vec::new();
        let mut point_colors = Vec::new();
        let mut point_radii = Vec::new();

        for cmd in commands {
            match cmd {
                DrawCommand::Line { from, to, stroke } => {
                    strips.push(vec![[from.x as f32, from.y as f32], [to.x as f32, to.y as f32]]);
                    strip_colors.push(to_rerun(stroke.color));
                    strip_radii.push(Radius::new_ui_points(stroke.width as f32 / 2.0));
                }
                DrawCommand::Circle { center, radius, fill } => {
                    points.push([center.x as f32, center.y as f32]);
                    point_colors.push(to_rerun(*fill));
                    point_radii.push(Radius::new_ui_points(*radius as f32));
                }
                DrawCommand::Text { text, .. } => {
                    let _ = rec.log("overlay/text", &rerun::TextLog::new(text.as_str()));
                }
                DrawCommand::Rect { .. } => {}
            }
        }

        let _ = rec.log(
            "overlay/paths",
            &LineStrips2D::new(strips).with_colors(strip_colors).with_radii(strip_radii),
        );
        let _ = rec.log(
            "overlay/markers",
            &Points2D::new(points).with_colors(point_colors).with_radii(point_radii),
        );
    }

    #[cfg(not(feature = "visualization"))]
    pub fn log_commands(&self, _commands: &[DrawCommand]) {}

    /// Logs a text annotation (e.g., a state transition).
    #[cfg(feature = "visualization")]
    pub fn log_event(&self, path: &str, message: &str) {
        if let Some(ref rec) = self.rec {
            let _ = rec.log(path, &rerun::TextLog::new(message));
        }
    }

    #[cfg(not(feature = "visualization"))]
    pub fn log_event(&self, _path: &str, _message: &str) {}

    /// Replays every frame of an export on the `sim_time` timeline.
    pub fn log_export(&self, export: &SimExport) {
        if !self.enabled {
            return;
        }
        for frame in &export.frames {
            self.set_time(frame.time_sec);
            self.log_commands(&frame.commands);
            for event in &frame.events {
                self.log_event(&format!("events/{}", export.scenario), &event.message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heliodos_core::{Color, Stroke};
    use nalgebra::Point2;

    #[test]
    fn test_disabled_logger() {
        let logger = RerunLogger::disabled();
        assert!(!logger.is_enabled());

        // These should be no-ops
        logger.set_time(1.0);
        logger.log_commands(&[DrawCommand::Line {
            from: Point2::new(0.0, 0.0),
            to: Point2::new(10.0, 10.0),
            stroke: Stroke::new(Color::YELLOW, 3.0),
        }]);
        logger.log_export(&SimExport::new("northern_summer", 42));
    }
}
