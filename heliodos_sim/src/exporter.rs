//! JSON exporter for recorded overlay frames.
//!
//! Each exported frame carries the frame report and the exact draw calls, so
//! a run can be replayed in a viewer or diffed between seeds.

use crate::error::SimError;
use heliodos_core::{DrawCommand, FrameReport};
use heliodos_env::Timestamp;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// A single recorded frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimFrame {
    /// Simulation time in seconds
    pub time_sec: f64,

    /// Reference clock reading for the frame
    pub reference_time: Timestamp,

    pub report: FrameReport,

    /// Canvas calls in issue order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<DrawCommand>,

    /// Events between the previous exported frame and this one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<SimEvent>,
}

/// Simulation event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

impl SimEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: None,
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: Some("warn".to_string()),
        }
    }
}

/// Complete simulation export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Duration in seconds
    pub duration_sec: f64,

    /// Recorded frames
    pub frames: Vec<SimFrame>,

    /// Final results
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            duration_sec: 0.0,
            frames: Vec::new(),
            passed: false,
            failure_reason: None,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: SimFrame) {
        self.duration_sec = frame.time_sec;
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, failure_reason: Option<String>) {
        self.passed = passed;
        self.failure_reason = failure_reason;
    }

    /// Writes the export as pretty-printed JSON.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), SimError> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Reads an export back.
    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use heliodos_core::{Canvas, Color, OverlayState, RecordingCanvas};
    use nalgebra::Point2;

    fn frame(time_sec: f64) -> SimFrame {
        let mut canvas = RecordingCanvas::new();
        canvas.draw_circle(Point2::new(10.0, 20.0), 20.0, Color::YELLOW);
        SimFrame {
            time_sec,
            reference_time: Utc.with_ymd_and_hms(2024, 6, 21, 9, 0, 0).unwrap(),
            report: FrameReport {
                state: OverlayState::Active,
                suppressed: None,
                placeholder_drawn: false,
                paths: Vec::new(),
                sun_marker: Some(Point2::new(10.0, 20.0)),
                cardinal_markers: 0,
            },
            commands: canvas.take(),
            events: vec![SimEvent::info("fix acquired")],
        }
    }

    #[test]
    fn test_add_frame_tracks_duration() {
        let mut export = SimExport::new("northern_summer", 42);
        export.add_frame(frame(0.5));
        export.add_frame(frame(1.0));
        export.finalize(true, None);

        assert_eq!(export.frames.len(), 2);
        assert_eq!(export.duration_sec, 1.0);
        assert!(export.passed);
    }

    #[test]
    fn test_json_shape() {
        let mut export = SimExport::new("late_fix", 7);
        export.add_frame(frame(0.0));
        export.finalize(false, Some("no transition".to_string()));

        let value = serde_json::to_value(&export).unwrap();
        assert_eq!(value["scenario"], "late_fix");
        assert_eq!(value["failure_reason"], "no transition");
        assert_eq!(value["frames"][0]["commands"][0]["kind"], "circle");
        assert_eq!(value["frames"][0]["report"]["state"], "Active");
        assert!(value["frames"][0]["events"][0].get("level").is_none());
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!("heliodos_export_{}.json", std::process::id()));
        let mut export = SimExport::new("polar_night", 1);
        export.add_frame(frame(2.0));
        export.write_to_file(&path).unwrap();

        let back = SimExport::read_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(back.scenario, "polar_night");
        assert_eq!(back.frames[0].commands, export.frames[0].commands);
    }
}
