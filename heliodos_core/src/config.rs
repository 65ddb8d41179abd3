//! Overlay appearance and policy configuration.

use crate::canvas::{Color, Stroke};
use crate::error::{CoreError, Result};
use crate::heliodos_path::{DEFAULT_SAMPLE_COUNT, MAX_SAMPLE_COUNT};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What to draw while the attitude or the camera is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressedPolicy {
    /// Draw nothing at all
    #[default]
    Blank,

    /// Draw a neutral placeholder message
    Placeholder,
}

/// Configuration for the OverlayCompositor
///
/// Every field has a default, so a JSON document only needs the fields it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Samples per path (default: 20)
    pub sample_count: usize,

    /// Stroke of the current day's path (default: yellow, 3 px)
    pub current_day_stroke: Stroke,

    /// Stroke width of the solstice and equinox paths (default: 10 px)
    pub reference_stroke_width: f64,

    /// June path color in the northern hemisphere, December path color in
    /// the southern one (default: red)
    pub summer_color: Color,

    /// December path color in the northern hemisphere, June path color in
    /// the southern one (default: blue)
    pub winter_color: Color,

    /// Equinox path color, both hemispheres (default: green)
    pub equinox_color: Color,

    /// Fill of the current sun marker (default: yellow)
    pub marker_color: Color,

    /// Radius of the current sun marker (default: 20 px)
    pub marker_radius: f64,

    /// Subtract magnetic declination from path samples as well as from the
    /// marker (default: true)
    pub declination_on_paths: bool,

    /// Draw N/E/S/W/zenith/nadir reference markers (default: false)
    pub show_cardinal_markers: bool,

    /// Radius of the cardinal markers (default: 20 px)
    pub cardinal_marker_radius: f64,

    /// Message shown while no location is known
    pub placeholder_text: String,

    /// Message shown while attitude or camera is missing, under
    /// [`SuppressedPolicy::Placeholder`]
    pub suppressed_text: String,

    /// What to draw while attitude or camera is missing (default: blank)
    pub suppressed_policy: SuppressedPolicy,

    /// Placeholder font size (default: 48 px)
    pub placeholder_text_size: f64,

    /// Padding between placeholder text and its background box (default: 24 px)
    pub placeholder_padding: f64,

    /// Placeholder text color (default: white)
    pub placeholder_text_color: Color,

    /// Placeholder background box (default: black at 50% alpha)
    pub placeholder_background: Color,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            sample_count: DEFAULT_SAMPLE_COUNT,
            current_day_stroke: Stroke::new(Color::YELLOW, 3.0),
            reference_stroke_width: 10.0,
            summer_color: Color::RED,
            winter_color: Color::BLUE,
            equinox_color: Color::GREEN,
            marker_color: Color::YELLOW,
            marker_radius: 20.0,
            declination_on_paths: true,
            show_cardinal_markers: false,
            cardinal_marker_radius: 20.0,
            placeholder_text: "Waiting for location...".to_string(),
            suppressed_text: "Waiting for orientation...".to_string(),
            suppressed_policy: SuppressedPolicy::Blank,
            placeholder_text_size: 48.0,
            placeholder_padding: 24.0,
            placeholder_text_color: Color::WHITE,
            placeholder_background: Color::BLACK.with_alpha(128),
        }
    }
}

impl OverlayConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Rejects values the compositor cannot render with.
    pub fn validate(&self) -> Result<()> {
        if !(2..=MAX_SAMPLE_COUNT).contains(&self.sample_count) {
            return Err(CoreError::InvalidSampleCount(self.sample_count));
        }

        let positive = [
            ("current_day_stroke.width", self.current_day_stroke.width),
            ("reference_stroke_width", self.reference_stroke_width),
            ("marker_radius", self.marker_radius),
            ("cardinal_marker_radius", self.cardinal_marker_radius),
            ("placeholder_text_size", self.placeholder_text_size),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(CoreError::config(format!("{} must be positive, got {}", name, value)));
            }
        }

        if !(self.placeholder_padding.is_finite() && self.placeholder_padding >= 0.0) {
            return Err(CoreError::config(format!(
                "placeholder_padding must be non-negative, got {}",
                self.placeholder_padding
            )));
        }

        Ok(())
    }

    pub fn with_suppressed_policy(mut self, policy: SuppressedPolicy) -> Self {
        self.suppressed_policy = policy;
        self
    }

    pub fn with_cardinal_markers(mut self, show: bool) -> Self {
        self.show_cardinal_markers = show;
        self
    }

    pub fn with_declination_on_paths(mut self, enabled: bool) -> Self {
        self.declination_on_paths = enabled;
        self
    }

    /// Colors of the June and December paths for an observer's hemisphere.
    ///
    /// Returns `(june, december)`.
    pub fn solstice_colors(&self, northern: bool) -> (Color, Color) {
        if northern {
            (self.summer_color, self.winter_color)
        } else {
            (self.winter_color, self.summer_color)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = OverlayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sample_count, 20);
        assert_eq!(config.current_day_stroke, Stroke::new(Color::YELLOW, 3.0));
        assert_eq!(config.suppressed_policy, SuppressedPolicy::Blank);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = OverlayConfig::from_json_str(
            r#"{"sample_count": 48, "suppressed_policy": "placeholder"}"#,
        )
        .unwrap();

        assert_eq!(config.sample_count, 48);
        assert_eq!(config.suppressed_policy, SuppressedPolicy::Placeholder);
        assert_eq!(config.marker_radius, 20.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            OverlayConfig::from_json_str(r#"{"sample_count": 1}"#),
            Err(CoreError::InvalidSampleCount(1))
        ));
        assert!(matches!(
            OverlayConfig::from_json_str(r#"{"marker_radius": -3.0}"#),
            Err(CoreError::InvalidConfig(_))
        ));
        assert!(matches!(
            OverlayConfig::from_json_str("{not json"),
            Err(CoreError::Json(_))
        ));
    }

    #[test]
    fn test_huge_sample_count_rejected() {
        let json = format!(r#"{{"sample_count": {}}}"#, usize::MAX);
        assert!(matches!(
            OverlayConfig::from_json_str(&json),
            Err(CoreError::InvalidSampleCount(usize::MAX))
        ));

        let json = format!(r#"{{"sample_count": {}}}"#, MAX_SAMPLE_COUNT);
        assert_eq!(OverlayConfig::from_json_str(&json).unwrap().sample_count, MAX_SAMPLE_COUNT);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            OverlayConfig::from_json_file("/nonexistent/heliodos/overlay.json"),
            Err(CoreError::Io(_))
        ));
    }

    #[test]
    fn test_hemisphere_colors_swap() {
        let config = OverlayConfig::default();
        assert_eq!(config.solstice_colors(true), (Color::RED, Color::BLUE));
        assert_eq!(config.solstice_colors(false), (Color::BLUE, Color::RED));
    }
}
