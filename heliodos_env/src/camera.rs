//! Camera boundary: raw hardware characteristics and the accessor the core polls.

use serde::{Deserialize, Serialize};

/// Which way a camera faces relative to the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LensFacing {
    Back,
    Front,
    External,
}

/// Characteristics as reported by the camera hardware.
///
/// Every optical field is optional: devices are free not to report them, and
/// the core substitutes documented defaults for whatever is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraCharacteristics {
    /// Host identifier of the camera
    pub id: String,

    pub lens_facing: LensFacing,

    /// Available focal lengths in millimeters; the first entry is used
    #[serde(default)]
    pub focal_lengths_mm: Vec<f64>,

    /// Physical sensor size in millimeters (width, height)
    #[serde(default)]
    pub physical_size_mm: Option<(f64, f64)>,

    /// Sensor pixel array size (width, height)
    #[serde(default)]
    pub pixel_array_size: Option<(u32, u32)>,

    /// Clockwise rotation of the sensor relative to the display, in degrees
    #[serde(default)]
    pub sensor_orientation_deg: Option<i32>,

    /// True for logical devices that fuse several physical cameras
    #[serde(default)]
    pub logical_multi_camera: bool,
}

impl CameraCharacteristics {
    /// A back-facing camera that reports nothing but its identifier.
    pub fn unreported(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            lens_facing: LensFacing::Back,
            focal_lengths_mm: Vec::new(),
            physical_size_mm: None,
            pixel_array_size: None,
            sensor_orientation_deg: None,
            logical_multi_camera: false,
        }
    }

    /// First reported focal length, if any.
    pub fn primary_focal_length_mm(&self) -> Option<f64> {
        self.focal_lengths_mm.first().copied()
    }
}

/// Synchronous accessor for the active camera.
///
/// Camera sessions open, fail and reconfigure asynchronously on the host; the
/// core never observes that lifecycle. It only polls this accessor, which
/// answers with whatever camera is active right now.
pub trait CameraSource {
    /// Characteristics of the active camera, or `None` when no camera is open.
    fn current_intrinsics(&self) -> Option<CameraCharacteristics>;
}

impl CameraSource for Option<CameraCharacteristics> {
    fn current_intrinsics(&self) -> Option<CameraCharacteristics> {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_focal_length_is_first_entry() {
        let mut c = CameraCharacteristics::unreported("0");
        assert_eq!(c.primary_focal_length_mm(), None);

        c.focal_lengths_mm = vec![4.2, 6.0];
        assert_eq!(c.primary_focal_length_mm(), Some(4.2));
    }

    #[test]
    fn test_option_is_a_camera_source() {
        let none: Option<CameraCharacteristics> = None;
        assert!(none.current_intrinsics().is_none());

        let some = Some(CameraCharacteristics::unreported("main"));
        assert_eq!(some.current_intrinsics().unwrap().id, "main");
    }

    #[test]
    fn test_missing_fields_deserialize_as_unreported() {
        let c: CameraCharacteristics =
            serde_json::from_str(r#"{"id": "2", "lens_facing": "Back"}"#).unwrap();
        assert!(c.focal_lengths_mm.is_empty());
        assert!(c.physical_size_mm.is_none());
        assert!(!c.logical_multi_camera);
    }
}
