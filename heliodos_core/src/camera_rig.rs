//! Camera selection among the device's back-facing cameras.
//!
//! Cameras are ordered from widest to longest lens. A pinch gesture steps
//! through that order: pinching in (scale < 0.9) moves to the next wider
//! camera, spreading out (scale > 1.1) to the next longer one. Each gesture
//! switches at most once.

use crate::heliodos_camera::CameraIntrinsics;
use heliodos_env::{CameraCharacteristics, CameraSource, LensFacing};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Cumulative gesture scale below which the next wider camera is chosen.
pub const ZOOM_OUT_THRESHOLD: f64 = 0.9;

/// Cumulative gesture scale above which the next longer camera is chosen.
pub const ZOOM_IN_THRESHOLD: f64 = 1.1;

/// Result of feeding one scale step into [`CameraRig::zoom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoomOutcome {
    SwitchedWider,
    AlreadyWidest,
    SwitchedLonger,
    AlreadyLongest,

    /// Threshold not crossed yet, or this gesture already acted
    Unchanged,
}

impl ZoomOutcome {
    pub fn switched(&self) -> bool {
        matches!(self, ZoomOutcome::SwitchedWider | ZoomOutcome::SwitchedLonger)
    }
}

/// The back-facing cameras, widest first, and which one is active.
#[derive(Debug, Clone)]
pub struct CameraRig {
    cameras: Vec<CameraCharacteristics>,
    active: usize,
    cumulative_scale: f64,
    gesture_done: bool,
}

impl CameraRig {
    /// Builds the rig from every camera the device reports.
    ///
    /// Keeps back-facing cameras sorted by their first focal length (unknown
    /// last). Logical multi-cameras are dropped unless nothing else remains.
    /// The widest camera starts active.
    pub fn from_characteristics(all: Vec<CameraCharacteristics>) -> Self {
        let mut back: Vec<_> = all
            .into_iter()
            .filter(|c| c.lens_facing == LensFacing::Back)
            .collect();
        back.sort_by(|a, b| focal_key(a).total_cmp(&focal_key(b)));

        let physical: Vec<_> = back.iter().filter(|c| !c.logical_multi_camera).cloned().collect();
        let cameras = if physical.is_empty() { back } else { physical };

        debug!(
            cameras = ?cameras.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
            "Camera rig assembled"
        );

        Self {
            cameras,
            active: 0,
            cumulative_scale: 1.0,
            gesture_done: false,
        }
    }

    pub fn cameras(&self) -> &[CameraCharacteristics] {
        &self.cameras
    }

    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    pub fn active(&self) -> Option<&CameraCharacteristics> {
        self.cameras.get(self.active)
    }

    /// Intrinsics of the active camera, defaults filled in.
    pub fn active_intrinsics(&self) -> Option<CameraIntrinsics> {
        self.active().map(CameraIntrinsics::from_characteristics)
    }

    /// Activates the camera at `index`. Returns false if out of range.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.cameras.len() {
            return false;
        }
        self.active = index;
        true
    }

    /// Starts a new pinch gesture.
    pub fn begin_zoom(&mut self) {
        self.cumulative_scale = 1.0;
        self.gesture_done = false;
    }

    /// Feeds one incremental scale factor of the current gesture.
    pub fn zoom(&mut self, scale_factor: f64) -> ZoomOutcome {
        if self.gesture_done || self.cameras.is_empty() {
            return ZoomOutcome::Unchanged;
        }

        self.cumulative_scale *= scale_factor;

        let outcome = if self.cumulative_scale < ZOOM_OUT_THRESHOLD {
            if self.active > 0 {
                self.active -= 1;
                ZoomOutcome::SwitchedWider
            } else {
                ZoomOutcome::AlreadyWidest
            }
        } else if self.cumulative_scale > ZOOM_IN_THRESHOLD {
            if self.active + 1 < self.cameras.len() {
                self.active += 1;
                ZoomOutcome::SwitchedLonger
            } else {
                ZoomOutcome::AlreadyLongest
            }
        } else {
            return ZoomOutcome::Unchanged;
        };

        self.gesture_done = true;
        if outcome.switched() {
            info!(camera = ?self.active().map(|c| c.id.as_str()), ?outcome, "Camera switched");
        }
        outcome
    }
}

impl CameraSource for CameraRig {
    fn current_intrinsics(&self) -> Option<CameraCharacteristics> {
        self.active().cloned()
    }
}

fn focal_key(c: &CameraCharacteristics) -> f64 {
    c.primary_focal_length_mm().unwrap_or(f64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(id: &str, facing: LensFacing, focal: Option<f64>, logical: bool) -> CameraCharacteristics {
        CameraCharacteristics {
            id: id.to_string(),
            lens_facing: facing,
            focal_lengths_mm: focal.into_iter().collect(),
            physical_size_mm: None,
            pixel_array_size: None,
            sensor_orientation_deg: None,
            logical_multi_camera: logical,
        }
    }

    fn phone() -> CameraRig {
        CameraRig::from_characteristics(vec![
            camera("tele", LensFacing::Back, Some(9.0), false),
            camera("front", LensFacing::Front, Some(2.5), false),
            camera("mystery", LensFacing::Back, None, false),
            camera("logical", LensFacing::Back, Some(1.0), true),
            camera("main", LensFacing::Back, Some(5.4), false),
            camera("ultrawide", LensFacing::Back, Some(1.9), false),
        ])
    }

    fn ids(rig: &CameraRig) -> Vec<&str> {
        rig.cameras().iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_back_cameras_sorted_by_focal_length() {
        let rig = phone();
        assert_eq!(ids(&rig), vec!["ultrawide", "main", "tele", "mystery"]);
        assert_eq!(rig.active().unwrap().id, "ultrawide");
    }

    #[test]
    fn test_logical_camera_kept_when_alone() {
        let rig = CameraRig::from_characteristics(vec![
            camera("logical", LensFacing::Back, Some(4.2), true),
            camera("front", LensFacing::Front, Some(2.5), false),
        ]);
        assert_eq!(ids(&rig), vec!["logical"]);
    }

    #[test]
    fn test_no_back_camera() {
        let mut rig = CameraRig::from_characteristics(vec![camera("front", LensFacing::Front, None, false)]);
        assert!(rig.is_empty());
        assert!(rig.active().is_none());
        assert!(rig.current_intrinsics().is_none());
        assert_eq!(rig.zoom(2.0), ZoomOutcome::Unchanged);
    }

    #[test]
    fn test_pinch_switches_once_per_gesture() {
        let mut rig = phone();

        rig.begin_zoom();
        assert_eq!(rig.zoom(1.05), ZoomOutcome::Unchanged);
        assert_eq!(rig.zoom(1.05), ZoomOutcome::SwitchedLonger);
        assert_eq!(rig.zoom(3.0), ZoomOutcome::Unchanged);
        assert_eq!(rig.active().unwrap().id, "main");

        rig.begin_zoom();
        assert_eq!(rig.zoom(1.2), ZoomOutcome::SwitchedLonger);
        assert_eq!(rig.active().unwrap().id, "tele");
    }

    #[test]
    fn test_pinch_limits() {
        let mut rig = phone();

        rig.begin_zoom();
        assert_eq!(rig.zoom(0.5), ZoomOutcome::AlreadyWidest);

        assert!(rig.select(3));
        rig.begin_zoom();
        assert_eq!(rig.zoom(1.5), ZoomOutcome::AlreadyLongest);

        rig.begin_zoom();
        assert_eq!(rig.zoom(0.8), ZoomOutcome::SwitchedWider);
        assert_eq!(rig.active().unwrap().id, "tele");
    }

    #[test]
    fn test_active_intrinsics_use_defaults() {
        let rig = phone();
        let intr = rig.active_intrinsics().unwrap();
        assert_eq!(intr.focal_length_mm(), 1.9);
        assert_eq!(intr.sensor_size_px(), crate::heliodos_camera::DEFAULT_SENSOR_SIZE_PX);
    }
}
