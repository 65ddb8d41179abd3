//! Heliodos Core - AR Sun Overlay Projection Pipeline
//!
//! Turns celestial directions into viewfinder pixels and draws the sun's
//! position and daily paths on top of a live camera preview:
//! 1. **Lens**: pinhole projection with the preview's center-crop-to-fill
//! 2. **Attitude**: world (east/north/up) directions into camera space
//! 3. **Path**: sunrise-to-sunset sampling into broken-at-gaps polylines
//! 4. **Overlay**: per-frame composition from an atomically swapped snapshot

pub mod camera_rig;
pub mod canvas;
pub mod compositor;
pub mod config;
pub mod error;
pub mod heliodos_attitude;
pub mod heliodos_camera;
pub mod heliodos_path;
pub mod settings;

// Re-export key types for convenience
pub use camera_rig::{CameraRig, ZoomOutcome};
pub use canvas::{Canvas, Color, DrawCommand, Rect, RecordingCanvas, Stroke, TextBounds};
pub use compositor::{
    FrameReport, FrameSnapshot, OverlayCompositor, OverlayState, PathKind, PathOutcome, PathReport,
    SuppressReason,
};
pub use config::{OverlayConfig, SuppressedPolicy};
pub use error::{CoreError, Result};
pub use heliodos_attitude::{to_camera_direction, world_direction, AttitudeMatrix, CameraDirection, WorldDirection};
pub use heliodos_camera::{
    CameraIntrinsics, CameraProjectionModel, ProjectedPoint, SensorOrientation, ViewPoint, ViewportSize,
};
pub use heliodos_path::{
    drawable_segments, sample_positions, sample_times, CelestialPathSampler, PathSample, MAX_SAMPLE_COUNT,
};
pub use settings::ObserverSettings;
