//! The "LENS" Engine - Camera Projection Model
//!
//! Maps a direction in camera space onto a pixel of the viewfinder. The
//! preview stream is scaled to fill the view with a centered crop, so an
//! overlay marker only lines up with what the camera shows if the projection
//! reproduces that exact crop.
//!
//! # Pipeline
//!
//! ```text
//! camera dir (x, y, z) → pinhole onto sensor pixels → center-crop-to-fill → view pixel
//! ```
//!
//! Camera space: X = right, Y = down, Z = forward (into the scene).

use crate::error::{CoreError, Result};
use heliodos_env::CameraCharacteristics;
use nalgebra::{Point2, Vector3};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A pixel position in view space (origin top-left, Y down).
pub type ViewPoint = Point2<f64>;

/// `None` encodes "not representable" (behind the camera, or no projection possible).
pub type ProjectedPoint = Option<ViewPoint>;

/// Focal length used when the hardware reports none.
pub const DEFAULT_FOCAL_LENGTH_MM: f64 = 4.0;

/// Physical sensor size used when the hardware reports none.
pub const DEFAULT_SENSOR_SIZE_MM: (f64, f64) = (4.0, 3.0);

/// Pixel array size used when the hardware reports none.
pub const DEFAULT_SENSOR_SIZE_PX: (u32, u32) = (4000, 3000);

/// Mounting orientation used when the hardware reports none.
pub const DEFAULT_SENSOR_ORIENTATION: SensorOrientation = SensorOrientation::Deg90;

/// Rotation between the sensor's native pixel axes and the display axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorOrientation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl SensorOrientation {
    /// Parses a reported rotation; anything but a multiple of 90 is rejected.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Self::Deg0),
            90 => Some(Self::Deg90),
            180 => Some(Self::Deg180),
            270 => Some(Self::Deg270),
            _ => None,
        }
    }

    pub fn degrees(self) -> i32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// True when the sensor's width runs along the display's height.
    pub fn swaps_axes(self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }
}

/// Lens and sensor parameters of the active camera.
///
/// Immutable once constructed. Build from hardware characteristics with
/// [`CameraIntrinsics::from_characteristics`], which never fails.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    focal_length_mm: f64,
    sensor_size_mm: (f64, f64),
    sensor_size_px: (u32, u32),
    orientation: SensorOrientation,
}

impl CameraIntrinsics {
    /// Creates intrinsics from explicit values, rejecting non-positive or
    /// non-finite dimensions.
    pub fn new(
        focal_length_mm: f64,
        sensor_size_mm: (f64, f64),
        sensor_size_px: (u32, u32),
        orientation: SensorOrientation,
    ) -> Result<Self> {
        if !is_positive(focal_length_mm) {
            return Err(CoreError::config(format!("focal length {} mm", focal_length_mm)));
        }
        if !is_positive(sensor_size_mm.0) || !is_positive(sensor_size_mm.1) {
            return Err(CoreError::config(format!(
                "sensor size {}x{} mm",
                sensor_size_mm.0, sensor_size_mm.1
            )));
        }
        if sensor_size_px.0 == 0 || sensor_size_px.1 == 0 {
            return Err(CoreError::config(format!(
                "sensor size {}x{} px",
                sensor_size_px.0, sensor_size_px.1
            )));
        }

        Ok(Self {
            focal_length_mm,
            sensor_size_mm,
            sensor_size_px,
            orientation,
        })
    }

    /// Resolves reported characteristics, substituting the documented default
    /// for every value that is missing or unusable.
    pub fn from_characteristics(characteristics: &CameraCharacteristics) -> Self {
        let focal_length_mm = match characteristics.primary_focal_length_mm() {
            Some(f) if is_positive(f) => f,
            reported => {
                if reported.is_some() {
                    warn!(camera = %characteristics.id, ?reported, "Unusable focal length, using default");
                }
                DEFAULT_FOCAL_LENGTH_MM
            }
        };

        let sensor_size_mm = match characteristics.physical_size_mm {
            Some((w, h)) if is_positive(w) && is_positive(h) => (w, h),
            reported => {
                if reported.is_some() {
                    warn!(camera = %characteristics.id, ?reported, "Unusable sensor size, using default");
                }
                DEFAULT_SENSOR_SIZE_MM
            }
        };

        let sensor_size_px = match characteristics.pixel_array_size {
            Some((w, h)) if w > 0 && h > 0 => (w, h),
            reported => {
                if reported.is_some() {
                    warn!(camera = %characteristics.id, ?reported, "Unusable pixel array, using default");
                }
                DEFAULT_SENSOR_SIZE_PX
            }
        };

        let orientation = match characteristics.sensor_orientation_deg {
            Some(deg) => SensorOrientation::from_degrees(deg).unwrap_or_else(|| {
                warn!(camera = %characteristics.id, deg, "Sensor orientation not a multiple of 90, using default");
                DEFAULT_SENSOR_ORIENTATION
            }),
            None => DEFAULT_SENSOR_ORIENTATION,
        };

        Self {
            focal_length_mm,
            sensor_size_mm,
            sensor_size_px,
            orientation,
        }
    }

    pub fn focal_length_mm(&self) -> f64 {
        self.focal_length_mm
    }

    pub fn sensor_size_mm(&self) -> (f64, f64) {
        self.sensor_size_mm
    }

    pub fn sensor_size_px(&self) -> (u32, u32) {
        self.sensor_size_px
    }

    pub fn orientation(&self) -> SensorOrientation {
        self.orientation
    }

    /// Pixel dimensions as the displayed image sees them.
    pub fn effective_pixel_size(&self) -> (f64, f64) {
        let (w, h) = (self.sensor_size_px.0 as f64, self.sensor_size_px.1 as f64);
        if self.orientation.swaps_axes() {
            (h, w)
        } else {
            (w, h)
        }
    }

    /// Physical dimensions as the displayed image sees them.
    pub fn effective_physical_size(&self) -> (f64, f64) {
        let (w, h) = self.sensor_size_mm;
        if self.orientation.swaps_axes() {
            (h, w)
        } else {
            (w, h)
        }
    }

    /// Focal lengths in sensor pixels, horizontal and vertical.
    ///
    /// Kept separate so non-square pixels project correctly.
    pub fn focal_length_px(&self) -> (f64, f64) {
        let (px_w, px_h) = self.effective_pixel_size();
        let (mm_w, mm_h) = self.effective_physical_size();
        (
            self.focal_length_mm / mm_w * px_w,
            self.focal_length_mm / mm_h * px_h,
        )
    }

    /// Full horizontal field of view of the sensor, in radians.
    pub fn horizontal_fov(&self) -> f64 {
        let (px_w, _) = self.effective_pixel_size();
        let (fx, _) = self.focal_length_px();
        2.0 * (px_w / 2.0 / fx).atan()
    }

    /// Full vertical field of view of the sensor, in radians.
    pub fn vertical_fov(&self) -> f64 {
        let (_, px_h) = self.effective_pixel_size();
        let (_, fy) = self.focal_length_px();
        2.0 * (px_h / 2.0 / fy).atan()
    }
}

impl Default for CameraIntrinsics {
    fn default() -> Self {
        Self {
            focal_length_mm: DEFAULT_FOCAL_LENGTH_MM,
            sensor_size_mm: DEFAULT_SENSOR_SIZE_MM,
            sensor_size_px: DEFAULT_SENSOR_SIZE_PX,
            orientation: DEFAULT_SENSOR_ORIENTATION,
        }
    }
}

fn is_positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

/// Pixel size of the rendering surface.
///
/// Signed so that hosts can pass whatever their layout reports; a surface
/// with a non-positive dimension simply cannot be projected onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: i32,
    pub height: i32,
}

impl ViewportSize {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// True when both dimensions are positive.
    pub fn is_drawable(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn center(&self) -> ViewPoint {
        Point2::new(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }
}

/// Everything `project` needs, derived from one intrinsics/viewport pair.
///
/// Re-derived whenever either input changes, so the two can never be mixed
/// across updates.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CropTransform {
    fx: f64,
    fy: f64,
    sensor_w: f64,
    sensor_h: f64,
    scale: f64,
    crop_x: f64,
    crop_y: f64,
}

impl CropTransform {
    fn derive(intrinsics: &CameraIntrinsics, viewport: ViewportSize) -> Option<Self> {
        if !viewport.is_drawable() {
            return None;
        }

        let (sensor_w, sensor_h) = intrinsics.effective_pixel_size();
        let (fx, fy) = intrinsics.focal_length_px();
        let (view_w, view_h) = (viewport.width as f64, viewport.height as f64);

        let sensor_aspect = sensor_w / sensor_h;
        let view_aspect = view_w / view_h;

        let (scale, crop_x, crop_y) = if view_aspect > sensor_aspect {
            // View is wider than the sensor: sensor height is cropped
            let scale = view_w / sensor_w;
            let visible_h = view_h / scale;
            (scale, 0.0, (sensor_h - visible_h) / 2.0)
        } else {
            // View is taller (or equal): sensor width is cropped
            let scale = view_h / sensor_h;
            let visible_w = view_w / scale;
            (scale, (sensor_w - visible_w) / 2.0, 0.0)
        };

        Some(Self {
            fx,
            fy,
            sensor_w,
            sensor_h,
            scale,
            crop_x,
            crop_y,
        })
    }

    fn apply(&self, x: f64, y: f64, z: f64) -> ViewPoint {
        let x_sensor = self.fx * (x / z) + self.sensor_w / 2.0;
        let y_sensor = self.fy * (y / z) + self.sensor_h / 2.0;

        Point2::new(
            (x_sensor - self.crop_x) * self.scale,
            (y_sensor - self.crop_y) * self.scale,
        )
    }
}

/// Pinhole projection from camera space to view pixels.
///
/// Unconfigured until [`configure`](Self::configure) is called; an
/// unconfigured or zero-sized model projects everything to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraProjectionModel {
    intrinsics: Option<CameraIntrinsics>,
    viewport: ViewportSize,
    crop: Option<CropTransform>,
}

impl CameraProjectionModel {
    /// Creates an unconfigured model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a model for the given camera and viewport.
    pub fn with_intrinsics(intrinsics: CameraIntrinsics, viewport: ViewportSize) -> Self {
        let mut model = Self::new();
        model.viewport = viewport;
        model.configure(intrinsics);
        model
    }

    /// Replaces lens/sensor parameters (the active camera changed).
    pub fn configure(&mut self, intrinsics: CameraIntrinsics) {
        debug!(
            focal_mm = intrinsics.focal_length_mm(),
            orientation = intrinsics.orientation().degrees(),
            "Camera projection configured"
        );
        self.intrinsics = Some(intrinsics);
        self.rederive();
    }

    /// Drops the active camera; every projection returns `None` afterwards.
    pub fn deconfigure(&mut self) {
        self.intrinsics = None;
        self.crop = None;
    }

    /// Records the render-surface size.
    pub fn set_viewport_size(&mut self, width: i32, height: i32) {
        self.viewport = ViewportSize::new(width, height);
        self.rederive();
    }

    pub fn is_configured(&self) -> bool {
        self.intrinsics.is_some()
    }

    pub fn intrinsics(&self) -> Option<&CameraIntrinsics> {
        self.intrinsics.as_ref()
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    /// Maps a camera-space direction to a view-space pixel.
    ///
    /// Returns `None` for directions at or behind the camera plane (`z <= 0`)
    /// and whenever no projection is possible (no camera, empty viewport).
    pub fn project(&self, x: f64, y: f64, z: f64) -> ProjectedPoint {
        // Also rejects NaN
        if !(z > 0.0) {
            return None;
        }
        self.crop.map(|crop| crop.apply(x, y, z))
    }

    /// [`project`](Self::project) for a vector.
    pub fn project_direction(&self, direction: &Vector3<f64>) -> ProjectedPoint {
        self.project(direction.x, direction.y, direction.z)
    }

    fn rederive(&mut self) {
        self.crop = self
            .intrinsics
            .as_ref()
            .and_then(|intrinsics| CropTransform::derive(intrinsics, self.viewport));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use heliodos_env::LensFacing;
    use proptest::prelude::*;

    fn reference_intrinsics(orientation: SensorOrientation) -> CameraIntrinsics {
        CameraIntrinsics::new(4.0, (4.0, 3.0), (4000, 3000), orientation).unwrap()
    }

    #[test]
    fn test_optical_axis_maps_to_view_center() {
        let model = CameraProjectionModel::with_intrinsics(
            reference_intrinsics(SensorOrientation::Deg0),
            ViewportSize::new(1000, 1000),
        );

        let p = model.project(0.0, 0.0, 1.0).unwrap();
        assert_relative_eq!(p.x, 500.0, epsilon = 1e-9);
        assert_relative_eq!(p.y, 500.0, epsilon = 1e-9);
    }

    #[test]
    fn test_optical_axis_center_for_wide_and_tall_viewports() {
        for (w, h) in [(1920, 1080), (1080, 1920), (800, 600), (333, 777)] {
            let model = CameraProjectionModel::with_intrinsics(
                reference_intrinsics(SensorOrientation::Deg90),
                ViewportSize::new(w, h),
            );
            let p = model.project(0.0, 0.0, 2.5).unwrap();
            assert_relative_eq!(p.x, w as f64 / 2.0, epsilon = 1e-9);
            assert_relative_eq!(p.y, h as f64 / 2.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_height_cropped_branch() {
        // 1600x900 is wider than 4:3, so the sensor height is cropped
        let model = CameraProjectionModel::with_intrinsics(
            reference_intrinsics(SensorOrientation::Deg0),
            ViewportSize::new(1600, 900),
        );

        // fx = fy = 4000 px; x_sensor = 2400, y_sensor = 1700
        // scale = 0.4, visible height = 2250, crop_y = 375
        let p = model.project(0.1, 0.05, 1.0).unwrap();
        assert_relative_eq!(p.x, 960.0, epsilon = 1e-9);
        assert_relative_eq!(p.y, 530.0, epsilon = 1e-9);
    }

    #[test]
    fn test_orientation_swap_matches_unrotated_case() {
        let unrotated = CameraProjectionModel::with_intrinsics(
            reference_intrinsics(SensorOrientation::Deg0),
            ViewportSize::new(1600, 900),
        );
        let rotated = CameraProjectionModel::with_intrinsics(
            reference_intrinsics(SensorOrientation::Deg90),
            ViewportSize::new(900, 1600),
        );

        let a = unrotated.project(0.1, 0.05, 1.0).unwrap();
        let b = rotated.project(0.05, 0.1, 1.0).unwrap();
        assert_relative_eq!(a.x, b.y, epsilon = 1e-9);
        assert_relative_eq!(a.y, b.x, epsilon = 1e-9);

        // Square viewport: both orientations put the axis at the same pixel
        let square_a = CameraProjectionModel::with_intrinsics(
            reference_intrinsics(SensorOrientation::Deg0),
            ViewportSize::new(1000, 1000),
        );
        let square_b = CameraProjectionModel::with_intrinsics(
            reference_intrinsics(SensorOrientation::Deg270),
            ViewportSize::new(1000, 1000),
        );
        assert_eq!(square_a.project(0.0, 0.0, 1.0), square_b.project(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_swap_applies_to_physical_size_too() {
        // Non-square pixels: 4000x3000 px on a 4x4 mm sensor
        let intr = CameraIntrinsics::new(4.0, (4.0, 4.0), (4000, 3000), SensorOrientation::Deg90).unwrap();
        let (fx, fy) = intr.focal_length_px();
        assert_relative_eq!(fx, 3000.0);
        assert_relative_eq!(fy, 4000.0);
    }

    #[test]
    fn test_unconfigured_model_projects_nothing() {
        let mut model = CameraProjectionModel::new();
        model.set_viewport_size(1000, 1000);
        assert!(model.project(0.0, 0.0, 1.0).is_none());
        assert!(!model.is_configured());
    }

    #[test]
    fn test_empty_viewport_projects_nothing() {
        let mut model = CameraProjectionModel::with_intrinsics(
            CameraIntrinsics::default(),
            ViewportSize::new(1000, 1000),
        );
        assert!(model.project(0.0, 0.0, 1.0).is_some());

        model.set_viewport_size(0, 1000);
        assert!(model.project(0.0, 0.0, 1.0).is_none());

        model.set_viewport_size(1000, -1);
        assert!(model.project(0.0, 0.0, 1.0).is_none());
    }

    #[test]
    fn test_reconfigure_rederives_crop() {
        let mut model = CameraProjectionModel::with_intrinsics(
            reference_intrinsics(SensorOrientation::Deg0),
            ViewportSize::new(1600, 900),
        );
        let before = model.project(0.1, 0.0, 1.0).unwrap();

        let tele = CameraIntrinsics::new(12.0, (4.0, 3.0), (4000, 3000), SensorOrientation::Deg0).unwrap();
        model.configure(tele);
        let after = model.project(0.1, 0.0, 1.0).unwrap();

        assert!(after.x > before.x, "Longer lens should push off-axis points outward");
    }

    #[test]
    fn test_unreported_characteristics_fall_back_to_defaults() {
        let intr = CameraIntrinsics::from_characteristics(&CameraCharacteristics::unreported("0"));
        assert_eq!(intr, CameraIntrinsics::default());
        assert_eq!(intr.orientation(), SensorOrientation::Deg90);
        assert_relative_eq!(intr.focal_length_mm(), 4.0);
    }

    #[test]
    fn test_unusable_characteristics_fall_back_per_field() {
        let characteristics = CameraCharacteristics {
            id: "1".to_string(),
            lens_facing: LensFacing::Back,
            focal_lengths_mm: vec![-1.0],
            physical_size_mm: Some((5.6, 4.2)),
            pixel_array_size: Some((0, 3000)),
            sensor_orientation_deg: Some(45),
            logical_multi_camera: false,
        };

        let intr = CameraIntrinsics::from_characteristics(&characteristics);
        assert_relative_eq!(intr.focal_length_mm(), DEFAULT_FOCAL_LENGTH_MM);
        assert_eq!(intr.sensor_size_mm(), (5.6, 4.2));
        assert_eq!(intr.sensor_size_px(), DEFAULT_SENSOR_SIZE_PX);
        assert_eq!(intr.orientation(), DEFAULT_SENSOR_ORIENTATION);
    }

    #[test]
    fn test_orientation_parsing() {
        assert_eq!(SensorOrientation::from_degrees(270), Some(SensorOrientation::Deg270));
        assert_eq!(SensorOrientation::from_degrees(-90), Some(SensorOrientation::Deg270));
        assert_eq!(SensorOrientation::from_degrees(360), Some(SensorOrientation::Deg0));
        assert_eq!(SensorOrientation::from_degrees(30), None);
    }

    #[test]
    fn test_field_of_view() {
        // 4 mm lens on a 4 mm wide sensor: tan(half fov) = 0.5
        let intr = reference_intrinsics(SensorOrientation::Deg0);
        assert_relative_eq!(intr.horizontal_fov(), 2.0 * 0.5f64.atan(), epsilon = 1e-12);
        assert_relative_eq!(intr.vertical_fov(), 2.0 * 0.375f64.atan(), epsilon = 1e-12);
    }

    #[test]
    fn test_explicit_intrinsics_validation() {
        assert!(CameraIntrinsics::new(0.0, (4.0, 3.0), (4000, 3000), SensorOrientation::Deg0).is_err());
        assert!(CameraIntrinsics::new(4.0, (4.0, f64::NAN), (4000, 3000), SensorOrientation::Deg0).is_err());
        assert!(CameraIntrinsics::new(4.0, (4.0, 3.0), (4000, 0), SensorOrientation::Deg0).is_err());
    }

    fn any_orientation() -> impl Strategy<Value = SensorOrientation> {
        prop_oneof![
            Just(SensorOrientation::Deg0),
            Just(SensorOrientation::Deg90),
            Just(SensorOrientation::Deg180),
            Just(SensorOrientation::Deg270),
        ]
    }

    proptest! {
        #[test]
        fn prop_behind_camera_never_projects(
            x in -1e6f64..1e6,
            y in -1e6f64..1e6,
            z in -1e6f64..=0.0,
            focal in 0.5f64..50.0,
            mm_w in 1.0f64..40.0,
            mm_h in 1.0f64..40.0,
            px_w in 1u32..10_000,
            px_h in 1u32..10_000,
            orientation in any_orientation(),
            view_w in -10i32..5000,
            view_h in -10i32..5000,
        ) {
            let intr = CameraIntrinsics::new(focal, (mm_w, mm_h), (px_w, px_h), orientation).unwrap();
            let model = CameraProjectionModel::with_intrinsics(intr, ViewportSize::new(view_w, view_h));
            prop_assert!(model.project(x, y, z).is_none());
        }
    }
}
