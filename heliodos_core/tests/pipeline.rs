//! End-to-end checks of the projection chain with sensor-layout inputs.

use approx::assert_relative_eq;
use heliodos_core::{
    drawable_segments, AttitudeMatrix, CameraIntrinsics, CameraProjectionModel, CelestialPathSampler,
    SensorOrientation, ViewportSize,
};
use heliodos_env::{CameraCharacteristics, HorizonPosition, LensFacing};

/// Phone held upright in portrait, rear camera facing due south.
///
/// Device X (right) = west, Y (up) = up, Z (towards the user) = north.
fn upright_facing_south() -> AttitudeMatrix {
    AttitudeMatrix::from_row_major([
        -1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, //
        0.0, 1.0, 0.0,
    ])
}

fn portrait_camera() -> CameraProjectionModel {
    let characteristics = CameraCharacteristics {
        id: "0".to_string(),
        lens_facing: LensFacing::Back,
        focal_lengths_mm: vec![4.0, 6.0],
        physical_size_mm: Some((4.0, 3.0)),
        pixel_array_size: Some((4000, 3000)),
        sensor_orientation_deg: Some(90),
        logical_multi_camera: false,
    };
    CameraProjectionModel::with_intrinsics(
        CameraIntrinsics::from_characteristics(&characteristics),
        ViewportSize::new(1080, 1920),
    )
}

#[test]
fn test_south_horizon_lands_in_view_center() {
    let attitude = upright_facing_south();
    let camera = portrait_camera();
    let sampler = CelestialPathSampler::new(&attitude, &camera);

    let p = sampler.project(HorizonPosition::from_degrees(180.0, 0.0)).unwrap();
    assert_relative_eq!(p.x, 540.0, epsilon = 1e-9);
    assert_relative_eq!(p.y, 960.0, epsilon = 1e-9);
}

#[test]
fn test_screen_directions_match_sky_directions() {
    let attitude = upright_facing_south();
    let camera = portrait_camera();
    let sampler = CelestialPathSampler::new(&attitude, &camera);

    // Facing south, east is on the left and higher altitude is up the screen
    let south_east = sampler.project(HorizonPosition::from_degrees(160.0, 0.0)).unwrap();
    assert!(south_east.x < 540.0);
    assert_relative_eq!(south_east.y, 960.0, epsilon = 1e-9);

    let raised = sampler.project(HorizonPosition::from_degrees(180.0, 15.0)).unwrap();
    assert!(raised.y < 960.0);
    assert_relative_eq!(raised.x, 540.0, epsilon = 1e-9);

    assert!(sampler.project(HorizonPosition::from_degrees(0.0, 10.0)).is_none());
}

#[test]
fn test_first_focal_length_is_used() {
    let camera = portrait_camera();
    let intrinsics = camera.intrinsics().unwrap();
    assert_relative_eq!(intrinsics.focal_length_mm(), 4.0);
    assert_eq!(intrinsics.orientation(), SensorOrientation::Deg90);
}

#[test]
fn test_full_sweep_breaks_behind_camera() {
    let attitude = upright_facing_south();
    let camera = portrait_camera();
    let sampler = CelestialPathSampler::new(&attitude, &camera);

    // Horizon sweep through all azimuths: only the southern half is in front
    let points: Vec<_> = (0..36)
        .map(|i| sampler.project(HorizonPosition::from_degrees(5.0 + 10.0 * i as f64, 0.0)))
        .collect();

    let visible = points.iter().filter(|p| p.is_some()).count();
    assert_eq!(visible, 18);
    assert_eq!(drawable_segments(&points).count(), 17);
}
