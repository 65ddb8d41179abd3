//! The "ATTITUDE" Engine - World to Camera Transform
//!
//! The attitude sensor reports a rotation that takes device-frame vectors to
//! world-frame vectors. The overlay needs the opposite direction: a sun
//! direction in the world, expressed relative to the camera.
//!
//! # Frames
//!
//! ```text
//! world:  X = magnetic east, Y = magnetic north, Z = up
//! device: X = right,         Y = up (screen),    Z = out of the screen
//! camera: X = right,         Y = down,           Z = forward (into the scene)
//! ```
//!
//! The rear camera looks along device -Z, so camera = (dx, -dy, -dz).

use heliodos_env::HorizonPosition;
use nalgebra::{Matrix3, Rotation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Direction in world space. Not necessarily unit length.
pub type WorldDirection = Vector3<f64>;

/// Direction in camera space (X right, Y down, Z forward).
pub type CameraDirection = Vector3<f64>;

/// Device-to-world rotation, replaced wholesale on every attitude update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttitudeMatrix(Matrix3<f64>);

impl AttitudeMatrix {
    /// Wraps a device-to-world rotation matrix.
    pub fn new(matrix: Matrix3<f64>) -> Self {
        Self(matrix)
    }

    /// Builds from the sensor's row-major layout: row `r`, column `c` is `m[3r + c]`.
    pub fn from_row_major(m: [f64; 9]) -> Self {
        Self(Matrix3::from_row_slice(&m))
    }

    /// Builds from a rotation-vector sensor reading.
    pub fn from_quaternion(q: UnitQuaternion<f64>) -> Self {
        Self(q.to_rotation_matrix().into_inner())
    }

    /// Attitude of a device whose rear camera looks along `view` with the
    /// given roll (radians, about the device Z axis).
    ///
    /// With zero roll the top edge of the screen points as close to world up
    /// as possible; looking straight up or down, it points to north instead.
    pub fn pointing(view: HorizonPosition, roll: f64) -> Self {
        let forward = world_direction(view);
        let z_axis = -forward;

        let up = Vector3::z();
        let mut y_axis = up - forward * up.dot(&forward);
        if y_axis.norm() < 1e-9 {
            let north = Vector3::y();
            y_axis = north - forward * north.dot(&forward);
        }
        let y_axis = y_axis.normalize();
        let x_axis = y_axis.cross(&z_axis);

        let base = Matrix3::from_columns(&[x_axis, y_axis, z_axis]);
        let roll = Rotation3::from_axis_angle(&Vector3::z_axis(), roll);

        Self(base * roll.matrix())
    }

    /// Device flat on a table, screen up, top edge pointing north.
    pub fn identity() -> Self {
        Self(Matrix3::identity())
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.0
    }

    /// Element at row `r`, column `c`.
    pub fn get(&self, r: usize, c: usize) -> f64 {
        self.0[(r, c)]
    }

    pub fn to_camera_direction(&self, world: &WorldDirection) -> CameraDirection {
        to_camera_direction(self, world)
    }
}

impl Default for AttitudeMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

/// Unit vector in world space for a horizon position.
///
/// `x = sin(az)·cos(alt)`, `y = cos(az)·cos(alt)`, `z = sin(alt)`. The
/// sin/cos assignment is what makes azimuth 0 point north and π/2 east.
pub fn world_direction(position: HorizonPosition) -> WorldDirection {
    let (sin_az, cos_az) = position.azimuth.sin_cos();
    let (sin_alt, cos_alt) = position.altitude.sin_cos();
    Vector3::new(sin_az * cos_alt, cos_az * cos_alt, sin_alt)
}

/// Expresses a world direction in camera coordinates.
///
/// Applies the transpose of the device-to-world rotation, then flips Y and Z
/// from device to camera convention.
pub fn to_camera_direction(attitude: &AttitudeMatrix, world: &WorldDirection) -> CameraDirection {
    let device = attitude.0.transpose() * world;
    Vector3::new(device.x, -device.y, -device.z)
}
