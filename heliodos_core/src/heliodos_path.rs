//! The "PATH" Engine - Celestial Path Sampler
//!
//! Turns a position-over-time function into a polyline in view space.
//!
//! # Sampling
//!
//! `count` timestamps evenly spaced over `[start, end]`, endpoints included:
//!
//! ```text
//! t_i = start + (end - start) * i / (count - 1)
//! ```
//!
//! Each sample goes through world direction → attitude → camera projection.
//! Samples that cannot be projected stay in the output as `None` so that the
//! polyline breaks there instead of bridging the gap.

use crate::error::{CoreError, Result};
use crate::heliodos_attitude::{world_direction, AttitudeMatrix};
use crate::heliodos_camera::{CameraProjectionModel, ProjectedPoint, ViewPoint};
use chrono::Duration;
use heliodos_env::{HorizonPosition, Timestamp};

/// Samples per path unless configured otherwise.
pub const DEFAULT_SAMPLE_COUNT: usize = 20;

/// Upper bound on samples per path.
pub const MAX_SAMPLE_COUNT: usize = 10_000;

/// One evaluated point of a path.
pub type PathSample = (Timestamp, HorizonPosition);

/// Evenly spaced timestamps over `[start, end]`, both endpoints included.
///
/// Interpolation happens at microsecond resolution; the last timestamp is
/// always exactly `end`.
pub fn sample_times(start: Timestamp, end: Timestamp, count: usize) -> Result<Vec<Timestamp>> {
    if !(2..=MAX_SAMPLE_COUNT).contains(&count) {
        return Err(CoreError::InvalidSampleCount(count));
    }

    let span_us = (end - start)
        .num_microseconds()
        .ok_or_else(|| CoreError::config("path interval too long to sample"))?;
    let steps = (count - 1) as i128;

    let times = (0..count)
        .map(|i| {
            if i == count - 1 {
                end
            } else {
                let offset = span_us as i128 * i as i128 / steps;
                start + Duration::microseconds(offset as i64)
            }
        })
        .collect();

    Ok(times)
}

/// Evaluates `position_fn` at each sample time.
pub fn sample_positions<F>(
    start: Timestamp,
    end: Timestamp,
    count: usize,
    mut position_fn: F,
) -> Result<Vec<PathSample>>
where
    F: FnMut(Timestamp) -> HorizonPosition,
{
    Ok(sample_times(start, end, count)?
        .into_iter()
        .map(|t| (t, position_fn(t)))
        .collect())
}

/// Consecutive pairs of a sampled path that can be drawn as line segments.
///
/// A pair with a missing endpoint is skipped, never interpolated.
pub fn drawable_segments(points: &[ProjectedPoint]) -> impl Iterator<Item = (ViewPoint, ViewPoint)> + '_ {
    points.windows(2).filter_map(|pair| match (pair[0], pair[1]) {
        (Some(a), Some(b)) => Some((a, b)),
        _ => None,
    })
}

/// Projects horizon positions to view pixels for one attitude/camera pair.
#[derive(Debug, Clone, Copy)]
pub struct CelestialPathSampler<'a> {
    attitude: &'a AttitudeMatrix,
    camera: &'a CameraProjectionModel,
}

impl<'a> CelestialPathSampler<'a> {
    pub fn new(attitude: &'a AttitudeMatrix, camera: &'a CameraProjectionModel) -> Self {
        Self { attitude, camera }
    }

    /// Projects a single horizon position.
    pub fn project(&self, position: HorizonPosition) -> ProjectedPoint {
        let camera_dir = self.attitude.to_camera_direction(&world_direction(position));
        self.camera.project_direction(&camera_dir)
    }

    /// Samples `position_fn` over `[start, end]` and projects every sample.
    ///
    /// The result always has exactly `sample_count` entries.
    pub fn sample_path<F>(
        &self,
        start: Timestamp,
        end: Timestamp,
        sample_count: usize,
        position_fn: F,
    ) -> Result<Vec<ProjectedPoint>>
    where
        F: FnMut(Timestamp) -> HorizonPosition,
    {
        Ok(sample_positions(start, end, sample_count, position_fn)?
            .into_iter()
            .map(|(_, position)| self.project(position))
            .collect())
    }
}
