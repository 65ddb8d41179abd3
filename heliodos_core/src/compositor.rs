//! The "OVERLAY" Engine - Per-Frame Compositor
//!
//! Owns the latest inputs (attitude, observer fix, camera model) and turns
//! them into draw calls once per frame.
//!
//! # Frame
//!
//! ```text
//! no attitude / no camera ─► suppressed (blank, or neutral placeholder)
//! no observer             ─► "waiting for location" placeholder
//! otherwise               ─► [cardinal markers] → current day path
//!                            → June / December / March paths → sun marker
//! ```
//!
//! # Publication
//!
//! Producers replace inputs from any thread; each mutator clones the current
//! [`FrameSnapshot`], changes one field and swaps the `Arc`. A render pass
//! grabs the `Arc` once and never sees a half-applied update.
//!
//! # Usage
//!
//! ```ignore
//! let compositor = OverlayCompositor::new(Arc::new(ephemeris));
//! compositor.configure_camera(CameraIntrinsics::default());
//! compositor.set_viewport_size(1080, 1920);
//! compositor.set_attitude(AttitudeMatrix::from_row_major(rotation));
//! compositor.set_observer(47.37, 8.54, 408.0, Utc::now())?;
//!
//! let report = compositor.render(&mut canvas);
//! ```

use crate::canvas::{Canvas, Color, Rect, Stroke};
use crate::config::{OverlayConfig, SuppressedPolicy};
use crate::error::Result;
use crate::heliodos_attitude::AttitudeMatrix;
use crate::heliodos_camera::{CameraIntrinsics, CameraProjectionModel, ViewPoint, ViewportSize};
use crate::heliodos_path::{drawable_segments, CelestialPathSampler};
use chrono::Datelike;
use heliodos_env::{
    Body, CameraSource, Ephemeris, HorizonPosition, Observer, ObserverFix, Timestamp,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

// ============================================================================
// SNAPSHOT & STATE
// ============================================================================

/// Everything a render pass reads, captured at frame start.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameSnapshot {
    pub attitude: Option<AttitudeMatrix>,
    pub observer: Option<ObserverFix>,
    pub camera: CameraProjectionModel,
}

impl FrameSnapshot {
    pub fn state(&self) -> OverlayState {
        if self.observer.is_some() {
            OverlayState::Active
        } else {
            OverlayState::AwaitingData
        }
    }
}

/// Top-level overlay state, driven by the presence of a location fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverlayState {
    /// No location yet: only the placeholder is drawn
    AwaitingData,

    /// Location present: full overlay
    Active,
}

/// Why a frame drew no celestial content despite the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuppressReason {
    NoAttitude,
    NoCamera,
}

/// The four paths drawn in the active state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathKind {
    CurrentDay,
    JuneSolstice,
    DecemberSolstice,
    MarchEquinox,
}

impl PathKind {
    pub fn name(&self) -> &'static str {
        match self {
            PathKind::CurrentDay => "current day",
            PathKind::JuneSolstice => "June solstice",
            PathKind::DecemberSolstice => "December solstice",
            PathKind::MarchEquinox => "March equinox",
        }
    }
}

/// What happened to one path in a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PathOutcome {
    /// Sampled and drawn; `segments` may be 0 if the path is out of view
    Drawn {
        visible_samples: usize,
        segments: usize,
    },

    /// No sunrise/sunset pair around the anchor instant (polar day/night)
    NoRiseSet,

    /// Sampling was rejected
    Failed(String),
}

/// One path's entry in a [`FrameReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathReport {
    pub kind: PathKind,

    /// Instant whose day the path covers
    pub anchor: Timestamp,

    pub stroke: Stroke,

    pub outcome: PathOutcome,
}

/// Summary of one render pass.
///
/// Produced alongside the draw calls; nothing reads it back into rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub state: OverlayState,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub suppressed: Option<SuppressReason>,

    pub placeholder_drawn: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<PathReport>,

    /// View position of the sun marker, if the sun was in front of the camera
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sun_marker: Option<ViewPoint>,

    pub cardinal_markers: usize,
}

impl FrameReport {
    fn new(state: OverlayState) -> Self {
        Self {
            state,
            suppressed: None,
            placeholder_drawn: false,
            paths: Vec::new(),
            sun_marker: None,
            cardinal_markers: 0,
        }
    }

    pub fn path(&self, kind: PathKind) -> Option<&PathReport> {
        self.paths.iter().find(|p| p.kind == kind)
    }

    /// Total line segments drawn across all paths.
    pub fn segment_count(&self) -> usize {
        self.paths
            .iter()
            .map(|p| match p.outcome {
                PathOutcome::Drawn { segments, .. } => segments,
                _ => 0,
            })
            .sum()
    }
}

/// Reference markers at the cardinal directions, zenith and nadir.
const CARDINAL_MARKERS: [(f64, f64, Color); 6] = [
    (0.0, 0.0, Color::YELLOW),             // N
    (FRAC_PI_2, 0.0, Color::RED),          // E
    (PI, 0.0, Color::GREEN),               // S
    (3.0 * FRAC_PI_2, 0.0, Color::BLUE),   // W
    (0.0, FRAC_PI_2, Color::WHITE),        // zenith
    (0.0, -FRAC_PI_2, Color::BLACK),       // nadir
];

// ============================================================================
// COMPOSITOR
// ============================================================================

/// Per-frame orchestrator of the overlay.
///
/// `Send + Sync`; share it between producers and the render loop via `Arc`.
pub struct OverlayCompositor<E: Ephemeris + ?Sized> {
    ephemeris: Arc<E>,
    config: OverlayConfig,
    snapshot: RwLock<Arc<FrameSnapshot>>,
}

impl<E: Ephemeris + ?Sized> OverlayCompositor<E> {
    /// Creates a compositor with default configuration and no inputs.
    pub fn new(ephemeris: Arc<E>) -> Self {
        Self {
            ephemeris,
            config: OverlayConfig::default(),
            snapshot: RwLock::new(Arc::new(FrameSnapshot::default())),
        }
    }

    /// Replaces the configuration after validating it.
    pub fn with_config(mut self, config: OverlayConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// The inputs the next frame would render.
    pub fn snapshot(&self) -> Arc<FrameSnapshot> {
        Arc::clone(&self.snapshot.read())
    }

    pub fn state(&self) -> OverlayState {
        self.snapshot.read().state()
    }

    // ------------------------------------------------------------------------
    // Mutators
    // ------------------------------------------------------------------------

    pub fn set_attitude(&self, attitude: AttitudeMatrix) {
        self.update(|s| s.attitude = Some(attitude));
    }

    pub fn clear_attitude(&self) {
        self.update(|s| s.attitude = None);
    }

    /// Supplies a new observer tuple; coordinates are validated.
    pub fn set_observer(
        &self,
        latitude_deg: f64,
        longitude_deg: f64,
        altitude_m: f64,
        reference_time: Timestamp,
    ) -> Result<()> {
        let observer = Observer::new(latitude_deg, longitude_deg, altitude_m)?;
        self.set_observer_fix(ObserverFix::new(observer, reference_time));
        Ok(())
    }

    pub fn set_observer_fix(&self, fix: ObserverFix) {
        let previous = self.update(|s| s.observer.replace(fix));
        if previous.is_none() {
            info!(
                lat = fix.observer.latitude_deg(),
                lon = fix.observer.longitude_deg(),
                "Overlay active: location received"
            );
        }
    }

    pub fn clear_observer(&self) {
        let previous = self.update(|s| s.observer.take());
        if previous.is_some() {
            info!("Overlay awaiting data: location cleared");
        }
    }

    pub fn set_viewport_size(&self, width: i32, height: i32) {
        self.update(|s| s.camera.set_viewport_size(width, height));
    }

    pub fn configure_camera(&self, intrinsics: CameraIntrinsics) {
        self.update(|s| s.camera.configure(intrinsics));
    }

    /// Polls `source` for the active camera; no camera deconfigures.
    pub fn configure_camera_from<S: CameraSource + ?Sized>(&self, source: &S) {
        match source.current_intrinsics() {
            Some(characteristics) => {
                self.configure_camera(CameraIntrinsics::from_characteristics(&characteristics))
            }
            None => self.clear_camera(),
        }
    }

    pub fn clear_camera(&self) {
        self.update(|s| s.camera.deconfigure());
    }

    fn update<R>(&self, f: impl FnOnce(&mut FrameSnapshot) -> R) -> R {
        let mut guard = self.snapshot.write();
        let mut next = FrameSnapshot::clone(&guard);
        let result = f(&mut next);
        *guard = Arc::new(next);
        result
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    /// Draws one frame from the latest snapshot.
    ///
    /// Never fails: missing inputs reduce the overlay instead.
    pub fn render<C: Canvas + ?Sized>(&self, canvas: &mut C) -> FrameReport {
        let snapshot = self.snapshot();
        let viewport = snapshot.camera.viewport();
        let mut report = FrameReport::new(snapshot.state());

        let attitude = match (&snapshot.attitude, snapshot.camera.is_configured()) {
            (Some(attitude), true) => attitude,
            (None, _) => return self.suppress(canvas, viewport, report, SuppressReason::NoAttitude),
            (_, false) => return self.suppress(canvas, viewport, report, SuppressReason::NoCamera),
        };

        let fix = match snapshot.observer {
            Some(fix) => fix,
            None => {
                report.placeholder_drawn = self.draw_placeholder(canvas, viewport, &self.config.placeholder_text);
                trace!("Frame: awaiting location");
                return report;
            }
        };

        let sampler = CelestialPathSampler::new(attitude, &snapshot.camera);

        if self.config.show_cardinal_markers {
            report.cardinal_markers = self.draw_cardinal_markers(canvas, &sampler);
        }

        for (kind, anchor, stroke) in self.path_plan(&fix) {
            let outcome = self.draw_path(canvas, &sampler, &fix.observer, anchor, stroke);
            if !matches!(outcome, PathOutcome::Drawn { .. }) {
                debug!(path = kind.name(), ?outcome, "Path skipped");
            }
            report.paths.push(PathReport {
                kind,
                anchor,
                stroke,
                outcome,
            });
        }

        let sun = self.magnetic_sun_position(&fix.observer, fix.reference_time);
        report.sun_marker = sampler.project(sun);
        if let Some(center) = report.sun_marker {
            canvas.draw_circle(center, self.config.marker_radius, self.config.marker_color);
        }

        trace!(
            segments = report.segment_count(),
            marker = report.sun_marker.is_some(),
            "Frame rendered"
        );
        report
    }

    fn suppress<C: Canvas + ?Sized>(
        &self,
        canvas: &mut C,
        viewport: ViewportSize,
        mut report: FrameReport,
        reason: SuppressReason,
    ) -> FrameReport {
        report.suppressed = Some(reason);
        if self.config.suppressed_policy == SuppressedPolicy::Placeholder {
            report.placeholder_drawn = self.draw_placeholder(canvas, viewport, &self.config.suppressed_text);
        }
        trace!(?reason, "Frame suppressed");
        report
    }

    /// Centered text over a translucent box sized to the measured text.
    fn draw_placeholder<C: Canvas + ?Sized>(&self, canvas: &mut C, viewport: ViewportSize, text: &str) -> bool {
        if !viewport.is_drawable() {
            return false;
        }

        let center = viewport.center();
        let size = self.config.placeholder_text_size;
        let pad = self.config.placeholder_padding;
        let bounds = canvas.measure_text(text, size);

        let rect = Rect::centered(center, bounds.width + 2.0 * pad, bounds.height + 2.0 * pad);
        canvas.draw_rect(rect, self.config.placeholder_background);
        canvas.draw_text(text, center, size, self.config.placeholder_text_color);
        true
    }

    /// Anchor instant and stroke of each path, in draw order.
    fn path_plan(&self, fix: &ObserverFix) -> [(PathKind, Timestamp, Stroke); 4] {
        let year = fix.reference_time.year();
        let solstices = self.ephemeris.solstices_of(year);
        let equinox = self.ephemeris.march_equinox_of(year);

        let width = self.config.reference_stroke_width;
        let (june, december) = self.config.solstice_colors(fix.observer.is_northern());

        [
            (PathKind::CurrentDay, fix.reference_time, self.config.current_day_stroke),
            (PathKind::JuneSolstice, solstices.june, Stroke::new(june, width)),
            (PathKind::DecemberSolstice, solstices.december, Stroke::new(december, width)),
            (PathKind::MarchEquinox, equinox, Stroke::new(self.config.equinox_color, width)),
        ]
    }

    fn draw_path<C: Canvas + ?Sized>(
        &self,
        canvas: &mut C,
        sampler: &CelestialPathSampler<'_>,
        observer: &Observer,
        anchor: Timestamp,
        stroke: Stroke,
    ) -> PathOutcome {
        let Some(day) = self.ephemeris.sunrise_sunset_around(anchor, observer) else {
            return PathOutcome::NoRiseSet;
        };

        let points = match sampler.sample_path(day.sunrise, day.sunset, self.config.sample_count, |t| {
            self.path_position(observer, t)
        }) {
            Ok(points) => points,
            Err(e) => {
                warn!(error = %e, "Path sampling failed");
                return PathOutcome::Failed(e.to_string());
            }
        };

        let mut segments = 0;
        for (from, to) in drawable_segments(&points) {
            canvas.draw_line(from, to, stroke);
            segments += 1;
        }

        PathOutcome::Drawn {
            visible_samples: points.iter().filter(|p| p.is_some()).count(),
            segments,
        }
    }

    fn path_position(&self, observer: &Observer, time: Timestamp) -> HorizonPosition {
        if self.config.declination_on_paths {
            self.magnetic_sun_position(observer, time)
        } else {
            self.ephemeris.azimuth_altitude_at(Body::Sun, time, observer)
        }
    }

    /// Sun position relative to magnetic north, matching the attitude frame.
    fn magnetic_sun_position(&self, observer: &Observer, time: Timestamp) -> HorizonPosition {
        let declination = self.ephemeris.magnetic_declination_at(observer, time);
        self.ephemeris
            .azimuth_altitude_at(Body::Sun, time, observer)
            .with_azimuth_offset(declination)
    }

    fn draw_cardinal_markers<C: Canvas + ?Sized>(&self, canvas: &mut C, sampler: &CelestialPathSampler<'_>) -> usize {
        let mut drawn = 0;
        for (azimuth, altitude, color) in CARDINAL_MARKERS {
            if let Some(center) = sampler.project(HorizonPosition::new(azimuth, altitude)) {
                canvas.draw_circle(center, self.config.cardinal_marker_radius, color);
                drawn += 1;
            }
        }
        drawn
    }
}
