//! Scenario runner - drives the overlay through a scenario on virtual time.

use crate::context::SimClock;
use crate::ephemeris::SimEphemeris;
use crate::error::SimError;
use crate::exporter::{SimEvent, SimExport, SimFrame};
use crate::feeds::{derive_seed, AttitudeFeed, LocationFeed};
use crate::scenarios::{ScenarioId, ScenarioSetup, ViewTarget};

use heliodos_core::{
    CameraRig, FrameReport, OverlayCompositor, OverlayConfig, OverlayState, PathKind, PathOutcome, RecordingCanvas,
};
use heliodos_env::{Body, Ephemeris, HorizonPosition, ObserverFix, ReferenceClock};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Incremental scale steps of the simulated pinch-out gesture.
const PINCH_STEPS: [f64; 4] = [1.03, 1.03, 1.03, 1.03];

/// Harness configuration.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Render ticks per simulated second
    pub tick_rate_hz: u32,

    /// Simulated run length in seconds
    pub duration_secs: f64,

    /// Export every Nth frame (frames with events are always exported)
    pub export_every: u64,

    /// Standard deviation of the hand tremor on attitude readings, in degrees
    pub tremor_deg: f64,

    /// Slow pan of the camera: amplitude in degrees and period in seconds
    pub pan: (f64, f64),

    /// 1σ horizontal noise of location fixes, in meters
    pub location_noise_m: f64,

    pub overlay: OverlayConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 30,
            duration_secs: 10.0,
            export_every: 10,
            tremor_deg: 0.2,
            pan: (2.0, 8.0),
            location_noise_m: 5.0,
            overlay: OverlayConfig::default(),
        }
    }
}

/// Results from running a scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    /// Scenario that was run
    #[serde(serialize_with = "serialize_scenario")]
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Total ticks executed
    pub total_ticks: u64,

    /// Final simulation time in seconds
    pub final_time_secs: f64,

    /// Failure message if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,
}

fn serialize_scenario<S: serde::Serializer>(scenario: &ScenarioId, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(scenario.name())
}

impl ScenarioResult {
    fn failed(scenario: ScenarioId, seed: u64, reason: String) -> Self {
        Self {
            scenario,
            seed,
            passed: false,
            total_ticks: 0,
            final_time_secs: 0.0,
            failure_reason: Some(reason),
            metrics: ScenarioMetrics::default(),
        }
    }
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScenarioMetrics {
    /// Frames rendered
    pub frames: u64,

    /// Frames in the Active state with celestial content
    pub active_frames: u64,

    /// Frames that drew the placeholder
    pub placeholder_frames: u64,

    /// Frames suppressed for missing attitude or camera
    pub suppressed_frames: u64,

    /// Frames with the sun marker drawn
    pub marker_frames: u64,

    /// Line segments drawn across all frames
    pub segments_drawn: u64,

    /// Path draws skipped for lack of sunrise/sunset
    pub paths_skipped: u64,

    /// AwaitingData <-> Active changes between consecutive frames
    pub state_transitions: u64,

    /// Camera switches caused by pinch gestures
    pub camera_switches: u64,
}

/// One rendered frame as seen by the scenario checks.
#[derive(Debug, Clone)]
struct TracedFrame {
    report: FrameReport,
    commands: usize,
}

/// Everything a scenario check can look at.
#[derive(Debug, Clone, Default)]
struct RunTrace {
    frames: Vec<TracedFrame>,
    metrics: ScenarioMetrics,
    total_ticks: u64,
    final_time_secs: f64,
}

impl RunTrace {
    fn first(&self) -> Result<&TracedFrame, String> {
        self.frames.first().ok_or_else(|| "no frames rendered".to_string())
    }

    fn last(&self) -> Result<&TracedFrame, String> {
        self.frames.last().ok_or_else(|| "no frames rendered".to_string())
    }
}

/// Runs overlay scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    config: SimConfig,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            config: SimConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SimConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the tick rate.
    pub fn with_tick_rate(mut self, hz: u32) -> Self {
        self.config.tick_rate_hz = hz;
        self
    }

    /// Sets the simulated duration.
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.config.duration_secs = secs;
        self
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        self.execute(scenario, None)
    }

    /// Runs a scenario and records its frames for export.
    pub fn run_recorded(&self, scenario: ScenarioId) -> (ScenarioResult, SimExport) {
        let mut export = SimExport::new(scenario.name(), self.seed);
        let result = self.execute(scenario, Some(&mut export));
        export.finalize(result.passed, result.failure_reason.clone());
        (result, export)
    }

    fn execute(&self, scenario: ScenarioId, export: Option<&mut SimExport>) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);

        let trace = match scenario.setup().and_then(|setup| self.simulate(&setup, export)) {
            Ok(trace) => trace,
            Err(e) => {
                warn!("Scenario {} could not run: {}", scenario.name(), e);
                return ScenarioResult::failed(scenario, self.seed, e.to_string());
            }
        };

        let verdict = match scenario {
            ScenarioId::NorthernSummer => check_northern_summer(&trace),
            ScenarioId::SouthernSummer => check_southern_summer(&trace),
            ScenarioId::PolarNight => check_polar_night(&trace),
            ScenarioId::AwaitingFix => check_awaiting_fix(&trace),
            ScenarioId::LateFix => check_late_fix(&trace),
            ScenarioId::LostFix => check_lost_fix(&trace),
            ScenarioId::BlindStart => check_blind_start(&trace),
            ScenarioId::GroundView => check_ground_view(&trace),
            ScenarioId::CameraSwitch => check_camera_switch(&trace),
            ScenarioId::ManualOverride => check_manual_override(&trace),
        };

        ScenarioResult {
            scenario,
            seed: self.seed,
            passed: verdict.is_ok(),
            total_ticks: trace.total_ticks,
            final_time_secs: trace.final_time_secs,
            failure_reason: verdict.err(),
            metrics: trace.metrics,
        }
    }

    /// Feeds sensors into a compositor tick by tick and renders every tick.
    fn simulate(&self, setup: &ScenarioSetup, mut export: Option<&mut SimExport>) -> Result<RunTrace, SimError> {
        if self.config.tick_rate_hz == 0 || !(self.config.duration_secs > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "tick rate {} Hz, duration {} s",
                self.config.tick_rate_hz, self.config.duration_secs
            )));
        }

        let duration = self.config.duration_secs;
        let dt = Duration::from_secs_f64(1.0 / self.config.tick_rate_hz as f64);
        let total_ticks = (duration * self.config.tick_rate_hz as f64).round() as u64;

        let ephemeris = Arc::new(SimEphemeris::new().with_declination_deg(setup.declination_deg));
        let compositor = OverlayCompositor::new(Arc::clone(&ephemeris)).with_config(self.config.overlay.clone())?;
        let clock = SimClock::new(setup.start);

        let mut rig = CameraRig::from_characteristics(setup.cameras.clone());
        compositor.configure_camera_from(&rig);
        compositor.set_viewport_size(setup.viewport.0, setup.viewport.1);

        let view = aim_camera(setup, ephemeris.as_ref(), &clock)?;
        let (mut attitude, mut location) = build_feeds(setup, view, self.seed, duration, &self.config);

        let mut pinch_pending = setup.pinch_at.map(|at| at * duration);
        let mut canvas = RecordingCanvas::new();
        let mut trace = RunTrace {
            total_ticks,
            ..RunTrace::default()
        };
        let mut previous_state: Option<OverlayState> = None;
        let mut pending_events: Vec<SimEvent> = Vec::new();

        for tick in 0..total_ticks {
            let t = clock.elapsed_secs();

            match attitude.sample(t) {
                Some(matrix) => compositor.set_attitude(matrix),
                None => compositor.clear_attitude(),
            }

            match setup.settings.resolve(location.sample(t), &clock)? {
                Some(fix) => compositor.set_observer_fix(fix),
                None => compositor.clear_observer(),
            }

            if pinch_pending.is_some_and(|at| t >= at) {
                pinch_pending = None;
                rig.begin_zoom();
                for step in PINCH_STEPS {
                    let outcome = rig.zoom(step);
                    if outcome.switched() {
                        compositor.configure_camera_from(&rig);
                        trace.metrics.camera_switches += 1;
                        pending_events.push(SimEvent::info(format!(
                            "camera switched to {}",
                            rig.active().map(|c| c.id.as_str()).unwrap_or("?")
                        )));
                    }
                }
            }

            canvas.clear();
            let report = compositor.render(&mut canvas);
            record_metrics(&mut trace.metrics, &report);

            if let Some(previous) = previous_state {
                if previous != report.state {
                    trace.metrics.state_transitions += 1;
                    pending_events.push(SimEvent::warn(format!("{:?} -> {:?}", previous, report.state)));
                }
            }
            previous_state = Some(report.state);

            if let Some(export) = export.as_deref_mut() {
                if tick % self.config.export_every.max(1) == 0 || !pending_events.is_empty() {
                    export.add_frame(SimFrame {
                        time_sec: t,
                        reference_time: clock.now(),
                        report: report.clone(),
                        commands: canvas.commands().to_vec(),
                        events: std::mem::take(&mut pending_events),
                    });
                }
            }
            pending_events.clear();

            if tick % 30 == 0 {
                debug!(
                    "Tick {}: t={:.2}s state={:?} segments={} marker={}",
                    tick,
                    t,
                    report.state,
                    report.segment_count(),
                    report.sun_marker.is_some()
                );
            }

            trace.frames.push(TracedFrame {
                report,
                commands: canvas.len(),
            });
            clock.advance_time(dt);
        }

        trace.final_time_secs = clock.elapsed_secs();
        Ok(trace)
    }
}

/// Magnetic horizon position the camera is held at.
pub fn aim_camera(
    setup: &ScenarioSetup,
    ephemeris: &SimEphemeris,
    clock: &dyn ReferenceClock,
) -> Result<HorizonPosition, SimError> {
    match setup.view {
        ViewTarget::Fixed(position) => Ok(position),
        ViewTarget::Sun => {
            let fix = setup
                .settings
                .resolve(Some(setup.observer), clock)?
                .unwrap_or_else(|| ObserverFix::new(setup.observer, clock.now()));
            let sun = ephemeris.azimuth_altitude_at(Body::Sun, fix.reference_time, &fix.observer);
            let declination = ephemeris.magnetic_declination_at(&fix.observer, fix.reference_time);
            Ok(sun.with_azimuth_offset(declination))
        }
    }
}

/// Seeded attitude and location feeds following the setup's schedule over
/// `duration` seconds.
pub fn build_feeds(
    setup: &ScenarioSetup,
    view: HorizonPosition,
    seed: u64,
    duration: f64,
    config: &SimConfig,
) -> (AttitudeFeed, LocationFeed) {
    let attitude = AttitudeFeed::new(derive_seed(seed, 0), view)
        .with_tremor_deg(config.tremor_deg)
        .with_pan(config.pan.0, config.pan.1)
        .available_from(setup.attitude_from * duration);

    let mut location = match setup.fix_from {
        Some(from) => LocationFeed::new(derive_seed(seed, 1), setup.observer).available_from(from * duration),
        None => LocationFeed::silent(derive_seed(seed, 1), setup.observer),
    }
    .with_noise_m(config.location_noise_m);
    if let Some(lost) = setup.fix_lost_at {
        location = location.lost_at(lost * duration);
    }

    (attitude, location)
}

fn record_metrics(metrics: &mut ScenarioMetrics, report: &FrameReport) {
    metrics.frames += 1;
    if report.placeholder_drawn {
        metrics.placeholder_frames += 1;
    }
    if report.suppressed.is_some() {
        metrics.suppressed_frames += 1;
    } else if report.state == OverlayState::Active {
        metrics.active_frames += 1;
    }
    if report.sun_marker.is_some() {
        metrics.marker_frames += 1;
    }
    metrics.segments_drawn += report.segment_count() as u64;
    metrics.paths_skipped += report
        .paths
        .iter()
        .filter(|p| p.outcome == PathOutcome::NoRiseSet)
        .count() as u64;
}

// ============================================================================
// SCENARIO CHECKS
// ============================================================================

fn ensure(condition: bool, message: impl FnOnce() -> String) -> Result<(), String> {
    if condition {
        Ok(())
    } else {
        Err(message())
    }
}

fn all_paths_drawn(frame: &TracedFrame) -> Result<(), String> {
    for path in &frame.report.paths {
        ensure(matches!(path.outcome, PathOutcome::Drawn { .. }), || {
            format!("{} path not drawn: {:?}", path.kind.name(), path.outcome)
        })?;
    }
    ensure(frame.report.paths.len() == 4, || {
        format!("expected 4 paths, got {}", frame.report.paths.len())
    })
}

fn path_color(frame: &TracedFrame, kind: PathKind) -> Result<heliodos_core::Color, String> {
    frame
        .report
        .path(kind)
        .map(|p| p.stroke.color)
        .ok_or_else(|| format!("{} path missing", kind.name()))
}

/// SIM-001: everything on screen at midsummer.
fn check_northern_summer(trace: &RunTrace) -> Result<(), String> {
    let m = &trace.metrics;
    ensure(m.active_frames == m.frames, || format!("{} of {} frames active", m.active_frames, m.frames))?;
    ensure(m.marker_frames == m.frames, || format!("marker in {} of {} frames", m.marker_frames, m.frames))?;
    ensure(m.segments_drawn > 0, || "no path segments drawn".to_string())?;

    let last = trace.last()?;
    all_paths_drawn(last)?;
    ensure(path_color(last, PathKind::JuneSolstice)? == heliodos_core::Color::RED, || {
        "June path should be summer red in the north".to_string()
    })
}

/// SIM-002: hemisphere color law.
fn check_southern_summer(trace: &RunTrace) -> Result<(), String> {
    let last = trace.last()?;
    all_paths_drawn(last)?;
    ensure(path_color(last, PathKind::JuneSolstice)? == heliodos_core::Color::BLUE, || {
        "June path should be winter blue in the south".to_string()
    })?;
    ensure(path_color(last, PathKind::DecemberSolstice)? == heliodos_core::Color::RED, || {
        "December path should be summer red in the south".to_string()
    })?;
    ensure(trace.metrics.marker_frames == trace.metrics.frames, || "sun marker lost".to_string())
}

/// SIM-003: polar night skips rise/set-less days but keeps the equinox.
fn check_polar_night(trace: &RunTrace) -> Result<(), String> {
    for frame in &trace.frames {
        ensure(frame.report.state == OverlayState::Active, || "overlay left Active".to_string())?;
        for kind in [PathKind::CurrentDay, PathKind::JuneSolstice, PathKind::DecemberSolstice] {
            let outcome = frame.report.path(kind).map(|p| &p.outcome);
            ensure(outcome == Some(&PathOutcome::NoRiseSet), || {
                format!("{} path should be skipped, got {:?}", kind.name(), outcome)
            })?;
        }
        let equinox = frame.report.path(PathKind::MarchEquinox).map(|p| &p.outcome);
        ensure(matches!(equinox, Some(PathOutcome::Drawn { .. })), || {
            format!("equinox path should be drawn, got {:?}", equinox)
        })?;
    }
    ensure(trace.metrics.paths_skipped == 3 * trace.metrics.frames, || {
        format!("{} skipped paths", trace.metrics.paths_skipped)
    })
}

/// SIM-004: placeholder only, never empty.
fn check_awaiting_fix(trace: &RunTrace) -> Result<(), String> {
    for frame in &trace.frames {
        ensure(frame.report.state == OverlayState::AwaitingData, || "unexpected location".to_string())?;
        ensure(frame.report.placeholder_drawn && frame.commands == 2, || {
            format!("expected box and text only, got {} calls", frame.commands)
        })?;
    }
    ensure(trace.metrics.segments_drawn == 0 && trace.metrics.marker_frames == 0, || {
        "celestial content drawn without a location".to_string()
    })
}

/// SIM-005: one transition into Active.
fn check_late_fix(trace: &RunTrace) -> Result<(), String> {
    ensure(trace.first()?.report.state == OverlayState::AwaitingData, || "started Active".to_string())?;
    ensure(trace.last()?.report.state == OverlayState::Active, || "never became Active".to_string())?;
    ensure(trace.metrics.state_transitions == 1, || {
        format!("{} state transitions", trace.metrics.state_transitions)
    })?;
    ensure(trace.metrics.placeholder_frames > 0, || "no placeholder before the fix".to_string())
}

/// SIM-006: one transition back to AwaitingData.
fn check_lost_fix(trace: &RunTrace) -> Result<(), String> {
    ensure(trace.first()?.report.state == OverlayState::Active, || "started without a fix".to_string())?;
    let last = trace.last()?;
    ensure(last.report.state == OverlayState::AwaitingData && last.report.placeholder_drawn, || {
        "placeholder not shown after the fix was lost".to_string()
    })?;
    ensure(trace.metrics.state_transitions == 1, || {
        format!("{} state transitions", trace.metrics.state_transitions)
    })
}

/// SIM-007: suppressed frames are blank, then the overlay appears.
fn check_blind_start(trace: &RunTrace) -> Result<(), String> {
    ensure(trace.metrics.suppressed_frames > 0, || "no suppressed frames".to_string())?;
    for frame in trace.frames.iter().filter(|f| f.report.suppressed.is_some()) {
        ensure(frame.commands == 0, || format!("suppressed frame drew {} calls", frame.commands))?;
    }
    let last = trace.last()?;
    ensure(last.report.suppressed.is_none() && last.report.sun_marker.is_some(), || {
        "overlay did not recover once attitude arrived".to_string()
    })
}

/// SIM-008: sun behind the camera.
fn check_ground_view(trace: &RunTrace) -> Result<(), String> {
    ensure(trace.metrics.active_frames == trace.metrics.frames, || "frames not active".to_string())?;
    ensure(trace.metrics.marker_frames == 0, || {
        format!("marker drawn in {} frames", trace.metrics.marker_frames)
    })
}

/// SIM-009: one switch, marker kept.
fn check_camera_switch(trace: &RunTrace) -> Result<(), String> {
    ensure(trace.metrics.camera_switches == 1, || {
        format!("{} camera switches", trace.metrics.camera_switches)
    })?;
    ensure(trace.metrics.marker_frames == trace.metrics.frames, || "sun marker lost".to_string())
}

/// SIM-010: manual settings win over the silent device.
fn check_manual_override(trace: &RunTrace) -> Result<(), String> {
    ensure(trace.metrics.active_frames == trace.metrics.frames, || "manual location not used".to_string())?;
    let anchors: Vec<_> = trace
        .frames
        .iter()
        .filter_map(|f| f.report.path(PathKind::CurrentDay).map(|p| p.anchor))
        .collect();
    ensure(anchors.windows(2).all(|w| w[0] == w[1]), || "reference time followed the clock".to_string())?;
    ensure(trace.metrics.marker_frames == trace.metrics.frames, || "sun marker lost".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner() -> ScenarioRunner {
        ScenarioRunner::new(42).with_duration(2.0).with_tick_rate(15)
    }

    #[test]
    fn test_all_scenarios_pass() {
        let runner = runner();
        for scenario in ScenarioId::all() {
            let result = runner.run(scenario);
            assert!(result.passed, "{} failed: {:?}", scenario, result.failure_reason);
            assert_eq!(result.total_ticks, 30);
            assert_eq!(result.metrics.frames, 30);
        }
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let a = runner().run(ScenarioId::LateFix);
        let b = runner().run(ScenarioId::LateFix);
        assert_eq!(a.metrics, b.metrics);
    }

    #[test]
    fn test_recorded_run_exports_events() {
        let (result, export) = runner().run_recorded(ScenarioId::LostFix);
        assert!(result.passed);
        assert!(export.passed);
        assert_eq!(export.scenario, "lost_fix");
        assert!(export.frames.iter().any(|f| !f.events.is_empty()));
        assert!(export.frames.len() < result.metrics.frames as usize);
    }

    #[test]
    fn test_invalid_config_fails_cleanly() {
        let result = ScenarioRunner::new(1).with_tick_rate(0).run(ScenarioId::NorthernSummer);
        assert!(!result.passed);
        assert!(result.failure_reason.unwrap().contains("tick rate"));
    }

    #[test]
    fn test_result_serializes_scenario_name() {
        let result = runner().run(ScenarioId::AwaitingFix);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["scenario"], "awaiting_fix");
        assert_eq!(value["metrics"]["placeholder_frames"], 30);
    }
}
