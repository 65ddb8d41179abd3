//! Live driver: sensor producers and the render loop on separate tasks.
//!
//! Attitude and location updates arrive on their own tokio tasks at their own
//! rates while the render ticker draws frames, all sharing one
//! [`OverlayCompositor`] through an `Arc`. Each render reads a single
//! published snapshot, so a frame never mixes an old attitude with a new one.

use crate::error::SimError;
use crate::feeds::{AttitudeFeed, LocationFeed};
use heliodos_core::{OverlayCompositor, OverlayState, RecordingCanvas};
use heliodos_env::{Ephemeris, ObserverFix, ReferenceClock};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Rates of the live producers and the renderer.
#[derive(Debug, Clone)]
pub struct LiveConfig {
    /// Rotation sensor rate (default: 50 Hz)
    pub attitude_rate_hz: f64,

    /// Interval between location fixes (default: 1 s)
    pub location_period: Duration,

    /// Render rate (default: 30 Hz)
    pub render_rate_hz: f64,

    /// How long to run (default: 10 s)
    pub duration: Duration,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            attitude_rate_hz: 50.0,
            location_period: Duration::from_secs(1),
            render_rate_hz: 30.0,
            duration: Duration::from_secs(10),
        }
    }
}

impl LiveConfig {
    /// Default rates, running for `secs` seconds (negative counts as zero).
    pub fn for_duration_secs(secs: f64) -> Result<Self, SimError> {
        let duration = Duration::try_from_secs_f64(secs.max(0.0))
            .map_err(|e| SimError::InvalidConfig(format!("live duration {} s: {}", secs, e)))?;
        Ok(Self {
            duration,
            ..Self::default()
        })
    }

    fn validate(&self) -> Result<(), SimError> {
        self.attitude_period()?;
        self.render_period()?;
        if self.location_period.is_zero() {
            return Err(SimError::InvalidConfig("location period must be positive".to_string()));
        }
        Ok(())
    }

    fn attitude_period(&self) -> Result<Duration, SimError> {
        rate_period("attitude", self.attitude_rate_hz)
    }

    fn render_period(&self) -> Result<Duration, SimError> {
        rate_period("render", self.render_rate_hz)
    }
}

/// Tick period of a rate, rejecting rates whose period is zero or unrepresentable.
fn rate_period(name: &str, hz: f64) -> Result<Duration, SimError> {
    if !(hz.is_finite() && hz > 0.0) {
        return Err(SimError::InvalidConfig(format!("{} rate must be positive, got {} Hz", name, hz)));
    }
    match Duration::try_from_secs_f64(1.0 / hz) {
        Ok(period) if !period.is_zero() => Ok(period),
        _ => Err(SimError::InvalidConfig(format!("{} rate {} Hz has no usable tick period", name, hz))),
    }
}

/// Counters from a live run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LiveSummary {
    pub frames: u64,
    pub active_frames: u64,
    pub suppressed_frames: u64,
    pub marker_frames: u64,
    pub attitude_updates: u64,
    pub location_updates: u64,
}

/// Runs the producers and the renderer until `config.duration` elapses.
pub async fn run_live<E>(
    compositor: Arc<OverlayCompositor<E>>,
    mut attitude: AttitudeFeed,
    mut location: LocationFeed,
    clock: Arc<dyn ReferenceClock>,
    config: LiveConfig,
) -> Result<LiveSummary, SimError>
where
    E: Ephemeris + 'static,
{
    config.validate()?;
    let attitude_period = config.attitude_period()?;
    let render_period = config.render_period()?;

    let start = Instant::now();
    let attitude_updates = Arc::new(AtomicU64::new(0));
    let location_updates = Arc::new(AtomicU64::new(0));

    let attitude_task = tokio::spawn({
        let compositor = Arc::clone(&compositor);
        let counter = Arc::clone(&attitude_updates);
        async move {
            let mut ticker = interval(attitude_period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                match attitude.sample(start.elapsed().as_secs_f64()) {
                    Some(matrix) => compositor.set_attitude(matrix),
                    None => compositor.clear_attitude(),
                }
                counter.fetch_add(1, Ordering::Relaxed);
            }
        }
    });

    let location_task = tokio::spawn({
        let compositor = Arc::clone(&compositor);
        let counter = Arc::clone(&location_updates);
        let period = config.location_period;
        async move {
            let mut ticker = interval(period);
            loop {
                ticker.tick().await;
                match location.sample(start.elapsed().as_secs_f64()) {
                    Some(observer) => compositor.set_observer_fix(ObserverFix::new(observer, clock.now())),
                    None => compositor.clear_observer(),
                }
                counter.fetch_add(1, Ordering::Relaxed);
            }
        }
    });

    info!(
        "Live run: attitude {} Hz, location every {:?}, render {} Hz for {:?}",
        config.attitude_rate_hz, config.location_period, config.render_rate_hz, config.duration
    );

    let mut summary = LiveSummary::default();
    let mut canvas = RecordingCanvas::new();
    let mut ticker = interval(render_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    while start.elapsed() < config.duration {
        ticker.tick().await;
        canvas.clear();
        let report = compositor.render(&mut canvas);

        summary.frames += 1;
        if report.suppressed.is_some() {
            summary.suppressed_frames += 1;
        } else if report.state == OverlayState::Active {
            summary.active_frames += 1;
        }
        if report.sun_marker.is_some() {
            summary.marker_frames += 1;
        }

        if summary.frames % 30 == 0 {
            debug!(
                "Frame {}: state={:?} calls={} marker={:?}",
                summary.frames,
                report.state,
                canvas.len(),
                report.sun_marker
            );
        }
    }

    attitude_task.abort();
    location_task.abort();
    join_producer("attitude", attitude_task).await?;
    join_producer("location", location_task).await?;

    summary.attitude_updates = attitude_updates.load(Ordering::Relaxed);
    summary.location_updates = location_updates.load(Ordering::Relaxed);
    Ok(summary)
}

/// Waits for an aborted producer, reporting a panic that ended it early.
async fn join_producer(name: &'static str, task: JoinHandle<()>) -> Result<(), SimError> {
    match task.await {
        Err(e) if e.is_panic() => Err(SimError::TaskPanicked(name)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::SimEphemeris;
    use chrono::{TimeZone, Utc};
    use heliodos_core::CameraIntrinsics;
    use heliodos_env::{Body, FixedClock, Observer};

    fn zurich() -> Observer {
        Observer::new(47.3769, 8.5417, 408.0).unwrap()
    }

    fn setup() -> (Arc<OverlayCompositor<SimEphemeris>>, AttitudeFeed, Arc<dyn ReferenceClock>) {
        let ephemeris = Arc::new(SimEphemeris::new());
        let compositor = Arc::new(OverlayCompositor::new(Arc::clone(&ephemeris)));
        compositor.configure_camera(CameraIntrinsics::default());
        compositor.set_viewport_size(1080, 1920);

        let now = Utc.with_ymd_and_hms(2024, 6, 21, 9, 0, 0).unwrap();
        let sun = ephemeris.azimuth_altitude_at(Body::Sun, now, &zurich());
        let attitude = AttitudeFeed::new(1, sun).with_tremor_deg(0.1);
        (compositor, attitude, Arc::new(FixedClock(now)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_run_renders_active_frames() {
        let (compositor, attitude, clock) = setup();
        let location = LocationFeed::new(2, zurich());
        let config = LiveConfig {
            duration: Duration::from_secs(2),
            ..LiveConfig::default()
        };

        let summary = run_live(compositor, attitude, location, clock, config).await.unwrap();

        assert!((55..=65).contains(&summary.frames), "frames {}", summary.frames);
        assert!(summary.active_frames >= summary.frames - 2);
        assert!(summary.marker_frames >= summary.frames - 2);
        assert!(summary.location_updates >= 2);
        assert!(summary.attitude_updates > summary.location_updates);
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_run_without_fix_stays_awaiting() {
        let (compositor, attitude, clock) = setup();
        let location = LocationFeed::silent(2, zurich());
        let config = LiveConfig {
            duration: Duration::from_secs(1),
            ..LiveConfig::default()
        };

        let summary = run_live(Arc::clone(&compositor), attitude, location, clock, config)
            .await
            .unwrap();

        assert_eq!(summary.active_frames, 0);
        assert_eq!(summary.marker_frames, 0);
        assert_eq!(compositor.state(), OverlayState::AwaitingData);
    }

    #[tokio::test]
    async fn test_invalid_rates_rejected() {
        let (compositor, attitude, clock) = setup();
        let location = LocationFeed::new(2, zurich());
        let config = LiveConfig {
            render_rate_hz: 0.0,
            ..LiveConfig::default()
        };

        let result = run_live(compositor, attitude, location, clock, config).await;
        assert!(matches!(result, Err(SimError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_rates_without_tick_period_rejected() {
        let (compositor, attitude, clock) = setup();
        let location = LocationFeed::new(2, zurich());
        let config = LiveConfig {
            attitude_rate_hz: 1e12,
            ..LiveConfig::default()
        };

        let result = run_live(compositor, attitude, location, clock, config).await;
        assert!(matches!(result, Err(SimError::InvalidConfig(_))));
        assert!(rate_period("render", f64::MIN_POSITIVE).is_err());
        assert_eq!(rate_period("render", 4.0).unwrap(), Duration::from_millis(250));
    }

    #[test]
    fn test_duration_from_seconds() {
        assert_eq!(LiveConfig::for_duration_secs(2.5).unwrap().duration, Duration::from_millis(2500));
        assert_eq!(LiveConfig::for_duration_secs(-1.0).unwrap().duration, Duration::ZERO);
        assert!(matches!(
            LiveConfig::for_duration_secs(f64::INFINITY),
            Err(SimError::InvalidConfig(_))
        ));
        assert!(LiveConfig::for_duration_secs(1e30).is_err());
    }

    #[tokio::test]
    async fn test_producer_panic_surfaces_as_error() {
        let task = tokio::spawn(async { panic!("sensor failure") });
        assert!(matches!(join_producer("attitude", task).await, Err(SimError::TaskPanicked("attitude"))));

        let task = tokio::spawn(std::future::pending::<()>());
        task.abort();
        assert!(join_producer("location", task).await.is_ok());
    }
}
