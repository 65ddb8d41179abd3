//! Heliodos Deterministic Simulation Harness
//!
//! Runs the overlay pipeline against simulated sensors, a virtual clock and
//! an analytic solar ephemeris, so every frame of a run is reproducible from
//! a single 64-bit seed.
//!
//! # Core Principle: Controlled Inputs
//!
//! Every input the compositor consumes is produced here:
//! - **Time**: [`SimClock`] advances only when the runner ticks
//! - **Sun**: [`SimEphemeris`] computes positions, rise/set and seasons
//! - **Sensors**: [`AttitudeFeed`] and [`LocationFeed`] add seeded noise
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ScenarioRunner                         │
//! │                                                             │
//! │  ┌──────────────┐   ┌──────────────┐   ┌────────────────┐   │
//! │  │ AttitudeFeed │   │ LocationFeed │   │   CameraRig    │   │
//! │  │  (ChaCha8)   │   │  (ChaCha8)   │   │  (pinch zoom)  │   │
//! │  └──────┬───────┘   └──────┬───────┘   └───────┬────────┘   │
//! │         │                  │                   │            │
//! │  ┌──────▼──────────────────▼───────────────────▼────────┐   │
//! │  │               OverlayCompositor                      │   │
//! │  │     (SimEphemeris + SimClock + RecordingCanvas)      │   │
//! │  └──────────────────────────┬───────────────────────────┘   │
//! │                             │                               │
//! │                  FrameReport + DrawCommands                 │
//! │                  → checks, SimExport, Rerun                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use heliodos_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let runner = ScenarioRunner::new(42).with_duration(5.0);
//! let result = runner.run(ScenarioId::PolarNight);
//! assert!(result.passed);
//! ```

mod context;
mod ephemeris;
mod error;
mod exporter;
mod feeds;
mod live;
mod runner;
pub mod scenarios;
mod visualizer;

pub use context::SimClock;
pub use ephemeris::{SimEphemeris, HORIZON_ALTITUDE_DEG};
pub use error::SimError;
pub use exporter::{SimEvent, SimExport, SimFrame};
pub use feeds::{derive_seed, AttitudeFeed, LocationFeed};
pub use live::{run_live, LiveConfig, LiveSummary};
pub use runner::{aim_camera, build_feeds, ScenarioMetrics, ScenarioResult, ScenarioRunner, SimConfig};
pub use visualizer::RerunLogger;
