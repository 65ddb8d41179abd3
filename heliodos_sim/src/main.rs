//! Heliodos Simulator CLI
//!
//! Run deterministic overlay scenarios, export recorded frames, or drive the
//! overlay from live async feeds.

use clap::Parser;
use heliodos_core::{CameraRig, OverlayCompositor, OverlayConfig};
use heliodos_env::{ReferenceClock, SystemClock};
use heliodos_sim::scenarios::ScenarioId;
use heliodos_sim::{
    aim_camera, build_feeds, run_live, LiveConfig, RerunLogger, ScenarioResult, ScenarioRunner, SimConfig,
    SimEphemeris, SimError,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Heliodos overlay simulation CLI
#[derive(Parser, Debug)]
#[command(name = "heliodos-sim")]
#[command(about = "Run deterministic simulations of the Heliodos sun overlay", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Scenario to run (northern_summer, polar_night, late_fix, ..., all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Simulated duration in seconds
    #[arg(short, long, default_value = "10")]
    duration: f64,

    /// Render ticks per simulated second
    #[arg(long, default_value = "30")]
    tick_rate: u32,

    /// Overlay configuration JSON file
    #[arg(short, long)]
    config: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export recorded frames to a JSON file
    #[arg(long)]
    export: Option<String>,

    /// Stream the exported frames to a Rerun viewer
    #[arg(long)]
    rerun: bool,

    /// Drive the scenario from async feeds in real time instead of virtual time
    #[arg(long)]
    live: bool,
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { "debug" } else { "info" };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    if !args.json {
        info!("Heliodos Simulator v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    // Parse scenarios
    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        vec![args.scenario.parse().unwrap_or_else(|e: SimError| {
            eprintln!("Error: {}", e);
            let names: Vec<_> = ScenarioId::all().iter().map(|s| s.name()).collect();
            eprintln!("Available scenarios: {}, all", names.join(", "));
            std::process::exit(1);
        })]
    };

    // Determine base seed
    let seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    } else {
        args.seed
    };

    let overlay = match &args.config {
        Some(path) => OverlayConfig::from_json_file(path).unwrap_or_else(|e| {
            eprintln!("Error: failed to load {}: {}", path, e);
            std::process::exit(1);
        }),
        None => OverlayConfig::default(),
    };

    if args.live {
        if scenarios.len() > 1 {
            eprintln!("Error: --live only supports a single scenario, not 'all'");
            std::process::exit(1);
        }
        if let Err(e) = run_live_scenario(scenarios[0], seed, args.duration, overlay, args.json) {
            error!("✗ live run failed: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let runner = ScenarioRunner::new(seed)
        .with_config(SimConfig {
            overlay,
            ..SimConfig::default()
        })
        .with_duration(args.duration)
        .with_tick_rate(args.tick_rate);

    // Handle --export mode
    if let Some(export_path) = &args.export {
        if scenarios.len() > 1 {
            eprintln!("Error: --export only supports a single scenario, not 'all'");
            std::process::exit(1);
        }

        info!("Running with export to: {}", export_path);
        let (result, export) = runner.run_recorded(scenarios[0]);

        match export.write_to_file(export_path) {
            Ok(()) => info!("Exported {} frames to {}", export.frames.len(), export_path),
            Err(e) => error!("Failed to write export: {}", e),
        }
        if args.rerun {
            RerunLogger::new("heliodos-sim").log_export(&export);
        }

        report(&result);
        if !result.passed {
            std::process::exit(1);
        }
        return;
    }

    // Run simulations
    let mut all_results: Vec<ScenarioResult> = Vec::new();
    let logger = if args.rerun { RerunLogger::new("heliodos-sim") } else { RerunLogger::disabled() };
    for scenario in &scenarios {
        let result = if logger.is_enabled() {
            let (result, export) = runner.run_recorded(*scenario);
            logger.log_export(&export);
            result
        } else {
            runner.run(*scenario)
        };

        if !args.json {
            report(&result);
        }
        all_results.push(result);
    }

    // Summary
    let total = all_results.len();
    let failed_count = all_results.iter().filter(|r| !r.passed).count();
    let passed = total - failed_count;

    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": passed,
            "failed": failed_count,
            "results": all_results,
        });
        println!("{}", serde_json::to_string_pretty(&summary).unwrap_or_default());
    } else {
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        if failed_count == 0 {
            info!("✅ All {} scenario runs passed!", total);
        } else {
            error!("❌ {}/{} scenario runs failed!", failed_count, total);
            for result in all_results.iter().filter(|r| !r.passed) {
                error!(
                    "  - {} seed={}: {}",
                    result.scenario.name(),
                    result.seed,
                    result.failure_reason.as_deref().unwrap_or("unknown")
                );
            }
        }
    }

    if failed_count > 0 {
        std::process::exit(1);
    }
}

fn report(result: &ScenarioResult) {
    if result.passed {
        info!(
            "✓ {} (seed={}) PASSED | frames={} segments={} marker={}",
            result.scenario.name(),
            result.seed,
            result.metrics.frames,
            result.metrics.segments_drawn,
            result.metrics.marker_frames
        );
    } else {
        error!(
            "✗ {} (seed={}) FAILED: {}",
            result.scenario.name(),
            result.seed,
            result.failure_reason.as_deref().unwrap_or("unknown")
        );
    }
}

/// Runs one scenario's observer and camera aim from async feeds on the wall clock.
fn run_live_scenario(
    scenario: ScenarioId,
    seed: u64,
    duration: f64,
    overlay: OverlayConfig,
    json: bool,
) -> Result<(), SimError> {
    let setup = scenario.setup()?;
    let ephemeris = Arc::new(SimEphemeris::new().with_declination_deg(setup.declination_deg));
    let compositor = Arc::new(OverlayCompositor::new(Arc::clone(&ephemeris)).with_config(overlay)?);

    let rig = CameraRig::from_characteristics(setup.cameras.clone());
    compositor.configure_camera_from(&rig);
    compositor.set_viewport_size(setup.viewport.0, setup.viewport.1);

    let clock: Arc<dyn ReferenceClock> = Arc::new(SystemClock::new());
    let view = aim_camera(&setup, &ephemeris, clock.as_ref())?;
    let (attitude, location) = build_feeds(&setup, view, seed, duration, &SimConfig::default());

    let config = LiveConfig::for_duration_secs(duration)?;

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    let summary = runtime.block_on(run_live(compositor, attitude, location, clock, config))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        info!(
            "✓ {} live: frames={} active={} marker={} attitude_updates={} location_updates={}",
            scenario.name(),
            summary.frames,
            summary.active_frames,
            summary.marker_frames,
            summary.attitude_updates,
            summary.location_updates
        );
    }
    Ok(())
}
