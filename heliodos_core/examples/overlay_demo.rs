//! Overlay Demo - One Frame, Step by Step
//! ======================================
//!
//! Demonstrates:
//! - Configuring the camera model from raw hardware characteristics
//! - Pushing attitude and location updates into the compositor
//! - The AwaitingData → Active transition
//! - Reading back the recorded draw calls and the frame report
//!
//! Uses a toy sun that rises due east at 06:00 UTC, culminates due south at
//! 60° and sets due west at 18:00. The simulation crate has a real model.
//!
//! Run:
//! ```bash
//! cargo run --example overlay_demo
//! ```

use std::f64::consts::PI;
use std::sync::Arc;

use chrono::{TimeZone, Timelike, Utc};
use heliodos_core::{
    AttitudeMatrix, CameraRig, DrawCommand, OverlayCompositor, PathOutcome, RecordingCanvas,
};
use heliodos_env::{
    Body, CameraCharacteristics, Ephemeris, HorizonPosition, LensFacing, Observer, RiseSet, Solstices,
    Timestamp,
};

struct ToySun;

impl Ephemeris for ToySun {
    fn azimuth_altitude_at(&self, _body: Body, time: Timestamp, _observer: &Observer) -> HorizonPosition {
        let hours = time.hour() as f64 + time.minute() as f64 / 60.0;
        let frac = (hours - 6.0) / 12.0;
        HorizonPosition::new((90.0 + 180.0 * frac).to_radians(), 60f64.to_radians() * (PI * frac).sin())
    }

    fn magnetic_declination_at(&self, _observer: &Observer, _time: Timestamp) -> f64 {
        2f64.to_radians()
    }

    fn sunrise_sunset_around(&self, time: Timestamp, _observer: &Observer) -> Option<RiseSet> {
        let day = time.date_naive();
        Some(RiseSet {
            sunrise: day.and_hms_opt(6, 0, 0)?.and_utc(),
            sunset: day.and_hms_opt(18, 0, 0)?.and_utc(),
        })
    }

    fn solstices_of(&self, year: i32) -> Solstices {
        Solstices {
            june: Utc.with_ymd_and_hms(year, 6, 21, 12, 0, 0).unwrap(),
            december: Utc.with_ymd_and_hms(year, 12, 21, 12, 0, 0).unwrap(),
        }
    }

    fn march_equinox_of(&self, year: i32) -> Timestamp {
        Utc.with_ymd_and_hms(year, 3, 20, 12, 0, 0).unwrap()
    }
}

fn main() {
    println!("☀️  Heliodos Overlay Demo");
    println!("========================\n");

    // A phone with a main and an ultra-wide camera; the ultra-wide reports
    // no sensor size and falls back to defaults.
    let mut rig = CameraRig::from_characteristics(vec![
        CameraCharacteristics {
            id: "main".to_string(),
            lens_facing: LensFacing::Back,
            focal_lengths_mm: vec![5.4],
            physical_size_mm: Some((6.4, 4.8)),
            pixel_array_size: Some((4032, 3024)),
            sensor_orientation_deg: Some(90),
            logical_multi_camera: false,
        },
        CameraCharacteristics {
            focal_lengths_mm: vec![2.2],
            ..CameraCharacteristics::unreported("ultrawide")
        },
    ]);
    println!("📷 Cameras (widest first): {:?}", rig.cameras().iter().map(|c| &c.id).collect::<Vec<_>>());

    rig.begin_zoom();
    println!("   Pinch out → {:?}", rig.zoom(1.25));

    let compositor = OverlayCompositor::new(Arc::new(ToySun));
    compositor.configure_camera_from(&rig);
    compositor.set_viewport_size(1080, 1920);
    compositor.set_attitude(AttitudeMatrix::pointing(HorizonPosition::from_degrees(178.0, 45.0), 0.0));

    let mut canvas = RecordingCanvas::new();
    let report = compositor.render(&mut canvas);
    println!("\n⏳ Before location fix: {:?}", report.state);
    for cmd in canvas.take() {
        if let DrawCommand::Text { text, .. } = cmd {
            println!("   Placeholder: \"{}\"", text);
        }
    }

    let noon = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
    if let Err(e) = compositor.set_observer(47.37, 8.54, 408.0, noon) {
        eprintln!("❌ Rejected observer: {}", e);
        return;
    }

    let report = compositor.render(&mut canvas);
    println!("\n🛰️  After location fix: {:?}", report.state);
    for path in &report.paths {
        match &path.outcome {
            PathOutcome::Drawn { visible_samples, segments } => println!(
                "   {:<18} {:>2} visible samples, {:>2} segments",
                path.kind.name(),
                visible_samples,
                segments
            ),
            other => println!("   {:<18} skipped ({:?})", path.kind.name(), other),
        }
    }
    match report.sun_marker {
        Some(p) => println!("   Sun marker at ({:.1}, {:.1})", p.x, p.y),
        None => println!("   Sun is behind the camera"),
    }

    println!("\n✅ {} draw calls recorded", canvas.len());
}
