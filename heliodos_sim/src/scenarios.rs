//! Simulation scenarios for the overlay pipeline.

use crate::error::SimError;
use chrono::{TimeZone, Utc};
use heliodos_core::ObserverSettings;
use heliodos_env::{CameraCharacteristics, EnvError, HorizonPosition, LensFacing, Observer, Timestamp};

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioId {
    /// SIM-001: Zurich at midsummer, camera on the sun
    NorthernSummer,

    /// SIM-002: Sydney at midsummer, hemisphere color swap
    SouthernSummer,

    /// SIM-003: Tromsø in December, no sunrise
    PolarNight,

    /// SIM-004: Location provider never answers
    AwaitingFix,

    /// SIM-005: Location fix arrives mid-run
    LateFix,

    /// SIM-006: Location fix is lost mid-run
    LostFix,

    /// SIM-007: Rotation sensor silent at start-up
    BlindStart,

    /// SIM-008: Camera pointed at the ground, sun behind
    GroundView,

    /// SIM-009: Pinch switches to the next longer lens
    CameraSwitch,

    /// SIM-010: Manual location and time override the device
    ManualOverride,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::NorthernSummer,
            ScenarioId::SouthernSummer,
            ScenarioId::PolarNight,
            ScenarioId::AwaitingFix,
            ScenarioId::LateFix,
            ScenarioId::LostFix,
            ScenarioId::BlindStart,
            ScenarioId::GroundView,
            ScenarioId::CameraSwitch,
            ScenarioId::ManualOverride,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::NorthernSummer => "northern_summer",
            ScenarioId::SouthernSummer => "southern_summer",
            ScenarioId::PolarNight => "polar_night",
            ScenarioId::AwaitingFix => "awaiting_fix",
            ScenarioId::LateFix => "late_fix",
            ScenarioId::LostFix => "lost_fix",
            ScenarioId::BlindStart => "blind_start",
            ScenarioId::GroundView => "ground_view",
            ScenarioId::CameraSwitch => "camera_switch",
            ScenarioId::ManualOverride => "manual_override",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::NorthernSummer => "Zurich, 21 June morning: all four paths and the marker on screen",
            ScenarioId::SouthernSummer => "Sydney, 21 December: June path in winter blue, December in summer red",
            ScenarioId::PolarNight => "Tromsø, 21 December: solstice and current-day paths skipped, equinox drawn",
            ScenarioId::AwaitingFix => "No location ever: placeholder only, never an empty overlay",
            ScenarioId::LateFix => "Location arrives at 40%: one AwaitingData -> Active transition",
            ScenarioId::LostFix => "Location lost at 60%: one Active -> AwaitingData transition",
            ScenarioId::BlindStart => "No attitude for the first 30%: blank frames, then the full overlay",
            ScenarioId::GroundView => "Camera aimed at the ground: sun behind, marker never drawn",
            ScenarioId::CameraSwitch => "Pinch out at 50%: switch to the longer lens, marker kept",
            ScenarioId::ManualOverride => "Device silent, manual Cape Town location and time drive the overlay",
        }
    }

    /// Initial conditions and sensor schedule of the scenario.
    pub fn setup(&self) -> Result<ScenarioSetup, SimError> {
        let zurich_morning = utc(2024, 6, 21, 9, 0);
        let base = ScenarioSetup::new(zurich()?, zurich_morning).with_declination_deg(3.2);

        let setup = match self {
            ScenarioId::NorthernSummer => base,
            ScenarioId::SouthernSummer => ScenarioSetup::new(sydney()?, utc(2024, 12, 21, 2, 0)).with_declination_deg(12.8),
            ScenarioId::PolarNight => ScenarioSetup {
                view: ViewTarget::Fixed(HorizonPosition::from_degrees(180.0, 5.0)),
                ..ScenarioSetup::new(tromso()?, utc(2024, 12, 21, 11, 0)).with_declination_deg(8.5)
            },
            ScenarioId::AwaitingFix => ScenarioSetup { fix_from: None, ..base },
            ScenarioId::LateFix => ScenarioSetup { fix_from: Some(0.4), ..base },
            ScenarioId::LostFix => ScenarioSetup { fix_lost_at: Some(0.6), ..base },
            ScenarioId::BlindStart => ScenarioSetup { attitude_from: 0.3, ..base },
            ScenarioId::GroundView => ScenarioSetup {
                view: ViewTarget::Fixed(HorizonPosition::from_degrees(0.0, -70.0)),
                ..base
            },
            ScenarioId::CameraSwitch => ScenarioSetup {
                cameras: phone_cameras(),
                pinch_at: Some(0.5),
                ..base
            },
            ScenarioId::ManualOverride => ScenarioSetup {
                fix_from: None,
                settings: ObserverSettings::manual_location(-33.9249, 18.4241, 10.0)
                    .with_manual_time(utc(2024, 12, 21, 10, 0)),
                ..base
            },
        };
        Ok(setup)
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "northern_summer" | "northernsummer" | "sim-001" => Ok(ScenarioId::NorthernSummer),
            "southern_summer" | "southernsummer" | "sim-002" => Ok(ScenarioId::SouthernSummer),
            "polar_night" | "polarnight" | "sim-003" => Ok(ScenarioId::PolarNight),
            "awaiting_fix" | "awaitingfix" | "sim-004" => Ok(ScenarioId::AwaitingFix),
            "late_fix" | "latefix" | "sim-005" => Ok(ScenarioId::LateFix),
            "lost_fix" | "lostfix" | "sim-006" => Ok(ScenarioId::LostFix),
            "blind_start" | "blindstart" | "sim-007" => Ok(ScenarioId::BlindStart),
            "ground_view" | "groundview" | "sim-008" => Ok(ScenarioId::GroundView),
            "camera_switch" | "cameraswitch" | "sim-009" => Ok(ScenarioId::CameraSwitch),
            "manual_override" | "manualoverride" | "sim-010" => Ok(ScenarioId::ManualOverride),
            _ => Err(SimError::UnknownScenario(s.to_string())),
        }
    }
}

// ============================================================================
// SETUP
// ============================================================================

/// Where the camera is held.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewTarget {
    /// At the sun's magnetic position for the first frame's observer fix
    Sun,

    /// At a fixed magnetic horizon position
    Fixed(HorizonPosition),
}

/// Initial conditions of a scenario.
///
/// Schedule entries are fractions of the run duration.
#[derive(Debug, Clone)]
pub struct ScenarioSetup {
    /// Reference clock at virtual time 0
    pub start: Timestamp,

    /// What the location provider reports
    pub observer: Observer,

    pub declination_deg: f64,
    pub view: ViewTarget,
    pub settings: ObserverSettings,

    /// Attitude readings begin at this fraction
    pub attitude_from: f64,

    /// Location fixes begin at this fraction (`None`: never)
    pub fix_from: Option<f64>,

    /// Location fixes stop at this fraction
    pub fix_lost_at: Option<f64>,

    /// A pinch-out gesture happens at this fraction
    pub pinch_at: Option<f64>,

    /// Everything the camera service reports
    pub cameras: Vec<CameraCharacteristics>,

    /// Preview size in portrait (width, height)
    pub viewport: (i32, i32),
}

impl ScenarioSetup {
    /// Observer fixed from the start, camera on the sun, one main camera.
    pub fn new(observer: Observer, start: Timestamp) -> Self {
        Self {
            start,
            observer,
            declination_deg: 0.0,
            view: ViewTarget::Sun,
            settings: ObserverSettings::default(),
            attitude_from: 0.0,
            fix_from: Some(0.0),
            fix_lost_at: None,
            pinch_at: None,
            cameras: vec![main_camera()],
            viewport: (1080, 1920),
        }
    }

    pub fn with_declination_deg(mut self, degrees: f64) -> Self {
        self.declination_deg = degrees;
        self
    }
}

fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Timestamp {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .unwrap_or_default()
}

fn zurich() -> Result<Observer, EnvError> {
    Observer::new(47.3769, 8.5417, 408.0)
}

fn sydney() -> Result<Observer, EnvError> {
    Observer::new(-33.8688, 151.2093, 58.0)
}

fn tromso() -> Result<Observer, EnvError> {
    Observer::new(69.6496, 18.956, 10.0)
}

fn main_camera() -> CameraCharacteristics {
    CameraCharacteristics {
        id: "0".to_string(),
        lens_facing: LensFacing::Back,
        focal_lengths_mm: vec![5.4],
        physical_size_mm: Some((6.4, 4.8)),
        pixel_array_size: Some((4032, 3024)),
        sensor_orientation_deg: Some(90),
        logical_multi_camera: false,
    }
}

/// Front camera, logical multi-camera, ultra-wide, main and tele.
fn phone_cameras() -> Vec<CameraCharacteristics> {
    vec![
        CameraCharacteristics {
            lens_facing: LensFacing::Front,
            focal_lengths_mm: vec![2.7],
            ..CameraCharacteristics::unreported("1")
        },
        CameraCharacteristics {
            logical_multi_camera: true,
            ..main_camera()
        },
        CameraCharacteristics {
            id: "2".to_string(),
            focal_lengths_mm: vec![2.2],
            physical_size_mm: Some((5.6, 4.2)),
            pixel_array_size: Some((4000, 3000)),
            ..main_camera()
        },
        CameraCharacteristics {
            id: "3".to_string(),
            ..main_camera()
        },
        CameraCharacteristics {
            id: "4".to_string(),
            focal_lengths_mm: vec![9.0],
            physical_size_mm: None,
            pixel_array_size: None,
            ..main_camera()
        },
    ]
}
