//! User overrides for the observer location and reference time.
//!
//! By default the overlay follows the device's location fix and the wall
//! clock. Either can be pinned to a manual value, e.g. to preview the sun's
//! path at a holiday destination.

use crate::error::Result;
use heliodos_env::{Observer, ObserverFix, ReferenceClock, Timestamp};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Where the observer tuple comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverSettings {
    /// Follow the device's location fix (default: true)
    pub use_device_location: bool,

    /// Manual latitude in degrees, [-90, 90]
    pub manual_latitude_deg: Option<f64>,

    /// Manual longitude in degrees, [-180, 180]
    pub manual_longitude_deg: Option<f64>,

    /// Manual altitude in meters (default: 0)
    pub manual_altitude_m: Option<f64>,

    /// Follow the reference clock (default: true)
    pub use_current_time: bool,

    /// Pinned reference time
    pub manual_time: Option<Timestamp>,
}

impl Default for ObserverSettings {
    fn default() -> Self {
        Self {
            use_device_location: true,
            manual_latitude_deg: None,
            manual_longitude_deg: None,
            manual_altitude_m: None,
            use_current_time: true,
            manual_time: None,
        }
    }
}

impl ObserverSettings {
    /// Settings pinned to a manual location, following the clock.
    pub fn manual_location(latitude_deg: f64, longitude_deg: f64, altitude_m: f64) -> Self {
        Self {
            use_device_location: false,
            manual_latitude_deg: Some(latitude_deg),
            manual_longitude_deg: Some(longitude_deg),
            manual_altitude_m: Some(altitude_m),
            ..Self::default()
        }
    }

    pub fn with_manual_time(mut self, time: Timestamp) -> Self {
        self.use_current_time = false;
        self.manual_time = Some(time);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Combines the settings with the live inputs into an observer tuple.
    ///
    /// # Returns
    /// * `Ok(Some(fix))` - a location is known
    /// * `Ok(None)` - the selected location source has nothing yet
    /// * `Err(_)` - manual coordinates are out of range
    pub fn resolve(&self, live_observer: Option<Observer>, clock: &dyn ReferenceClock) -> Result<Option<ObserverFix>> {
        let observer = if self.use_device_location {
            live_observer
        } else {
            match (self.manual_latitude_deg, self.manual_longitude_deg) {
                (Some(lat), Some(lon)) => Some(Observer::new(lat, lon, self.manual_altitude_m.unwrap_or(0.0))?),
                _ => {
                    debug!("Manual location selected but not entered");
                    None
                }
            }
        };

        let reference_time = match (self.use_current_time, self.manual_time) {
            (false, Some(time)) => time,
            _ => clock.now(),
        };

        Ok(observer.map(|observer| ObserverFix::new(observer, reference_time)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use chrono::{TimeZone, Utc};
    use heliodos_env::{EnvError, FixedClock};

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap())
    }

    #[test]
    fn test_default_follows_device_and_clock() {
        let settings = ObserverSettings::default();
        let live = Observer::new(51.5, -0.1, 20.0).unwrap();

        let fix = settings.resolve(Some(live), &clock()).unwrap().unwrap();
        assert_eq!(fix.observer, live);
        assert_eq!(fix.reference_time, clock().0);

        assert_eq!(settings.resolve(None, &clock()).unwrap(), None);
    }

    #[test]
    fn test_manual_location_ignores_device() {
        let settings = ObserverSettings::manual_location(-33.9, 18.4, 5.0);
        let live = Observer::new(51.5, -0.1, 20.0).unwrap();

        let fix = settings.resolve(Some(live), &clock()).unwrap().unwrap();
        assert_eq!(fix.observer, Observer::new(-33.9, 18.4, 5.0).unwrap());
    }

    #[test]
    fn test_manual_location_validated() {
        let settings = ObserverSettings::manual_location(100.0, 0.0, 0.0);
        assert!(matches!(
            settings.resolve(None, &clock()),
            Err(CoreError::Env(EnvError::InvalidObserver(_)))
        ));
    }

    #[test]
    fn test_manual_location_not_entered() {
        let settings = ObserverSettings {
            use_device_location: false,
            ..ObserverSettings::default()
        };
        let live = Observer::new(51.5, -0.1, 20.0).unwrap();
        assert_eq!(settings.resolve(Some(live), &clock()).unwrap(), None);
    }

    #[test]
    fn test_manual_time() {
        let pinned = Utc.with_ymd_and_hms(2024, 12, 21, 12, 0, 0).unwrap();
        let settings = ObserverSettings::manual_location(0.0, 0.0, 0.0).with_manual_time(pinned);
        let fix = settings.resolve(None, &clock()).unwrap().unwrap();
        assert_eq!(fix.reference_time, pinned);

        // Manual time requested but never set: fall back to the clock
        let unset = ObserverSettings {
            use_current_time: false,
            ..ObserverSettings::manual_location(0.0, 0.0, 0.0)
        };
        assert_eq!(unset.resolve(None, &clock()).unwrap().unwrap().reference_time, clock().0);
    }

    #[test]
    fn test_json_round_trip_with_defaults() {
        let settings = ObserverSettings::from_json_str(
            r#"{"use_device_location": false, "manual_latitude_deg": 47.4, "manual_longitude_deg": 8.5}"#,
        )
        .unwrap();

        assert!(settings.use_current_time);
        assert_eq!(settings.manual_altitude_m, None);
        let fix = settings.resolve(None, &clock()).unwrap().unwrap();
        assert_eq!(fix.observer.altitude_m(), 0.0);
    }
}
