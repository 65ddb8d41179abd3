//! Common types shared across the Heliodos boundary.

use crate::error::EnvError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An instant in time. All collaborators exchange UTC instants.
pub type Timestamp = DateTime<Utc>;

/// A celestial body the overlay can track.
///
/// Only the sun is tracked today; the ephemeris interface is keyed by body so
/// additional bodies do not change any signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Body {
    Sun,
}

/// Geographic position of the observer.
///
/// Construct through [`Observer::new`], which rejects coordinates outside
/// latitude [-90, 90] and longitude [-180, 180].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ObserverRepr")]
pub struct Observer {
    /// Latitude in degrees, positive north
    latitude_deg: f64,

    /// Longitude in degrees, positive east
    longitude_deg: f64,

    /// Height above the reference ellipsoid in meters
    altitude_m: f64,
}

impl Observer {
    /// Creates a validated observer.
    pub fn new(latitude_deg: f64, longitude_deg: f64, altitude_m: f64) -> Result<Self, EnvError> {
        if !latitude_deg.is_finite() || !(-90.0..=90.0).contains(&latitude_deg) {
            return Err(EnvError::invalid_observer(format!(
                "latitude {} outside [-90, 90]",
                latitude_deg
            )));
        }
        if !longitude_deg.is_finite() || !(-180.0..=180.0).contains(&longitude_deg) {
            return Err(EnvError::invalid_observer(format!(
                "longitude {} outside [-180, 180]",
                longitude_deg
            )));
        }
        if !altitude_m.is_finite() {
            return Err(EnvError::invalid_observer("altitude is not finite"));
        }

        Ok(Self {
            latitude_deg,
            longitude_deg,
            altitude_m,
        })
    }

    pub fn latitude_deg(&self) -> f64 {
        self.latitude_deg
    }

    pub fn longitude_deg(&self) -> f64 {
        self.longitude_deg
    }

    pub fn altitude_m(&self) -> f64 {
        self.altitude_m
    }

    /// True for observers on or north of the equator.
    pub fn is_northern(&self) -> bool {
        self.latitude_deg >= 0.0
    }
}

/// Unvalidated wire shape of [`Observer`]; deserialization goes through
/// [`Observer::new`].
#[derive(Deserialize)]
struct ObserverRepr {
    latitude_deg: f64,
    longitude_deg: f64,
    #[serde(default)]
    altitude_m: f64,
}

impl TryFrom<ObserverRepr> for Observer {
    type Error = EnvError;

    fn try_from(repr: ObserverRepr) -> Result<Self, Self::Error> {
        Observer::new(repr.latitude_deg, repr.longitude_deg, repr.altitude_m)
    }
}

/// The observer tuple supplied on every location/time update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObserverFix {
    pub observer: Observer,

    /// The instant the overlay is drawn for (usually "now")
    pub reference_time: Timestamp,
}

impl ObserverFix {
    pub fn new(observer: Observer, reference_time: Timestamp) -> Self {
        Self {
            observer,
            reference_time,
        }
    }
}

/// Horizon-relative direction.
///
/// Azimuth is measured in radians clockwise from north (east = +π/2);
/// altitude in radians above the horizon (zenith = +π/2).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HorizonPosition {
    pub azimuth: f64,
    pub altitude: f64,
}

impl HorizonPosition {
    pub fn new(azimuth: f64, altitude: f64) -> Self {
        Self { azimuth, altitude }
    }

    /// Builds a position from degrees, for readability at call sites.
    pub fn from_degrees(azimuth_deg: f64, altitude_deg: f64) -> Self {
        Self {
            azimuth: azimuth_deg.to_radians(),
            altitude: altitude_deg.to_radians(),
        }
    }

    /// Returns the same altitude with the azimuth rotated by `-offset`.
    ///
    /// Used to convert a true-north azimuth into a magnetic-north azimuth by
    /// subtracting the local declination.
    pub fn with_azimuth_offset(self, offset: f64) -> Self {
        Self {
            azimuth: self.azimuth - offset,
            altitude: self.altitude,
        }
    }
}

/// Sunrise and the sunset that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiseSet {
    pub sunrise: Timestamp,
    pub sunset: Timestamp,
}

/// The two solstice instants of a calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solstices {
    pub june: Timestamp,
    pub december: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_observer_accepts_valid_range() {
        assert!(Observer::new(90.0, 180.0, 0.0).is_ok());
        assert!(Observer::new(-90.0, -180.0, -400.0).is_ok());
    }

    #[test]
    fn test_observer_rejects_out_of_range() {
        assert!(matches!(
            Observer::new(91.0, 0.0, 0.0),
            Err(EnvError::InvalidObserver(_))
        ));
        assert!(Observer::new(0.0, 180.5, 0.0).is_err());
        assert!(Observer::new(f64::NAN, 0.0, 0.0).is_err());
        assert!(Observer::new(0.0, 0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_hemisphere() {
        assert!(Observer::new(0.0, 0.0, 0.0).unwrap().is_northern());
        assert!(!Observer::new(-0.1, 0.0, 0.0).unwrap().is_northern());
    }

    #[test]
    fn test_azimuth_offset_subtracts() {
        let pos = HorizonPosition::from_degrees(180.0, 30.0);
        let magnetic = pos.with_azimuth_offset(10f64.to_radians());

        assert_relative_eq!(magnetic.azimuth.to_degrees(), 170.0, epsilon = 1e-9);
        assert_relative_eq!(magnetic.altitude, pos.altitude);
    }

    #[test]
    fn test_observer_deserialization_is_validated() {
        let observer: Observer =
            serde_json::from_str(r#"{"latitude_deg": 47.37, "longitude_deg": 8.54}"#).unwrap();
        assert_relative_eq!(observer.altitude_m(), 0.0);

        let bad = serde_json::from_str::<Observer>(r#"{"latitude_deg": 123.0, "longitude_deg": 8.54}"#);
        assert!(bad.is_err());
    }
}
