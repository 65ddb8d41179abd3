//! Low-precision analytic solar ephemeris.
//!
//! Implements [`Ephemeris`] with the NOAA solar position equations (good to
//! about 0.01° for the sun within a few centuries of J2000), Bennett
//! refraction, and Meeus' mean equinox/solstice series refined against the
//! apparent solar longitude. Rise and set instants are found by scanning the
//! geometric altitude against the standard -0.8333° horizon.
//!
//! Magnetic declination is a per-instance constant; the harness picks a
//! plausible value per scenario.

use chrono::{DateTime, Duration, Utc};
use heliodos_env::{Body, Ephemeris, HorizonPosition, Observer, RiseSet, Solstices, Timestamp};
use std::f64::consts::TAU;
use tracing::trace;

/// Geometric altitude of the sun's center at rise/set (refraction plus semi-diameter).
pub const HORIZON_ALTITUDE_DEG: f64 = -0.8333;

/// Julian date of the Unix epoch.
const JD_UNIX_EPOCH: f64 = 2_440_587.5;

/// Julian date of J2000.0.
const JD_J2000: f64 = 2_451_545.0;

/// Coarse step of the rise/set scan.
const SCAN_STEP_MINUTES: i64 = 10;

/// Bisection stops once the bracket is this narrow.
const BISECT_RESOLUTION_SECS: i64 = 1;

/// Simulation ephemeris for the sun.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimEphemeris {
    /// Magnetic declination in radians, east positive
    declination: f64,
}

impl SimEphemeris {
    /// Ephemeris with zero magnetic declination.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the constant magnetic declination, in degrees east.
    pub fn with_declination_deg(mut self, degrees: f64) -> Self {
        self.declination = degrees.to_radians();
        self
    }

    /// Geometric (unrefracted) horizon position of the sun.
    pub fn geometric_position(&self, time: Timestamp, observer: &Observer) -> HorizonPosition {
        let jd = julian_date(time);
        let (ra, dec) = sun_equatorial(jd);

        let lat = observer.latitude_deg().to_radians();
        let lst = greenwich_sidereal_deg(jd).to_radians() + observer.longitude_deg().to_radians();
        let hour_angle = lst - ra;

        let altitude = (lat.sin() * dec.sin() + lat.cos() * dec.cos() * hour_angle.cos()).asin();
        let azimuth = (-hour_angle.sin() * dec.cos())
            .atan2(lat.cos() * dec.sin() - lat.sin() * dec.cos() * hour_angle.cos())
            .rem_euclid(TAU);

        HorizonPosition::new(azimuth, altitude)
    }

    /// Signed distance of the sun above the rise/set horizon, in degrees.
    fn above_horizon_deg(&self, time: Timestamp, observer: &Observer) -> f64 {
        self.geometric_position(time, observer).altitude.to_degrees() - HORIZON_ALTITUDE_DEG
    }

    /// First crossing in `(from, from + span]` in the requested direction.
    fn find_crossing(&self, from: Timestamp, span: Duration, observer: &Observer, rising: bool) -> Option<Timestamp> {
        let step = Duration::minutes(SCAN_STEP_MINUTES);
        let end = from + span;

        let mut t0 = from;
        let mut h0 = self.above_horizon_deg(t0, observer);
        while t0 < end {
            let t1 = (t0 + step).min(end);
            let h1 = self.above_horizon_deg(t1, observer);

            let crossed = if rising { h0 < 0.0 && h1 >= 0.0 } else { h0 >= 0.0 && h1 < 0.0 };
            if crossed {
                return Some(self.bisect(t0, t1, observer, rising));
            }

            t0 = t1;
            h0 = h1;
        }
        None
    }

    fn bisect(&self, mut lo: Timestamp, mut hi: Timestamp, observer: &Observer, rising: bool) -> Timestamp {
        while (hi - lo).num_seconds() > BISECT_RESOLUTION_SECS {
            let mid = lo + (hi - lo) / 2;
            let above = self.above_horizon_deg(mid, observer) >= 0.0;
            if above == rising {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        hi
    }

    /// Equinox or solstice near `jde`, refined until the apparent solar
    /// longitude equals `target_deg`.
    fn refine_season(mut jde: f64, target_deg: f64) -> f64 {
        for _ in 0..4 {
            let lambda = apparent_longitude_deg(jde);
            let correction = 58.0 * (target_deg - lambda).to_radians().sin();
            jde += correction;
            if correction.abs() < 1e-6 {
                break;
            }
        }
        jde
    }
}

impl Ephemeris for SimEphemeris {
    fn azimuth_altitude_at(&self, body: Body, time: Timestamp, observer: &Observer) -> HorizonPosition {
        match body {
            Body::Sun => {
                let geometric = self.geometric_position(time, observer);
                let refraction = refraction_deg(geometric.altitude.to_degrees()).to_radians();
                HorizonPosition::new(geometric.azimuth, geometric.altitude + refraction)
            }
        }
    }

    fn magnetic_declination_at(&self, _observer: &Observer, _time: Timestamp) -> f64 {
        self.declination
    }

    fn sunrise_sunset_around(&self, time: Timestamp, observer: &Observer) -> Option<RiseSet> {
        let sunrise = self.find_crossing(time - Duration::hours(24), Duration::hours(24), observer, true)?;
        let sunset = self.find_crossing(sunrise, Duration::hours(24), observer, false)?;
        trace!("Rise/set around {}: {} .. {}", time, sunrise, sunset);
        Some(RiseSet { sunrise, sunset })
    }

    fn solstices_of(&self, year: i32) -> Solstices {
        let y = (year as f64 - 2000.0) / 1000.0;
        let june = 2_451_716.56767 + 365_241.62603 * y + 0.00325 * y.powi(2) + 0.00888 * y.powi(3)
            - 0.00030 * y.powi(4);
        let december = 2_451_900.05952 + 365_242.74049 * y - 0.06223 * y.powi(2) - 0.00823 * y.powi(3)
            + 0.00032 * y.powi(4);

        Solstices {
            june: from_julian_date(Self::refine_season(june, 90.0)),
            december: from_julian_date(Self::refine_season(december, 270.0)),
        }
    }

    fn march_equinox_of(&self, year: i32) -> Timestamp {
        let y = (year as f64 - 2000.0) / 1000.0;
        let march = 2_451_623.80984 + 365_242.37404 * y + 0.05169 * y.powi(2) - 0.00411 * y.powi(3)
            - 0.00057 * y.powi(4);
        from_julian_date(Self::refine_season(march, 0.0))
    }
}

// ============================================================================
// SOLAR COORDINATES
// ============================================================================

fn julian_date(time: Timestamp) -> f64 {
    time.timestamp_micros() as f64 / 86_400e6 + JD_UNIX_EPOCH
}

fn from_julian_date(jd: f64) -> Timestamp {
    let micros = ((jd - JD_UNIX_EPOCH) * 86_400e6).round() as i64;
    let secs = micros.div_euclid(1_000_000);
    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
    DateTime::<Utc>::from_timestamp(secs, nanos).unwrap_or_default()
}

fn centuries_since_j2000(jd: f64) -> f64 {
    (jd - JD_J2000) / 36_525.0
}

/// Apparent ecliptic longitude of the sun and the longitude of the moon's node, in degrees.
fn apparent_longitude_and_node(jd: f64) -> (f64, f64) {
    let t = centuries_since_j2000(jd);

    let mean_longitude = (280.46646 + t * (36_000.76983 + 0.0003032 * t)).rem_euclid(360.0);
    let mean_anomaly = (357.52911 + t * (35_999.05029 - 0.0001537 * t)).to_radians();
    let center = (1.914602 - t * (0.004817 + 0.000014 * t)) * mean_anomaly.sin()
        + (0.019993 - 0.000101 * t) * (2.0 * mean_anomaly).sin()
        + 0.000289 * (3.0 * mean_anomaly).sin();

    let node = 125.04 - 1934.136 * t;
    let lambda = mean_longitude + center - 0.00569 - 0.00478 * node.to_radians().sin();
    (lambda.rem_euclid(360.0), node)
}

fn apparent_longitude_deg(jd: f64) -> f64 {
    apparent_longitude_and_node(jd).0
}

/// Right ascension and declination of the sun, in radians.
fn sun_equatorial(jd: f64) -> (f64, f64) {
    let t = centuries_since_j2000(jd);
    let (lambda, node) = apparent_longitude_and_node(jd);

    let mean_obliquity = 23.0 + (26.0 + (21.448 - t * (46.815 + t * (0.00059 - t * 0.001813))) / 60.0) / 60.0;
    let obliquity = (mean_obliquity + 0.00256 * node.to_radians().cos()).to_radians();

    let lambda = lambda.to_radians();
    let ra = (obliquity.cos() * lambda.sin()).atan2(lambda.cos());
    let dec = (obliquity.sin() * lambda.sin()).asin();
    (ra, dec)
}

/// Greenwich mean sidereal time in degrees.
fn greenwich_sidereal_deg(jd: f64) -> f64 {
    let t = centuries_since_j2000(jd);
    (280.46061837 + 360.98564736629 * (jd - JD_J2000) + t * t * (0.000387933 - t / 38_710_000.0))
        .rem_euclid(360.0)
}

/// Bennett's atmospheric refraction for a geometric altitude, in degrees.
fn refraction_deg(altitude_deg: f64) -> f64 {
    if altitude_deg < -1.0 {
        return 0.0;
    }
    let arcmin = 1.0 / (altitude_deg + 7.31 / (altitude_deg + 4.4)).to_radians().tan();
    arcmin.max(0.0) / 60.0
}
