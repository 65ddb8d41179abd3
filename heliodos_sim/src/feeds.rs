//! Seeded sensor feeds.
//!
//! Stand-ins for the rotation-vector sensor and the location provider. Each
//! feed owns a ChaCha8 stream seeded from the scenario seed, so the same seed
//! replays the same noise.

use heliodos_core::AttitudeMatrix;
use heliodos_env::{HorizonPosition, Observer};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::TAU;

/// Derives an independent stream seed from the scenario seed.
pub fn derive_seed(seed: u64, stream: u64) -> u64 {
    seed.wrapping_mul(0x9e3779b97f4a7c15).wrapping_add(stream)
}

/// Phone orientation feed.
///
/// The camera looks at `view`, slowly panning left and right by
/// `pan_amplitude` over `pan_period_secs`, with Gaussian hand tremor on
/// every reading.
#[derive(Debug, Clone)]
pub struct AttitudeFeed {
    rng: ChaCha8Rng,
    tremor: Option<Normal<f64>>,
    view: HorizonPosition,
    roll: f64,
    pan_amplitude: f64,
    pan_period_secs: f64,
    available_from_secs: f64,
}

impl AttitudeFeed {
    /// Steady feed looking at `view`, available immediately.
    pub fn new(seed: u64, view: HorizonPosition) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            tremor: None,
            view,
            roll: 0.0,
            pan_amplitude: 0.0,
            pan_period_secs: 1.0,
            available_from_secs: 0.0,
        }
    }

    /// Standard deviation of the per-axis tremor, in degrees.
    pub fn with_tremor_deg(mut self, std_dev_deg: f64) -> Self {
        self.tremor = Normal::new(0.0, std_dev_deg.abs().to_radians()).ok();
        self
    }

    pub fn with_pan(mut self, amplitude_deg: f64, period_secs: f64) -> Self {
        self.pan_amplitude = amplitude_deg.to_radians();
        self.pan_period_secs = period_secs.max(f64::EPSILON);
        self
    }

    pub fn with_roll_deg(mut self, roll_deg: f64) -> Self {
        self.roll = roll_deg.to_radians();
        self
    }

    /// The sensor produces nothing before `secs`.
    pub fn available_from(mut self, secs: f64) -> Self {
        self.available_from_secs = secs;
        self
    }

    pub fn view(&self) -> HorizonPosition {
        self.view
    }

    /// Reading at `elapsed_secs`, or `None` while the sensor is silent.
    pub fn sample(&mut self, elapsed_secs: f64) -> Option<AttitudeMatrix> {
        if elapsed_secs < self.available_from_secs {
            return None;
        }

        let pan = self.pan_amplitude * (TAU * elapsed_secs / self.pan_period_secs).sin();
        let (d_az, d_alt, d_roll) = match &self.tremor {
            Some(normal) => (
                normal.sample(&mut self.rng),
                normal.sample(&mut self.rng),
                normal.sample(&mut self.rng),
            ),
            None => (0.0, 0.0, 0.0),
        };

        let view = HorizonPosition::new(self.view.azimuth + pan + d_az, self.view.altitude + d_alt);
        Some(AttitudeMatrix::pointing(view, self.roll + d_roll))
    }
}

/// Location provider feed.
///
/// Reports `observer` with Gaussian position noise between
/// `available_from_secs` and `lost_at_secs`.
#[derive(Debug, Clone)]
pub struct LocationFeed {
    rng: ChaCha8Rng,
    noise: Option<Normal<f64>>,
    observer: Observer,
    available_from_secs: Option<f64>,
    lost_at_secs: Option<f64>,
}

impl LocationFeed {
    /// Feed that reports `observer` from the start and never loses it.
    pub fn new(seed: u64, observer: Observer) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            noise: None,
            observer,
            available_from_secs: Some(0.0),
            lost_at_secs: None,
        }
    }

    /// Feed that never produces a fix.
    pub fn silent(seed: u64, observer: Observer) -> Self {
        Self {
            available_from_secs: None,
            ..Self::new(seed, observer)
        }
    }

    /// Horizontal position noise, in meters (1σ).
    pub fn with_noise_m(mut self, std_dev_m: f64) -> Self {
        // One degree of latitude is about 111 km
        self.noise = Normal::new(0.0, std_dev_m.abs() / 111_000.0).ok();
        self
    }

    pub fn available_from(mut self, secs: f64) -> Self {
        self.available_from_secs = Some(secs);
        self
    }

    pub fn lost_at(mut self, secs: f64) -> Self {
        self.lost_at_secs = Some(secs);
        self
    }

    pub fn observer(&self) -> Observer {
        self.observer
    }

    /// Fix at `elapsed_secs`, or `None` while no fix is available.
    pub fn sample(&mut self, elapsed_secs: f64) -> Option<Observer> {
        let from = self.available_from_secs?;
        if elapsed_secs < from || self.lost_at_secs.is_some_and(|lost| elapsed_secs >= lost) {
            return None;
        }

        let Some(normal) = &self.noise else {
            return Some(self.observer);
        };
        let (d_lat, d_lon) = (normal.sample(&mut self.rng), normal.sample(&mut self.rng));

        let lat = (self.observer.latitude_deg() + d_lat).clamp(-90.0, 90.0);
        let lon = (self.observer.longitude_deg() + d_lon + 180.0).rem_euclid(360.0) - 180.0;
        Observer::new(lat, lon, self.observer.altitude_m()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn zurich() -> Observer {
        Observer::new(47.3769, 8.5417, 408.0).unwrap()
    }

    #[test]
    fn test_same_seed_same_readings() {
        let view = HorizonPosition::from_degrees(180.0, 45.0);
        let mut a = AttitudeFeed::new(7, view).with_tremor_deg(0.5);
        let mut b = AttitudeFeed::new(7, view).with_tremor_deg(0.5);

        for i in 0..10 {
            let t = i as f64 * 0.1;
            assert_eq!(a.sample(t), b.sample(t));
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let view = HorizonPosition::from_degrees(180.0, 45.0);
        let mut a = AttitudeFeed::new(1, view).with_tremor_deg(0.5);
        let mut b = AttitudeFeed::new(2, view).with_tremor_deg(0.5);
        assert_ne!(a.sample(0.0), b.sample(0.0));
    }

    #[test]
    fn test_steady_feed_looks_at_view() {
        let view = HorizonPosition::from_degrees(135.0, 30.0);
        let mut feed = AttitudeFeed::new(0, view);
        let attitude = feed.sample(3.0).unwrap();

        let camera = attitude.to_camera_direction(&heliodos_core::world_direction(view));
        assert_relative_eq!(camera.z, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_attitude_availability_window() {
        let mut feed = AttitudeFeed::new(0, HorizonPosition::from_degrees(0.0, 0.0)).available_from(2.0);
        assert!(feed.sample(1.9).is_none());
        assert!(feed.sample(2.0).is_some());
    }

    #[test]
    fn test_location_window() {
        let mut feed = LocationFeed::new(0, zurich()).available_from(1.0).lost_at(3.0);
        assert!(feed.sample(0.5).is_none());
        assert_eq!(feed.sample(1.0), Some(zurich()));
        assert!(feed.sample(3.0).is_none());

        let mut silent = LocationFeed::silent(0, zurich());
        assert!(silent.sample(100.0).is_none());
    }

    #[test]
    fn test_noiseless_fix_is_exact() {
        let observer = Observer::new(-33.9249, 18.4241, 0.0).unwrap();
        let mut feed = LocationFeed::new(9, observer);
        for i in 0..5 {
            assert_eq!(feed.sample(i as f64), Some(observer));
        }
    }

    #[test]
    fn test_location_noise_is_small() {
        let mut feed = LocationFeed::new(3, zurich()).with_noise_m(10.0);
        for i in 0..50 {
            let fix = feed.sample(i as f64).unwrap();
            assert!((fix.latitude_deg() - zurich().latitude_deg()).abs() < 0.001);
            assert!((fix.longitude_deg() - zurich().longitude_deg()).abs() < 0.001);
        }
    }

    #[test]
    fn test_derived_seeds_differ() {
        assert_ne!(derive_seed(42, 0), derive_seed(42, 1));
        assert_ne!(derive_seed(42, 0), derive_seed(43, 0));
    }
}
