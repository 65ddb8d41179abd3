//! Ephemeris collaborator interface.

use crate::types::{Body, HorizonPosition, Observer, RiseSet, Solstices, Timestamp};

/// Astronomical answers the overlay needs, supplied by an external engine.
///
/// All angles are in radians. Implementations must be cheap enough to call
/// from inside a render pass: a frame issues a few dozen position queries and
/// a handful of rise/set lookups, synchronously, with no I/O.
///
/// # Implementations
///
/// - **Production**: a wrapper around a full ephemeris library
/// - **Simulation**: `heliodos_sim::SimEphemeris`, a low-precision analytic model
pub trait Ephemeris: Send + Sync {
    /// Apparent horizon position of `body` seen by `observer` at `time`.
    ///
    /// Azimuth is relative to true north.
    fn azimuth_altitude_at(&self, body: Body, time: Timestamp, observer: &Observer) -> HorizonPosition;

    /// Local magnetic declination (east positive) at `observer` and `time`.
    fn magnetic_declination_at(&self, observer: &Observer, time: Timestamp) -> f64;

    /// The first sunrise in `[time - 24h, time]` and the sunset following it.
    ///
    /// # Returns
    /// * `Some(RiseSet)` - both events were found
    /// * `None` - no sunrise or no matching sunset (polar day/night)
    fn sunrise_sunset_around(&self, time: Timestamp, observer: &Observer) -> Option<RiseSet>;

    /// June and December solstice instants of `year`.
    fn solstices_of(&self, year: i32) -> Solstices;

    /// March equinox instant of `year`.
    fn march_equinox_of(&self, year: i32) -> Timestamp;
}

impl<E: Ephemeris + ?Sized> Ephemeris for std::sync::Arc<E> {
    fn azimuth_altitude_at(&self, body: Body, time: Timestamp, observer: &Observer) -> HorizonPosition {
        (**self).azimuth_altitude_at(body, time, observer)
    }

    fn magnetic_declination_at(&self, observer: &Observer, time: Timestamp) -> f64 {
        (**self).magnetic_declination_at(observer, time)
    }

    fn sunrise_sunset_around(&self, time: Timestamp, observer: &Observer) -> Option<RiseSet> {
        (**self).sunrise_sunset_around(time, observer)
    }

    fn solstices_of(&self, year: i32) -> Solstices {
        (**self).solstices_of(year)
    }

    fn march_equinox_of(&self, year: i32) -> Timestamp {
        (**self).march_equinox_of(year)
    }
}
