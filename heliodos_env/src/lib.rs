//! Heliodos Environment Boundary
//!
//! This crate holds everything the overlay pipeline consumes from the outside
//! world, so that `heliodos_core` can run unchanged on a phone, in a desktop
//! preview, or inside the deterministic simulation harness.
//!
//! # Collaborators
//!
//! - **Ephemeris** ([`Ephemeris`]): sun positions, rise/set search, solstices
//! - **Camera** ([`CameraSource`]): characteristics of the active camera
//! - **Clock** ([`ReferenceClock`]): the instant the overlay is drawn for
//!
//! Attitude and location are plain values pushed into the compositor; they
//! need no trait.
//!
//! # Example
//!
//! ```ignore
//! use heliodos_env::{Ephemeris, Body, Observer, SystemClock, ReferenceClock};
//!
//! fn sun_now<E: Ephemeris>(eph: &E, observer: &Observer) -> HorizonPosition {
//!     eph.azimuth_altitude_at(Body::Sun, SystemClock.now(), observer)
//! }
//! ```

mod camera;
mod clock;
mod ephemeris;
mod error;
mod types;

pub use camera::{CameraCharacteristics, CameraSource, LensFacing};
pub use clock::{FixedClock, ReferenceClock, SystemClock};
pub use ephemeris::Ephemeris;
pub use error::EnvError;
pub use types::{Body, HorizonPosition, Observer, ObserverFix, RiseSet, Solstices, Timestamp};
