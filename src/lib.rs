//! Errand runner core.
//!
//! Great-circle distance and price estimation for pickup → dropoff routes,
//! a timer-driven delivery tracking simulation, and the errand lifecycle
//! used by the client and admin dashboards.

pub mod config;
pub mod errand;
pub mod geo;
pub mod places;
pub mod pricing;
pub mod server;
pub mod tracking;

pub use geo::Coordinate;
pub use pricing::{estimate, estimate_random_fallback, DistanceEstimate};
pub use tracking::{start_tracking, TrackingHandle, TrackingState, TrackingStatus};
