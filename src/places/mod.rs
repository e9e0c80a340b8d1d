//! Named places for pickup and dropoff addresses.
//!
//! A built-in gazetteer (optionally extended from configuration) turns
//! free-form addresses into coordinates for the distance estimator.

pub mod gazetteer;
pub mod resolver;

pub use gazetteer::{builtin_places, MatchKind, Place};
pub use resolver::{PlaceResolver, PlaceSource, ResolvedPlace};
