//! Distance and price estimation for a pickup → dropoff route.
//!
//! Two paths exist and are never mixed:
//! - `Haversine`: the geometric distance between two known coordinates.
//! - `RandomFallback`: a pseudo-random distance in [5, 25) km, used only when
//!   the caller explicitly opts in because coordinates are unavailable.

use crate::geo::{haversine_km, Coordinate};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Lower bound (inclusive) of the fallback distance, in km.
pub const FALLBACK_MIN_KM: u32 = 5;
/// Upper bound (exclusive) of the fallback distance, in km.
pub const FALLBACK_MAX_KM: u32 = 25;

/// Which computation produced an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstimateMethod {
    Haversine,
    RandomFallback,
}

impl fmt::Display for EstimateMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Haversine => write!(f, "Haversine"),
            Self::RandomFallback => write!(f, "Random fallback"),
        }
    }
}

/// What to do when a route has no coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FallbackPolicy {
    /// Return [`EstimateError::MissingCoordinates`].
    #[default]
    Refuse,
    /// Use [`Tariff::estimate_random_fallback`].
    Random,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EstimateError {
    #[error("No coordinates for this route; pass an explicit fallback to estimate anyway")]
    MissingCoordinates,
}

/// Flat base fare plus a linear per-kilometre rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tariff {
    pub base_fare: f64,
    pub per_km: f64,
}

impl Default for Tariff {
    fn default() -> Self {
        Self { base_fare: 5.0, per_km: 0.5 }
    }
}

/// Estimated distance and the price derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceEstimate {
    pub distance_km: f64,
    /// Exact `base_fare + distance_km * per_km`; round only for display.
    pub suggested_price: f64,
    pub method: EstimateMethod,
}

impl DistanceEstimate {
    /// Price rounded to two decimals, e.g. `"5.45"`.
    pub fn display_price(&self) -> String {
        format!("{:.2}", self.suggested_price)
    }

    pub fn summary(&self) -> String {
        format!(
            "{:.2} km \u{2192} ${} (base + per-km, {})",
            self.distance_km,
            self.display_price(),
            self.method
        )
    }
}

impl Tariff {
    pub fn price_for(&self, distance_km: f64) -> f64 {
        self.base_fare + distance_km * self.per_km
    }

    /// Geometric estimate between two coordinates.
    pub fn estimate(&self, pickup: Coordinate, dropoff: Coordinate) -> DistanceEstimate {
        let distance_km = haversine_km(pickup, dropoff);
        DistanceEstimate {
            distance_km,
            suggested_price: self.price_for(distance_km),
            method: EstimateMethod::Haversine,
        }
    }

    /// Non-deterministic estimate for routes without coordinates.
    /// The distance is a whole number of km in [5, 25).
    pub fn estimate_random_fallback<R: Rng>(&self, rng: &mut R) -> DistanceEstimate {
        let distance_km = rng.gen_range(FALLBACK_MIN_KM..FALLBACK_MAX_KM) as f64;
        DistanceEstimate {
            distance_km,
            suggested_price: self.price_for(distance_km),
            method: EstimateMethod::RandomFallback,
        }
    }

    /// Pick the path from coordinate availability alone.
    pub fn estimate_route<R: Rng>(
        &self,
        route: Option<(Coordinate, Coordinate)>,
        policy: FallbackPolicy,
        rng: &mut R,
    ) -> Result<DistanceEstimate, EstimateError> {
        match (route, policy) {
            (Some((pickup, dropoff)), _) => Ok(self.estimate(pickup, dropoff)),
            (None, FallbackPolicy::Random) => {
                tracing::debug!("no coordinates for route, using random fallback");
                Ok(self.estimate_random_fallback(rng))
            }
            (None, FallbackPolicy::Refuse) => Err(EstimateError::MissingCoordinates),
        }
    }
}

/// [`Tariff::estimate`] with the default tariff.
pub fn estimate(pickup: Coordinate, dropoff: Coordinate) -> DistanceEstimate {
    Tariff::default().estimate(pickup, dropoff)
}

/// [`Tariff::estimate_random_fallback`] with the default tariff and thread RNG.
pub fn estimate_random_fallback() -> DistanceEstimate {
    Tariff::default().estimate_random_fallback(&mut rand::thread_rng())
}
