//! Runner location sources.
//!
//! The simulator only needs "where is the runner now?" once per tick. The
//! jittered feed stands in for a GPS/telemetry stream; any closure returning
//! a [`Coordinate`] can replace it.

use crate::geo::Coordinate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A source of runner positions, polled once per tick.
pub trait LocationFeed: Send {
    fn next_location(&mut self) -> Coordinate;
}

impl<F> LocationFeed for F
where
    F: FnMut() -> Coordinate + Send,
{
    fn next_location(&mut self) -> Coordinate {
        self()
    }
}

/// Uniform jitter of up to `jitter_deg` on each axis around a reference point.
pub struct JitterFeed {
    center: Coordinate,
    jitter_deg: f64,
    rng: StdRng,
}

impl JitterFeed {
    pub fn new(center: Coordinate, jitter_deg: f64) -> Self {
        Self::with_rng(center, jitter_deg, StdRng::from_entropy())
    }

    /// Reproducible sequence for tests and demos.
    pub fn seeded(center: Coordinate, jitter_deg: f64, seed: u64) -> Self {
        Self::with_rng(center, jitter_deg, StdRng::seed_from_u64(seed))
    }

    fn with_rng(center: Coordinate, jitter_deg: f64, rng: StdRng) -> Self {
        Self { center, jitter_deg: jitter_deg.abs(), rng }
    }
}

impl LocationFeed for JitterFeed {
    fn next_location(&mut self) -> Coordinate {
        let j = self.jitter_deg;
        let dlat = self.rng.gen_range(-j..=j);
        let dlon = self.rng.gen_range(-j..=j);
        self.center.offset(dlat, dlon)
    }
}

/// Always reports the same position.
pub struct FixedFeed(pub Coordinate);

impl LocationFeed for FixedFeed {
    fn next_location(&mut self) -> Coordinate {
        self.0
    }
}
