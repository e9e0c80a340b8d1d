//! Live delivery tracking simulation.
//!
//! Progress advances by a fixed step on every timer tick and maps onto five
//! delivery phases; each tick also reports a runner position from a
//! pluggable [`LocationFeed`].

pub mod feed;
pub mod simulator;
pub mod status;

pub use feed::{FixedFeed, JitterFeed, LocationFeed};
pub use simulator::{start_tracking, Tracker, TrackingHandle, TrackingUpdate};
pub use status::{TrackingState, TrackingStatus};

use crate::geo::Coordinate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Simulation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Tick period in milliseconds.
    pub interval_ms: u64,
    /// Progress added per tick.
    pub step: f64,
    /// Progress at start, in [0, 1].
    pub initial_progress: f64,
    /// Centre of the simulated runner position.
    pub reference: Coordinate,
    /// Maximum jitter per axis, in degrees.
    pub jitter_deg: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 3000,
            step: 0.05,
            initial_progress: 0.0,
            reference: Coordinate::new_unchecked(-17.8252, 31.0335),
            jitter_deg: 0.005,
        }
    }
}

impl TrackingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }

    /// The jittered feed around [`Self::reference`].
    pub fn jitter_feed(&self, seed: Option<u64>) -> JitterFeed {
        match seed {
            Some(seed) => JitterFeed::seeded(self.reference, self.jitter_deg, seed),
            None => JitterFeed::new(self.reference, self.jitter_deg),
        }
    }
}
