//! Delivery status derived from completion progress.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Progress values are snapped to this many decimal places after each step
/// so that repeated `+0.05` lands exactly on 0.3, 0.5, 0.8 and 1.0.
const PROGRESS_SCALE: f64 = 1e6;

/// Discrete delivery phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackingStatus {
    /// Runner heading to the pickup address. progress ∈ [0, 0.3)
    ToPickup,
    /// Runner collecting the package. progress ∈ [0.3, 0.5)
    AtPickup,
    /// Runner heading to the dropoff address. progress ∈ [0.5, 0.8)
    ToDelivery,
    /// Final approach. progress ∈ [0.8, 1.0)
    ArrivingSoon,
    /// Terminal. progress = 1.0
    Delivered,
}

impl TrackingStatus {
    /// Map a progress value to its phase. Lower bounds are inclusive.
    pub fn from_progress(progress: f64) -> Self {
        if progress >= 1.0 {
            Self::Delivered
        } else if progress >= 0.8 {
            Self::ArrivingSoon
        } else if progress >= 0.5 {
            Self::ToDelivery
        } else if progress >= 0.3 {
            Self::AtPickup
        } else {
            Self::ToPickup
        }
    }

    pub fn eta_label(&self) -> &'static str {
        match self {
            Self::ToPickup => "15 mins",
            Self::AtPickup => "10 mins",
            Self::ToDelivery => "5 mins",
            Self::ArrivingSoon => "2 mins",
            Self::Delivered => "Completed",
        }
    }

    /// Headline shown above the progress bar.
    pub fn headline(&self) -> &'static str {
        match self {
            Self::ToPickup => "On the way to pickup",
            Self::AtPickup => "Arrived at pickup",
            Self::ToDelivery => "On the way to delivery",
            Self::ArrivingSoon => "Arriving soon",
            Self::Delivered => "Delivered!",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

impl fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.headline())
    }
}

/// Snapshot of an in-progress delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingState {
    /// Completion in [0, 1].
    pub progress: f64,
    pub status: TrackingStatus,
    pub eta_label: String,
}

impl TrackingState {
    /// State at the given progress, clamped to [0, 1]. NaN is treated as 0.
    pub fn at(progress: f64) -> Self {
        let progress = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
        let status = TrackingStatus::from_progress(progress);
        Self {
            progress,
            status,
            eta_label: status.eta_label().to_string(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Advance by `step` and recompute status. Returns false, leaving the
    /// state untouched, once Delivered.
    pub fn advance(&mut self, step: f64) -> bool {
        if self.is_terminal() {
            return false;
        }
        let next = ((self.progress + step) * PROGRESS_SCALE).round() / PROGRESS_SCALE;
        *self = Self::at(next);
        true
    }

    /// Rounded percentage for the progress bar.
    pub fn percent_complete(&self) -> u8 {
        (self.progress * 100.0).round() as u8
    }
}

impl Default for TrackingState {
    fn default() -> Self {
        Self::at(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_lower_bound_inclusive() {
        assert_eq!(TrackingStatus::from_progress(0.0), TrackingStatus::ToPickup);
        assert_eq!(TrackingStatus::from_progress(0.2999), TrackingStatus::ToPickup);
        assert_eq!(TrackingStatus::from_progress(0.3), TrackingStatus::AtPickup);
        assert_eq!(TrackingStatus::from_progress(0.4999), TrackingStatus::AtPickup);
        assert_eq!(TrackingStatus::from_progress(0.5), TrackingStatus::ToDelivery);
        assert_eq!(TrackingStatus::from_progress(0.8), TrackingStatus::ArrivingSoon);
        assert_eq!(TrackingStatus::from_progress(0.9999), TrackingStatus::ArrivingSoon);
        assert_eq!(TrackingStatus::from_progress(1.0), TrackingStatus::Delivered);
    }

    #[test]
    fn test_eta_labels() {
        assert_eq!(TrackingState::at(0.1).eta_label, "15 mins");
        assert_eq!(TrackingState::at(0.3).eta_label, "10 mins");
        assert_eq!(TrackingState::at(0.6).eta_label, "5 mins");
        assert_eq!(TrackingState::at(0.85).eta_label, "2 mins");
        assert_eq!(TrackingState::at(1.0).eta_label, "Completed");
    }

    #[test]
    fn test_at_clamps() {
        assert_eq!(TrackingState::at(-0.5).progress, 0.0);
        assert_eq!(TrackingState::at(1.7).progress, 1.0);
        assert_eq!(TrackingState::at(f64::NAN).progress, 0.0);
        assert_eq!(TrackingState::at(1.7).status, TrackingStatus::Delivered);
    }

    #[test]
    fn test_advance_lands_on_thresholds() {
        let mut state = TrackingState::default();
        let mut seen = Vec::new();
        for _ in 0..20 {
            assert!(state.advance(0.05));
            seen.push(state.status);
        }
        assert_eq!(state.progress, 1.0);
        assert_eq!(state.status, TrackingStatus::Delivered);
        // tick 6 → 0.30, tick 10 → 0.50, tick 16 → 0.80
        assert_eq!(seen[4], TrackingStatus::ToPickup);
        assert_eq!(seen[5], TrackingStatus::AtPickup);
        assert_eq!(seen[9], TrackingStatus::ToDelivery);
        assert_eq!(seen[15], TrackingStatus::ArrivingSoon);
        assert_eq!(seen[18], TrackingStatus::ArrivingSoon);
    }

    #[test]
    fn test_advance_clamps_and_stops() {
        let mut state = TrackingState::at(0.97);
        assert!(state.advance(0.05));
        assert_eq!(state.progress, 1.0);
        assert!(!state.advance(0.05));
        assert_eq!(state, TrackingState::at(1.0));
    }

    #[test]
    fn test_percent_and_headline() {
        let state = TrackingState::at(0.35);
        assert_eq!(state.percent_complete(), 35);
        assert_eq!(state.status.to_string(), "Arrived at pickup");
        assert_eq!(TrackingStatus::Delivered.headline(), "Delivered!");
    }
}
