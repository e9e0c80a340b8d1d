//! Timer-driven delivery simulation.
//!
//! [`Tracker`] is the synchronous state machine: one call to [`Tracker::tick`]
//! per timer period. [`start_tracking`] drives a tracker from a tokio
//! interval and hands each update to a callback until Delivered or until
//! the returned [`TrackingHandle`] is cancelled or dropped.

use super::feed::LocationFeed;
use super::status::TrackingState;
use super::TrackingConfig;
use crate::geo::Coordinate;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// What the owner receives on every tick.
#[derive(Debug, Clone, Serialize)]
pub struct TrackingUpdate {
    /// 1-based tick counter.
    pub tick: u32,
    pub state: TrackingState,
    pub headline: &'static str,
    pub runner: Coordinate,
    pub at: DateTime<Utc>,
}

/// Progress state plus the location feed that accompanies it.
pub struct Tracker {
    state: TrackingState,
    step: f64,
    ticks: u32,
    feed: Box<dyn LocationFeed>,
}

impl Tracker {
    pub fn new(config: &TrackingConfig, feed: impl LocationFeed + 'static) -> Self {
        Self {
            state: TrackingState::at(config.initial_progress),
            step: config.step,
            ticks: 0,
            feed: Box::new(feed),
        }
    }

    pub fn state(&self) -> &TrackingState {
        &self.state
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// True once Delivered; no further ticks produce updates.
    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    /// One timer period. Returns `None` after the terminal state.
    pub fn tick(&mut self) -> Option<TrackingUpdate> {
        if !self.state.advance(self.step) {
            return None;
        }
        self.ticks += 1;
        let runner = self.feed.next_location();

        tracing::debug!(
            tick = self.ticks,
            progress = self.state.progress,
            status = ?self.state.status,
            "tracking tick"
        );

        Some(TrackingUpdate {
            tick: self.ticks,
            headline: self.state.status.headline(),
            state: self.state.clone(),
            runner,
            at: Utc::now(),
        })
    }

    pub fn into_state(self) -> TrackingState {
        self.state
    }
}

/// Owner's handle on a running simulation. Dropping it stops the timer.
pub struct TrackingHandle {
    task: Option<JoinHandle<TrackingState>>,
    cancelled: bool,
}

impl TrackingHandle {
    /// Stop all further updates. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(task) = &self.task {
            if !task.is_finished() {
                tracing::info!("tracking cancelled");
            }
            task.abort();
        }
        self.cancelled = true;
    }

    /// Whether the timer is still running.
    pub fn is_active(&self) -> bool {
        !self.cancelled && self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Wait for the simulation to end. `Some(final_state)` when it reached
    /// Delivered, `None` when it was cancelled.
    /// Dropping the returned future before it resolves cancels the task.
    pub async fn finished(mut self) -> Option<TrackingState> {
        if self.cancelled {
            return None;
        }
        let task = self.task.as_mut()?;
        let result = task.await;
        self.task = None;
        result.ok()
    }
}

impl Drop for TrackingHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Start the periodic simulation on the current tokio runtime.
///
/// The first tick fires one interval after the call. `on_update` runs on the
/// simulation task, once per tick, and never after Delivered or cancellation.
///
/// # Panics
/// When called outside a tokio runtime.
pub fn start_tracking<L, F>(config: &TrackingConfig, feed: L, mut on_update: F) -> TrackingHandle
where
    L: LocationFeed + 'static,
    F: FnMut(&TrackingUpdate) + Send + 'static,
{
    let mut tracker = Tracker::new(config, feed);
    let period = config.interval();

    tracing::info!(
        interval_ms = period.as_millis() as u64,
        step = config.step,
        start = tracker.state().progress,
        "tracking started"
    );

    let task = tokio::spawn(async move {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while !tracker.is_finished() {
            interval.tick().await;
            if let Some(update) = tracker.tick() {
                on_update(&update);
            }
        }

        tracing::info!(ticks = tracker.ticks(), "tracking finished");
        tracker.into_state()
    });

    TrackingHandle { task: Some(task), cancelled: false }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::feed::{FixedFeed, JitterFeed};
    use crate::tracking::status::TrackingStatus;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    const REFERENCE: Coordinate = Coordinate::new_unchecked(-17.8252, 31.0335);

    fn recorder() -> (Arc<Mutex<Vec<TrackingUpdate>>>, impl FnMut(&TrackingUpdate) + Send + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |u: &TrackingUpdate| sink.lock().unwrap().push(u.clone()))
    }

    #[test]
    fn test_twenty_ticks_to_delivered() {
        let mut tracker = Tracker::new(&TrackingConfig::default(), FixedFeed(REFERENCE));
        let mut last = None;
        for _ in 0..20 {
            last = tracker.tick();
            assert!(last.is_some());
        }
        let last = last.unwrap();
        assert_eq!(last.tick, 20);
        assert_eq!(last.state.progress, 1.0);
        assert_eq!(last.state.status, TrackingStatus::Delivered);
        assert_eq!(last.state.eta_label, "Completed");
        assert_eq!(last.headline, "Delivered!");
        assert!(tracker.is_finished());

        for _ in 0..5 {
            assert!(tracker.tick().is_none());
        }
        assert_eq!(tracker.ticks(), 20);
    }

    #[test]
    fn test_initial_progress_shortens_run() {
        let config = TrackingConfig { initial_progress: 0.3, ..TrackingConfig::default() };
        let mut tracker = Tracker::new(&config, FixedFeed(REFERENCE));
        assert_eq!(tracker.state().status, TrackingStatus::AtPickup);
        let mut n = 0;
        while tracker.tick().is_some() {
            n += 1;
        }
        assert_eq!(n, 14);
    }

    #[test]
    fn test_runner_location_jittered() {
        let config = TrackingConfig::default();
        let mut tracker = Tracker::new(&config, JitterFeed::seeded(REFERENCE, config.jitter_deg, 3));
        let u = tracker.tick().unwrap();
        assert!((u.runner.latitude - REFERENCE.latitude).abs() <= 0.005 + 1e-12);
        assert!((u.runner.longitude - REFERENCE.longitude).abs() <= 0.005 + 1e-12);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_runs_to_completion_then_stops() {
        let (seen, on_update) = recorder();
        let handle = start_tracking(&TrackingConfig::default(), FixedFeed(REFERENCE), on_update);
        assert!(handle.is_active());

        // 20 ticks × 3 s
        time::sleep(Duration::from_secs(61)).await;
        assert!(!handle.is_active());
        assert_eq!(seen.lock().unwrap().len(), 20);

        time::sleep(Duration::from_secs(30)).await;
        let updates = seen.lock().unwrap();
        assert_eq!(updates.len(), 20);
        assert_eq!(updates.last().unwrap().state.status, TrackingStatus::Delivered);
        assert_eq!(updates.last().unwrap().state.progress, 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_after_one_interval() {
        let (seen, on_update) = recorder();
        let _handle = start_tracking(&TrackingConfig::default(), FixedFeed(REFERENCE), on_update);

        time::sleep(Duration::from_millis(2900)).await;
        assert!(seen.lock().unwrap().is_empty());
        time::sleep(Duration::from_millis(200)).await;
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_finished_returns_final_state() {
        let (_seen, on_update) = recorder();
        let handle = start_tracking(&TrackingConfig::default(), FixedFeed(REFERENCE), on_update);
        let state = handle.finished().await.unwrap();
        assert_eq!(state.status, TrackingStatus::Delivered);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_updates() {
        let (seen, on_update) = recorder();
        let mut handle = start_tracking(&TrackingConfig::default(), FixedFeed(REFERENCE), on_update);

        time::sleep(Duration::from_millis(9100)).await;
        assert_eq!(seen.lock().unwrap().len(), 3);

        handle.cancel();
        assert!(!handle.is_active());
        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(seen.lock().unwrap().len(), 3);
        assert!(handle.finished().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_delivered_reports_cancelled() {
        let (seen, on_update) = recorder();
        let mut handle = start_tracking(&TrackingConfig::default(), FixedFeed(REFERENCE), on_update);

        time::sleep(Duration::from_secs(61)).await;
        assert_eq!(seen.lock().unwrap().len(), 20);

        handle.cancel();
        assert!(handle.finished().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_updates() {
        let (seen, on_update) = recorder();
        let handle = start_tracking(&TrackingConfig::default(), FixedFeed(REFERENCE), on_update);

        time::sleep(Duration::from_millis(3100)).await;
        drop(handle);
        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
