use crate::config::Config;
use crate::errand::ErrandBoard;
use crate::places::PlaceResolver;
use crate::tracking::{TrackingHandle, TrackingUpdate};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// How long a delivered session stays readable before it is evicted.
pub const SESSION_RETENTION: Duration = Duration::from_secs(60);

pub struct TrackingSession {
    pub handle: TrackingHandle,
    pub latest: Arc<Mutex<Option<TrackingUpdate>>>,
    /// Set by the simulation task on the Delivered tick.
    pub delivered_at: Arc<Mutex<Option<Instant>>>,
}

impl TrackingSession {
    fn is_expired(&self, now: Instant) -> bool {
        if self.handle.is_active() {
            return false;
        }
        match *lock(&self.delivered_at) {
            Some(at) => now.duration_since(at) >= SESSION_RETENTION,
            None => true,
        }
    }
}

pub struct AppState {
    pub config: Config,
    pub resolver: PlaceResolver,
    pub board: Mutex<ErrandBoard>,
    pub sessions: Mutex<HashMap<u64, TrackingSession>>,
    next_session: AtomicU64,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            resolver: PlaceResolver::new(config.places.clone()),
            config,
            board: Mutex::new(ErrandBoard::new()),
            sessions: Mutex::new(HashMap::new()),
            next_session: AtomicU64::new(1),
        }
    }

    pub fn next_session_id(&self) -> u64 {
        self.next_session.fetch_add(1, Ordering::Relaxed)
    }

    /// Drop sessions that stopped running and are past their retention.
    /// Returns how many were removed.
    pub fn prune_sessions(&self) -> usize {
        let now = Instant::now();
        let mut sessions = lock(&self.sessions);
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        let removed = before - sessions.len();
        if removed > 0 {
            tracing::debug!(removed, live = sessions.len(), "tracking sessions pruned");
        }
        removed
    }
}

/// Lock, recovering the data if a previous holder panicked.
pub fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
