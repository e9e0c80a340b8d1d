//! Errand requests and their lifecycle.
//!
//! `Pending → InProgress → Completed`. A pending errand may also be rejected
//! (removed) or re-priced with a counter offer. The board is an ordinary
//! value owned by whoever drives it; nothing here is global or persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub type ErrandId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrandStatus {
    Pending,
    InProgress,
    Completed,
}

impl fmt::Display for ErrandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::InProgress => write!(f, "In Progress"),
            Self::Completed => write!(f, "Completed"),
        }
    }
}

/// The booking form as submitted by a client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrandRequest {
    pub client_name: String,
    pub client_phone: String,
    pub pickup_address: String,
    pub dropoff_address: String,
    pub package_type: String,
    pub preferred_time: Option<String>,
    pub notes: Option<String>,
    pub distance_km: Option<f64>,
    pub proposed_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Errand {
    pub id: ErrandId,
    #[serde(flatten)]
    pub request: ErrandRequest,
    pub status: ErrandStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrandError {
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),
    #[error("Invalid price {0}: must be a positive amount")]
    InvalidPrice(f64),
    #[error("Invalid distance {0} km: must be zero or more")]
    InvalidDistance(f64),
    #[error("Errand #{0} not found")]
    NotFound(ErrandId),
    #[error("Cannot {action} errand #{id}: it is {status}")]
    InvalidTransition {
        id: ErrandId,
        action: &'static str,
        status: ErrandStatus,
    },
}

/// Dashboard counters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct BoardSummary {
    pub pending: usize,
    pub active: usize,
    pub completed: usize,
    /// Sum of proposed prices of completed errands.
    pub earnings: f64,
}

fn check_price(price: f64) -> Result<f64, ErrandError> {
    if price.is_finite() && price > 0.0 {
        Ok(price)
    } else {
        Err(ErrandError::InvalidPrice(price))
    }
}

impl ErrandRequest {
    pub fn validate(&self) -> Result<(), ErrandError> {
        let required = [
            ("pickup_address", &self.pickup_address),
            ("dropoff_address", &self.dropoff_address),
            ("package_type", &self.package_type),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ErrandError::MissingField(field));
            }
        }
        check_price(self.proposed_price)?;
        match self.distance_km {
            Some(km) if !(km.is_finite() && km >= 0.0) => Err(ErrandError::InvalidDistance(km)),
            _ => Ok(()),
        }
    }
}

/// In-memory errand list with admin actions.
#[derive(Debug, Default)]
pub struct ErrandBoard {
    errands: BTreeMap<ErrandId, Errand>,
    next_id: ErrandId,
}

impl ErrandBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store a new `Pending` errand.
    pub fn submit(&mut self, request: ErrandRequest) -> Result<&Errand, ErrandError> {
        request.validate()?;
        self.next_id += 1;
        let id = self.next_id;
        tracing::info!(id, pickup = %request.pickup_address, dropoff = %request.dropoff_address, "errand submitted");
        let errand = Errand {
            id,
            request,
            status: ErrandStatus::Pending,
            created_at: Utc::now(),
        };
        Ok(&*self.errands.entry(id).or_insert(errand))
    }

    pub fn get(&self, id: ErrandId) -> Option<&Errand> {
        self.errands.get(&id)
    }

    /// Newest first, as the dashboards list them.
    pub fn list(&self) -> Vec<&Errand> {
        self.errands.values().rev().collect()
    }

    pub fn by_status(&self, status: ErrandStatus) -> impl Iterator<Item = &Errand> {
        self.errands.values().filter(move |e| e.status == status)
    }

    fn pending_mut(&mut self, id: ErrandId, action: &'static str) -> Result<&mut Errand, ErrandError> {
        let errand = self.errands.get_mut(&id).ok_or(ErrandError::NotFound(id))?;
        if errand.status != ErrandStatus::Pending {
            return Err(ErrandError::InvalidTransition { id, action, status: errand.status });
        }
        Ok(errand)
    }

    pub fn accept(&mut self, id: ErrandId) -> Result<&Errand, ErrandError> {
        let errand = self.pending_mut(id, "accept")?;
        errand.status = ErrandStatus::InProgress;
        tracing::info!(id, "errand accepted");
        Ok(&*errand)
    }

    /// Remove a pending errand.
    pub fn reject(&mut self, id: ErrandId) -> Result<Errand, ErrandError> {
        self.pending_mut(id, "reject")?;
        tracing::info!(id, "errand rejected");
        self.errands.remove(&id).ok_or(ErrandError::NotFound(id))
    }

    pub fn counter_offer(&mut self, id: ErrandId, price: f64) -> Result<&Errand, ErrandError> {
        let price = check_price(price)?;
        let errand = self.pending_mut(id, "counter-offer")?;
        tracing::info!(id, from = errand.request.proposed_price, to = price, "counter offer");
        errand.request.proposed_price = price;
        Ok(&*errand)
    }

    pub fn complete(&mut self, id: ErrandId) -> Result<&Errand, ErrandError> {
        let errand = self.errands.get_mut(&id).ok_or(ErrandError::NotFound(id))?;
        if errand.status != ErrandStatus::InProgress {
            return Err(ErrandError::InvalidTransition {
                id,
                action: "complete",
                status: errand.status,
            });
        }
        errand.status = ErrandStatus::Completed;
        tracing::info!(id, price = errand.request.proposed_price, "errand completed");
        Ok(&*errand)
    }

    pub fn summary(&self) -> BoardSummary {
        self.errands.values().fold(BoardSummary::default(), |mut s, e| {
            match e.status {
                ErrandStatus::Pending => s.pending += 1,
                ErrandStatus::InProgress => s.active += 1,
                ErrandStatus::Completed => {
                    s.completed += 1;
                    s.earnings += e.request.proposed_price;
                }
            }
            s
        })
    }

    pub fn len(&self) -> usize {
        self.errands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(price: f64) -> ErrandRequest {
        ErrandRequest {
            client_name: "John Doe".into(),
            client_phone: "+263771234567".into(),
            pickup_address: "123 Main St, Harare".into(),
            dropoff_address: "456 Park Ave, Harare".into(),
            package_type: "Documents".into(),
            distance_km: Some(12.0),
            proposed_price: price,
            ..ErrandRequest::default()
        }
    }

    #[test]
    fn test_submit_assigns_ids_and_pending() {
        let mut board = ErrandBoard::new();
        let a = board.submit(request(8.5)).unwrap().id;
        let b = board.submit(request(12.0)).unwrap().id;
        assert_eq!((a, b), (1, 2));
        assert_eq!(board.get(a).unwrap().status, ErrandStatus::Pending);
        assert_eq!(board.list()[0].id, b);
    }

    #[test]
    fn test_submit_requires_fields() {
        let mut board = ErrandBoard::new();
        let mut r = request(8.5);
        r.package_type = "   ".into();
        assert_eq!(board.submit(r).unwrap_err(), ErrandError::MissingField("package_type"));

        let mut r = request(8.5);
        r.pickup_address.clear();
        assert_eq!(board.submit(r).unwrap_err(), ErrandError::MissingField("pickup_address"));

        assert!(matches!(board.submit(request(0.0)), Err(ErrandError::InvalidPrice(_))));
        assert!(matches!(board.submit(request(f64::NAN)), Err(ErrandError::InvalidPrice(_))));
        assert!(board.is_empty());
    }

    #[test]
    fn test_submit_rejects_bad_distance() {
        let mut board = ErrandBoard::new();
        for km in [-3.0, f64::NAN, f64::INFINITY] {
            let r = ErrandRequest { distance_km: Some(km), ..request(8.5) };
            assert!(matches!(board.submit(r), Err(ErrandError::InvalidDistance(_))));
        }
        assert!(board.is_empty());

        let zero = ErrandRequest { distance_km: Some(0.0), ..request(8.5) };
        assert!(board.submit(zero).is_ok());
        let unknown = ErrandRequest { distance_km: None, ..request(8.5) };
        assert!(board.submit(unknown).is_ok());
    }

    #[test]
    fn test_lifecycle() {
        let mut board = ErrandBoard::new();
        let id = board.submit(request(15.0)).unwrap().id;

        assert_eq!(
            board.complete(id).unwrap_err(),
            ErrandError::InvalidTransition { id, action: "complete", status: ErrandStatus::Pending }
        );

        assert_eq!(board.accept(id).unwrap().status, ErrandStatus::InProgress);
        assert!(matches!(board.accept(id), Err(ErrandError::InvalidTransition { .. })));
        assert!(matches!(board.reject(id), Err(ErrandError::InvalidTransition { .. })));
        assert!(matches!(board.counter_offer(id, 9.0), Err(ErrandError::InvalidTransition { .. })));

        assert_eq!(board.complete(id).unwrap().status, ErrandStatus::Completed);
        assert!(matches!(board.complete(id), Err(ErrandError::InvalidTransition { .. })));
    }

    #[test]
    fn test_counter_offer_and_reject() {
        let mut board = ErrandBoard::new();
        let id = board.submit(request(8.5)).unwrap().id;

        assert!(matches!(board.counter_offer(id, -1.0), Err(ErrandError::InvalidPrice(_))));
        assert_eq!(board.counter_offer(id, 10.0).unwrap().request.proposed_price, 10.0);

        let removed = board.reject(id).unwrap();
        assert_eq!(removed.request.proposed_price, 10.0);
        assert_eq!(board.get(id).map(|e| e.id), None);
        assert_eq!(board.reject(id).unwrap_err(), ErrandError::NotFound(id));
    }

    #[test]
    fn test_summary_counts_only_completed_earnings() {
        let mut board = ErrandBoard::new();
        let a = board.submit(request(8.5)).unwrap().id;
        let b = board.submit(request(12.0)).unwrap().id;
        let c = board.submit(request(15.0)).unwrap().id;
        let _d = board.submit(request(4.0)).unwrap().id;

        board.accept(a).unwrap();
        board.accept(b).unwrap();
        board.complete(b).unwrap();
        board.accept(c).unwrap();
        board.complete(c).unwrap();

        let s = board.summary();
        assert_eq!(s.pending, 1);
        assert_eq!(s.active, 1);
        assert_eq!(s.completed, 2);
        assert_eq!(s.earnings, 27.0);
        assert_eq!(board.by_status(ErrandStatus::Completed).count(), 2);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(ErrandStatus::InProgress.to_string(), "In Progress");
        let json = serde_json::to_string(&ErrandStatus::InProgress).unwrap();
        assert_eq!(json, "\"InProgress\"");
    }
}
