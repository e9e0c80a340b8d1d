use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::errand::{BoardSummary, Errand, ErrandError, ErrandId, ErrandRequest};
use crate::places::{Place, ResolvedPlace};
use crate::pricing::{DistanceEstimate, EstimateError, FallbackPolicy};
use crate::tracking::{start_tracking, TrackingUpdate};

use super::state::{lock, AppState, TrackingSession};

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

#[derive(Debug)]
pub struct ApiError(pub StatusCode, pub String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

impl From<ErrandError> for ApiError {
    fn from(e: ErrandError) -> Self {
        let status = match e {
            ErrandError::MissingField(_)
            | ErrandError::InvalidPrice(_)
            | ErrandError::InvalidDistance(_) => StatusCode::BAD_REQUEST,
            ErrandError::NotFound(_) => StatusCode::NOT_FOUND,
            ErrandError::InvalidTransition { .. } => StatusCode::CONFLICT,
        };
        api_error(status, e.to_string())
    }
}

fn log_request(route: &str, detail: &str, start: Instant) {
    tracing::info!(
        route,
        detail,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "request"
    );
}

// ─── GET /api/estimate ───────────────────────────────────────────

#[derive(Deserialize)]
pub struct EstimateQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(default)]
    pub fallback: bool,
}

#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    pub pickup: Option<ResolvedPlace>,
    pub dropoff: Option<ResolvedPlace>,
    #[serde(flatten)]
    pub estimate: DistanceEstimate,
    pub display_price: String,
}

pub async fn estimate(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EstimateQuery>,
) -> Result<Json<EstimateResponse>, ApiError> {
    let start = Instant::now();

    let (from, to) = match (params.from.as_deref(), params.to.as_deref()) {
        (Some(f), Some(t)) if !f.trim().is_empty() && !t.trim().is_empty() => (f, t),
        _ => return Err(api_error(StatusCode::BAD_REQUEST, "Provide both 'from' and 'to' parameters")),
    };

    let pickup = state
        .resolver
        .resolve(from)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
    let dropoff = state
        .resolver
        .resolve(to)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let route = pickup
        .as_ref()
        .zip(dropoff.as_ref())
        .map(|(a, b)| (a.coordinate, b.coordinate));
    let policy = if params.fallback { FallbackPolicy::Random } else { FallbackPolicy::Refuse };

    let estimate = state
        .config
        .tariff
        .estimate_route(route, policy, &mut rand::thread_rng())
        .map_err(|e| match e {
            EstimateError::MissingCoordinates => api_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Unknown location for '{}' or '{}'; retry with fallback=true", from, to),
            ),
        })?;

    log_request("/api/estimate", &estimate.summary(), start);

    Ok(Json(EstimateResponse {
        pickup,
        dropoff,
        display_price: estimate.display_price(),
        estimate,
    }))
}

// ─── GET /api/places ─────────────────────────────────────────────

pub async fn places(State(state): State<Arc<AppState>>) -> Json<Vec<Place>> {
    Json(state.resolver.places().cloned().collect())
}

// ─── /api/tracking ───────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TrackingStarted {
    pub id: u64,
    pub interval_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct TrackingView {
    pub id: u64,
    pub active: bool,
    /// `null` until the first tick.
    pub update: Option<TrackingUpdate>,
}

pub async fn tracking_start(State(state): State<Arc<AppState>>) -> (StatusCode, Json<TrackingStarted>) {
    state.prune_sessions();
    let id = state.next_session_id();
    let latest = Arc::new(Mutex::new(None));
    let delivered_at = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&latest);
    let delivered = Arc::clone(&delivered_at);

    let config = &state.config.tracking;
    let handle = start_tracking(config, config.jitter_feed(None), move |u: &TrackingUpdate| {
        if u.state.is_terminal() {
            *lock(&delivered) = Some(tokio::time::Instant::now());
        }
        *lock(&sink) = Some(u.clone());
    });

    lock(&state.sessions).insert(id, TrackingSession { handle, latest, delivered_at });
    tracing::info!(id, "tracking session started");

    (
        StatusCode::CREATED,
        Json(TrackingStarted { id, interval_ms: config.interval_ms }),
    )
}

pub async fn tracking_get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<TrackingView>, ApiError> {
    let sessions = lock(&state.sessions);
    let session = sessions
        .get(&id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Tracking session {} not found", id)))?;
    let update = lock(&session.latest).clone();
    Ok(Json(TrackingView {
        id,
        active: session.handle.is_active(),
        update,
    }))
}

pub async fn tracking_stop(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    let mut session = lock(&state.sessions)
        .remove(&id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Tracking session {} not found", id)))?;
    session.handle.cancel();
    tracing::info!(id, "tracking session stopped");
    Ok(StatusCode::NO_CONTENT)
}

// ─── /api/errands ────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ErrandList {
    pub errands: Vec<Errand>,
    pub summary: BoardSummary,
}

#[derive(Deserialize)]
pub struct CounterOffer {
    pub price: f64,
}

pub async fn errands_list(State(state): State<Arc<AppState>>) -> Json<ErrandList> {
    let board = lock(&state.board);
    Json(ErrandList {
        errands: board.list().into_iter().cloned().collect(),
        summary: board.summary(),
    })
}

pub async fn errand_submit(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ErrandRequest>,
) -> Result<(StatusCode, Json<Errand>), ApiError> {
    let start = Instant::now();
    let errand = lock(&state.board).submit(request)?.clone();
    log_request("/api/errands", &format!("#{} submitted", errand.id), start);
    Ok((StatusCode::CREATED, Json(errand)))
}

pub async fn errand_accept(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ErrandId>,
) -> Result<Json<Errand>, ApiError> {
    Ok(Json(lock(&state.board).accept(id)?.clone()))
}

pub async fn errand_counter(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ErrandId>,
    Json(offer): Json<CounterOffer>,
) -> Result<Json<Errand>, ApiError> {
    Ok(Json(lock(&state.board).counter_offer(id, offer.price)?.clone()))
}

pub async fn errand_complete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ErrandId>,
) -> Result<Json<Errand>, ApiError> {
    Ok(Json(lock(&state.board).complete(id)?.clone()))
}

pub async fn errand_reject(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ErrandId>,
) -> Result<StatusCode, ApiError> {
    lock(&state.board).reject(id)?;
    Ok(StatusCode::NO_CONTENT)
}
