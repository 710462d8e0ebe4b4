use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::matching::NearbyWork;
use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::request::PickupRequest;
use crate::models::worker::{Availability, Worker, WorkerStats};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/workers", post(register_worker))
        .route("/workers/:id/stats", get(worker_stats))
        .route("/workers/:id/availability", patch(update_availability))
        .route("/workers/:id/nearby", get(nearby_work))
        .route("/workers/:id/claims/:request_id", post(claim_request))
        .route("/workers/:id/completions/:request_id", post(complete_request))
}

#[derive(Deserialize)]
pub struct RegisterWorkerRequest {
    pub name: String,
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub rating: f64,
}

#[derive(Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub status: String,
}

#[derive(Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    pub radius: Option<f64>,
}

async fn register_worker(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterWorkerRequest>,
) -> Result<Json<Worker>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    let location = payload
        .location
        .map(|point| GeoPoint::checked(point.lat, point.lng))
        .transpose()?;

    let worker = Worker {
        id: Uuid::new_v4(),
        name: payload.name,
        location,
        availability: Availability::Offline,
        rating: payload.rating.clamp(0.0, 5.0),
        updated_at: Utc::now(),
    };

    Ok(Json(state.matching.register_worker(worker).await?))
}

async fn worker_stats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkerStats>, AppError> {
    Ok(Json(state.matching.worker_stats(id).await?))
}

async fn update_availability(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAvailabilityRequest>,
) -> Result<Json<Worker>, AppError> {
    Ok(Json(state.matching.set_availability(id, &payload.status).await?))
}

async fn nearby_work(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<NearbyWork>, AppError> {
    let work = state
        .matching
        .get_nearby_work(id, query.lat, query.lng, query.radius)
        .await?;

    Ok(Json(work))
}

async fn claim_request(
    State(state): State<Arc<AppState>>,
    Path((id, request_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<PickupRequest>, AppError> {
    Ok(Json(state.matching.claim_work(id, request_id).await?))
}

async fn complete_request(
    State(state): State<Arc<AppState>>,
    Path((id, request_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<PickupRequest>, AppError> {
    Ok(Json(state.matching.complete_work(id, request_id).await?))
}
