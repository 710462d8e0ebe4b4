use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::engine::aggregation::MaterialTotals;
use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::request::{PickupRequest, Priority, RequestStatus};
use crate::state::AppState;
use crate::store::RequestFilter;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/requests", post(create_request))
        .route("/requests/stats/materials", get(material_report))
        .route("/requests/:id", get(get_request))
        .route("/requests/:id/cancel", post(cancel_request))
}

#[derive(Deserialize)]
pub struct CreatePickupRequest {
    pub requester_id: Uuid,
    #[serde(default)]
    pub items: Value,
    pub location: Option<GeoPoint>,
    pub address: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub metadata: Value,
}

#[derive(Deserialize)]
pub struct MaterialReportQuery {
    pub status: Option<RequestStatus>,
    pub requester_id: Option<Uuid>,
}

async fn create_request(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreatePickupRequest>,
) -> Result<Json<PickupRequest>, AppError> {
    let location = payload
        .location
        .map(|point| GeoPoint::checked(point.lat, point.lng))
        .transpose()?;

    let mut request = PickupRequest::new(payload.requester_id, payload.items, location);
    request.address = payload.address;
    request.scheduled_at = payload.scheduled_at;
    request.priority = payload.priority;
    request.metadata = payload.metadata;

    Ok(Json(state.matching.submit_request(request).await?))
}

async fn get_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<PickupRequest>, AppError> {
    Ok(Json(state.matching.find_request(id).await?))
}

async fn cancel_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<PickupRequest>, AppError> {
    Ok(Json(state.matching.cancel_request(id).await?))
}

async fn material_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MaterialReportQuery>,
) -> Result<Json<MaterialTotals>, AppError> {
    let filter = RequestFilter {
        status: query.status,
        requester_id: query.requester_id,
        ..RequestFilter::default()
    };

    Ok(Json(state.matching.material_report(&filter).await?))
}
