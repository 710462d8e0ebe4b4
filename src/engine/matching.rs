use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::aggregation::{self, MaterialTotals};
use crate::engine::{bounded, refresh_open_requests};
use crate::engine::claims::ClaimCoordinator;
use crate::engine::proximity::{ProximityIndex, DEFAULT_RADIUS_METERS};
use crate::error::DispatchError;
use crate::geo::{display_km, format_distance};
use crate::models::event::RequestEvent;
use crate::models::request::{PickupRequest, Priority, RequestStatus};
use crate::models::worker::{Worker, WorkerStats};
use crate::observability::metrics::Metrics;
use crate::store::{NearbyRequest, RecordStore, RequestFilter};

pub const ADDRESS_NOT_SET: &str = "address not set";
pub const UNSPECIFIED_ITEM: &str = "unspecified";

#[derive(Debug, Clone)]
pub struct MatchingSettings {
    pub default_radius_meters: f64,
    pub store_timeout: Duration,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            default_radius_meters: DEFAULT_RADIUS_METERS,
            store_timeout: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NearbyJob {
    pub request_id: Uuid,
    pub requester_id: Uuid,
    pub primary_item: String,
    pub address: String,
    pub distance_meters: f64,
    pub distance_km: f64,
    pub distance_label: String,
    pub total_weight: f64,
    pub priority: Priority,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<NearbyRequest> for NearbyJob {
    fn from(nearby: NearbyRequest) -> Self {
        let request = nearby.request;
        Self {
            request_id: request.id,
            requester_id: request.requester_id,
            primary_item: primary_item(&request),
            address: display_address(&request),
            distance_meters: nearby.distance_meters,
            distance_km: display_km(nearby.distance_meters),
            distance_label: format_distance(nearby.distance_meters),
            total_weight: aggregation::items_weight(&request.items),
            priority: request.priority,
            scheduled_at: request.scheduled_at,
            created_at: request.created_at,
        }
    }
}

/// A request the worker has claimed but not completed yet.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveJob {
    pub request_id: Uuid,
    pub requester_id: Uuid,
    pub primary_item: String,
    pub address: String,
    pub total_weight: f64,
    pub priority: Priority,
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl From<PickupRequest> for ActiveJob {
    fn from(request: PickupRequest) -> Self {
        Self {
            request_id: request.id,
            requester_id: request.requester_id,
            primary_item: primary_item(&request),
            address: display_address(&request),
            total_weight: aggregation::items_weight(&request.items),
            priority: request.priority,
            scheduled_at: request.scheduled_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NearbyWork {
    pub nearby: Vec<NearbyJob>,
    pub active: Vec<ActiveJob>,
}

fn primary_item(request: &PickupRequest) -> String {
    aggregation::primary_material(&request.items).unwrap_or_else(|| UNSPECIFIED_ITEM.to_string())
}

fn display_address(request: &PickupRequest) -> String {
    request
        .address
        .as_deref()
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .unwrap_or(ADDRESS_NOT_SET)
        .to_string()
}

/// Worker-facing entry point over the proximity index and claim coordinator.
/// Shapes data for callers; every rule lives in the components it wraps.
#[derive(Clone)]
pub struct MatchingService {
    store: Arc<dyn RecordStore>,
    proximity: ProximityIndex,
    claims: ClaimCoordinator,
    metrics: Metrics,
    timeout: Duration,
}

impl MatchingService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        settings: MatchingSettings,
        metrics: Metrics,
        events_tx: broadcast::Sender<RequestEvent>,
    ) -> Self {
        let proximity = ProximityIndex::new(
            store.clone(),
            settings.default_radius_meters,
            settings.store_timeout,
            metrics.clone(),
        );
        let claims = ClaimCoordinator::new(
            store.clone(),
            settings.store_timeout,
            metrics.clone(),
            events_tx,
        );

        Self {
            store,
            proximity,
            claims,
            metrics,
            timeout: settings.store_timeout,
        }
    }

    /// Stores a new request as open. A timeout abandons the insert before it
    /// is applied, so a failed submission never leaves a record behind.
    pub async fn submit_request(
        &self,
        request: PickupRequest,
    ) -> Result<PickupRequest, DispatchError> {
        let request_id = request.id;
        let request = bounded(self.timeout, self.store.insert_request(request))
            .await
            .map_err(|reason| {
                warn!(request_id = %request_id, error = %reason, "request submission failed");
                DispatchError::SubmissionFailed(reason)
            })?;

        info!(request_id = %request.id, requester_id = %request.requester_id, "request submitted");
        refresh_open_requests(self.store.as_ref(), &self.metrics, self.timeout).await;
        Ok(request)
    }

    pub async fn find_request(&self, request_id: Uuid) -> Result<PickupRequest, DispatchError> {
        bounded(self.timeout, self.store.get_request(request_id))
            .await
            .map_err(DispatchError::LookupFailed)?
            .ok_or(DispatchError::RequestNotFound(request_id))
    }

    pub async fn register_worker(&self, worker: Worker) -> Result<Worker, DispatchError> {
        let worker_id = worker.id;
        let worker = bounded(self.timeout, self.store.upsert_worker(worker))
            .await
            .map_err(|reason| {
                warn!(worker_id = %worker_id, error = %reason, "worker registration failed");
                DispatchError::RegistrationFailed(reason)
            })?;

        info!(worker_id = %worker.id, "worker registered");
        Ok(worker)
    }

    /// Worker and request counts, in that order.
    pub async fn record_counts(&self) -> Result<(usize, usize), DispatchError> {
        let workers = bounded(self.timeout, self.store.count_workers())
            .await
            .map_err(DispatchError::LookupFailed)?;
        let requests = bounded(self.timeout, self.store.count_requests())
            .await
            .map_err(DispatchError::LookupFailed)?;

        Ok((workers, requests))
    }

    pub async fn get_nearby_work(
        &self,
        worker_id: Uuid,
        lat: f64,
        lng: f64,
        radius_meters: Option<f64>,
    ) -> Result<NearbyWork, DispatchError> {
        let nearby = self
            .proximity
            .find_nearby(worker_id, lat, lng, radius_meters)
            .await?;

        let filter = RequestFilter {
            status: Some(RequestStatus::Pending),
            collector_id: Some(worker_id),
            ..RequestFilter::default()
        };
        let active = bounded(self.timeout, self.store.list_requests(&filter))
            .await
            .map_err(DispatchError::LocationQueryFailed)?;

        Ok(NearbyWork {
            nearby: nearby.into_iter().map(NearbyJob::from).collect(),
            active: active.into_iter().map(ActiveJob::from).collect(),
        })
    }

    pub async fn claim_work(
        &self,
        worker_id: Uuid,
        request_id: Uuid,
    ) -> Result<PickupRequest, DispatchError> {
        self.claims.claim(worker_id, request_id).await
    }

    pub async fn complete_work(
        &self,
        worker_id: Uuid,
        request_id: Uuid,
    ) -> Result<PickupRequest, DispatchError> {
        self.claims.complete(worker_id, request_id).await
    }

    pub async fn cancel_request(&self, request_id: Uuid) -> Result<PickupRequest, DispatchError> {
        self.claims.cancel(request_id).await
    }

    pub async fn set_availability(
        &self,
        worker_id: Uuid,
        status: &str,
    ) -> Result<Worker, DispatchError> {
        self.claims.set_availability(worker_id, status).await
    }

    pub async fn worker_stats(&self, worker_id: Uuid) -> Result<WorkerStats, DispatchError> {
        let worker = bounded(self.timeout, self.store.get_worker(worker_id))
            .await
            .map_err(DispatchError::ReportFailed)?
            .ok_or(DispatchError::WorkerNotFound(worker_id))?;

        let filter = RequestFilter {
            status: Some(RequestStatus::Completed),
            collector_id: Some(worker_id),
            ..RequestFilter::default()
        };
        let completed = bounded(self.timeout, self.store.list_requests(&filter))
            .await
            .map_err(DispatchError::ReportFailed)?;

        let start_of_day = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();
        let completed_today = completed
            .iter()
            .filter(|request| request.completed_at.is_some_and(|at| at >= start_of_day))
            .count();

        Ok(WorkerStats {
            worker_id,
            availability: worker.availability,
            rating: worker.rating,
            completed_today,
            completed_lifetime: completed.len(),
            collected: aggregation::weight_by_material(&completed),
        })
    }

    pub async fn material_report(
        &self,
        filter: &RequestFilter,
    ) -> Result<MaterialTotals, DispatchError> {
        let requests = bounded(self.timeout, self.store.list_requests(filter))
            .await
            .map_err(DispatchError::ReportFailed)?;

        Ok(aggregation::weight_by_material(&requests))
    }
}
