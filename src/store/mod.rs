pub mod memory;

#[cfg(test)]
pub(crate) mod faulty;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::geo::GeoPoint;
use crate::models::request::{PickupRequest, RequestStatus};
use crate::models::worker::{Availability, Worker};

/// An open request within the search radius and its unrounded distance.
#[derive(Debug, Clone)]
pub struct NearbyRequest {
    pub request: PickupRequest,
    pub distance_meters: f64,
}

/// Result of the conditional `collector_id: None -> Some(worker)` update.
#[derive(Debug, Clone)]
pub enum ClaimOutcome {
    Claimed(PickupRequest),
    AlreadyClaimed,
    Closed(RequestStatus),
    NotFound,
}

#[derive(Debug, Clone)]
pub enum CompleteOutcome {
    Completed(PickupRequest),
    /// Completed earlier by the same worker; returned untouched.
    AlreadyCompleted(PickupRequest),
    /// Missing, unclaimed, or claimed by another worker.
    NotOwner,
    Canceled,
}

#[derive(Debug, Clone)]
pub enum CancelOutcome {
    Canceled(PickupRequest),
    AlreadyCanceled(PickupRequest),
    Completed,
    NotFound,
}

#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub requester_id: Option<Uuid>,
    pub collector_id: Option<Uuid>,
    pub completed_since: Option<DateTime<Utc>>,
}

impl RequestFilter {
    pub fn matches(&self, request: &PickupRequest) -> bool {
        self.status.is_none_or(|status| request.status == status)
            && self
                .requester_id
                .is_none_or(|id| request.requester_id == id)
            && self
                .collector_id
                .is_none_or(|id| request.collector_id == Some(id))
            && self
                .completed_since
                .is_none_or(|since| request.completed_at.is_some_and(|at| at >= since))
    }
}

/// Transactional record store for requests and workers.
///
/// Every method is one logical unit: it either applies fully or not at all.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert_request(&self, request: PickupRequest) -> Result<PickupRequest, StoreError>;

    async fn get_request(&self, id: Uuid) -> Result<Option<PickupRequest>, StoreError>;

    async fn list_requests(&self, filter: &RequestFilter)
        -> Result<Vec<PickupRequest>, StoreError>;

    async fn count_requests(&self) -> Result<usize, StoreError>;

    /// Pending requests nobody has claimed yet.
    async fn count_open_requests(&self) -> Result<usize, StoreError>;

    /// Overwrites the worker's position (creating an online worker when the id
    /// is unknown), then returns every open request with a location whose
    /// geodesic distance to `origin` is within `radius_meters`.
    async fn reposition_and_find_open(
        &self,
        worker_id: Uuid,
        origin: GeoPoint,
        radius_meters: f64,
    ) -> Result<Vec<NearbyRequest>, StoreError>;

    async fn claim_request(
        &self,
        request_id: Uuid,
        worker_id: Uuid,
    ) -> Result<ClaimOutcome, StoreError>;

    async fn complete_request(
        &self,
        request_id: Uuid,
        worker_id: Uuid,
        completed_at: DateTime<Utc>,
    ) -> Result<CompleteOutcome, StoreError>;

    async fn cancel_request(&self, request_id: Uuid) -> Result<CancelOutcome, StoreError>;

    async fn upsert_worker(&self, worker: Worker) -> Result<Worker, StoreError>;

    async fn get_worker(&self, id: Uuid) -> Result<Option<Worker>, StoreError>;

    async fn count_workers(&self) -> Result<usize, StoreError>;

    /// `None` when the worker does not exist.
    async fn set_availability(
        &self,
        worker_id: Uuid,
        availability: Availability,
    ) -> Result<Option<Worker>, StoreError>;
}
