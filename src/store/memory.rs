use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::StoreError;
use crate::geo::{haversine_m, GeoPoint};
use crate::models::request::{PickupRequest, RequestStatus};
use crate::models::worker::{Availability, Worker};
use crate::store::{
    CancelOutcome, ClaimOutcome, CompleteOutcome, NearbyRequest, RecordStore, RequestFilter,
};

/// DashMap-backed store. Each conditional update runs under the entry's shard
/// lock with no await point, so it is atomic with respect to other callers and
/// to task cancellation.
#[derive(Default)]
pub struct InMemoryStore {
    requests: DashMap<Uuid, PickupRequest>,
    workers: DashMap<Uuid, Worker>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn insert_request(&self, request: PickupRequest) -> Result<PickupRequest, StoreError> {
        self.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn get_request(&self, id: Uuid) -> Result<Option<PickupRequest>, StoreError> {
        Ok(self.requests.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list_requests(
        &self,
        filter: &RequestFilter,
    ) -> Result<Vec<PickupRequest>, StoreError> {
        let mut requests: Vec<PickupRequest> = self
            .requests
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        requests.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(requests)
    }

    async fn count_requests(&self) -> Result<usize, StoreError> {
        Ok(self.requests.len())
    }

    async fn count_open_requests(&self) -> Result<usize, StoreError> {
        Ok(self
            .requests
            .iter()
            .filter(|entry| entry.value().is_open())
            .count())
    }

    async fn reposition_and_find_open(
        &self,
        worker_id: Uuid,
        origin: GeoPoint,
        radius_meters: f64,
    ) -> Result<Vec<NearbyRequest>, StoreError> {
        {
            let now = Utc::now();
            let mut worker = self.workers.entry(worker_id).or_insert_with(|| {
                let mut worker = Worker::new(worker_id, "");
                worker.availability = Availability::Online;
                worker
            });
            worker.location = Some(origin);
            worker.updated_at = now;
        }

        let nearby = self
            .requests
            .iter()
            .filter(|entry| entry.value().is_open())
            .filter_map(|entry| {
                let request = entry.value();
                let location = request.location?;
                let distance_meters = haversine_m(&origin, &location);

                (distance_meters <= radius_meters).then(|| NearbyRequest {
                    request: request.clone(),
                    distance_meters,
                })
            })
            .collect();

        Ok(nearby)
    }

    async fn claim_request(
        &self,
        request_id: Uuid,
        worker_id: Uuid,
    ) -> Result<ClaimOutcome, StoreError> {
        let Some(mut request) = self.requests.get_mut(&request_id) else {
            return Ok(ClaimOutcome::NotFound);
        };

        if request.collector_id.is_some() {
            return Ok(ClaimOutcome::AlreadyClaimed);
        }
        if request.status != RequestStatus::Pending {
            return Ok(ClaimOutcome::Closed(request.status));
        }

        request.collector_id = Some(worker_id);
        Ok(ClaimOutcome::Claimed(request.clone()))
    }

    async fn complete_request(
        &self,
        request_id: Uuid,
        worker_id: Uuid,
        completed_at: DateTime<Utc>,
    ) -> Result<CompleteOutcome, StoreError> {
        let Some(mut request) = self.requests.get_mut(&request_id) else {
            return Ok(CompleteOutcome::NotOwner);
        };

        if request.collector_id != Some(worker_id) {
            return Ok(CompleteOutcome::NotOwner);
        }

        match request.status {
            RequestStatus::Pending => {
                request.status = RequestStatus::Completed;
                request.completed_at = Some(completed_at);
                Ok(CompleteOutcome::Completed(request.clone()))
            }
            RequestStatus::Completed => Ok(CompleteOutcome::AlreadyCompleted(request.clone())),
            RequestStatus::Canceled => Ok(CompleteOutcome::Canceled),
        }
    }

    async fn cancel_request(&self, request_id: Uuid) -> Result<CancelOutcome, StoreError> {
        let Some(mut request) = self.requests.get_mut(&request_id) else {
            return Ok(CancelOutcome::NotFound);
        };

        match request.status {
            RequestStatus::Pending => {
                request.status = RequestStatus::Canceled;
                Ok(CancelOutcome::Canceled(request.clone()))
            }
            RequestStatus::Canceled => Ok(CancelOutcome::AlreadyCanceled(request.clone())),
            RequestStatus::Completed => Ok(CancelOutcome::Completed),
        }
    }

    async fn upsert_worker(&self, worker: Worker) -> Result<Worker, StoreError> {
        self.workers.insert(worker.id, worker.clone());
        Ok(worker)
    }

    async fn get_worker(&self, id: Uuid) -> Result<Option<Worker>, StoreError> {
        Ok(self.workers.get(&id).map(|entry| entry.value().clone()))
    }

    async fn count_workers(&self) -> Result<usize, StoreError> {
        Ok(self.workers.len())
    }

    async fn set_availability(
        &self,
        worker_id: Uuid,
        availability: Availability,
    ) -> Result<Option<Worker>, StoreError> {
        let Some(mut worker) = self.workers.get_mut(&worker_id) else {
            return Ok(None);
        };

        worker.availability = availability;
        worker.updated_at = Utc::now();
        Ok(Some(worker.clone()))
    }
}
