use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::geo::GeoPoint;
use crate::models::request::PickupRequest;
use crate::models::worker::{Availability, Worker};
use crate::store::memory::InMemoryStore;
use crate::store::{
    CancelOutcome, ClaimOutcome, CompleteOutcome, NearbyRequest, RecordStore, RequestFilter,
};

#[derive(Debug, Clone, Copy)]
pub enum Fault {
    Unavailable,
    Stall(Duration),
}

/// Wraps an [`InMemoryStore`] and fails or stalls every call before it
/// reaches the inner store. Tests seed and inspect through `inner`.
pub struct FaultyStore {
    pub inner: InMemoryStore,
    fault: Fault,
}

impl FaultyStore {
    pub fn new(fault: Fault) -> Self {
        Self {
            inner: InMemoryStore::new(),
            fault,
        }
    }

    async fn trip(&self) -> Result<(), StoreError> {
        match self.fault {
            Fault::Unavailable => Err(StoreError::Unavailable("injected fault".to_string())),
            Fault::Stall(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }
}

#[async_trait]
impl RecordStore for FaultyStore {
    async fn insert_request(&self, request: PickupRequest) -> Result<PickupRequest, StoreError> {
        self.trip().await?;
        self.inner.insert_request(request).await
    }

    async fn get_request(&self, id: Uuid) -> Result<Option<PickupRequest>, StoreError> {
        self.trip().await?;
        self.inner.get_request(id).await
    }

    async fn list_requests(
        &self,
        filter: &RequestFilter,
    ) -> Result<Vec<PickupRequest>, StoreError> {
        self.trip().await?;
        self.inner.list_requests(filter).await
    }

    async fn count_requests(&self) -> Result<usize, StoreError> {
        self.trip().await?;
        self.inner.count_requests().await
    }

    async fn count_open_requests(&self) -> Result<usize, StoreError> {
        self.trip().await?;
        self.inner.count_open_requests().await
    }

    async fn reposition_and_find_open(
        &self,
        worker_id: Uuid,
        origin: GeoPoint,
        radius_meters: f64,
    ) -> Result<Vec<NearbyRequest>, StoreError> {
        self.trip().await?;
        self.inner
            .reposition_and_find_open(worker_id, origin, radius_meters)
            .await
    }

    async fn claim_request(
        &self,
        request_id: Uuid,
        worker_id: Uuid,
    ) -> Result<ClaimOutcome, StoreError> {
        self.trip().await?;
        self.inner.claim_request(request_id, worker_id).await
    }

    async fn complete_request(
        &self,
        request_id: Uuid,
        worker_id: Uuid,
        completed_at: DateTime<Utc>,
    ) -> Result<CompleteOutcome, StoreError> {
        self.trip().await?;
        self.inner
            .complete_request(request_id, worker_id, completed_at)
            .await
    }

    async fn cancel_request(&self, request_id: Uuid) -> Result<CancelOutcome, StoreError> {
        self.trip().await?;
        self.inner.cancel_request(request_id).await
    }

    async fn upsert_worker(&self, worker: Worker) -> Result<Worker, StoreError> {
        self.trip().await?;
        self.inner.upsert_worker(worker).await
    }

    async fn get_worker(&self, id: Uuid) -> Result<Option<Worker>, StoreError> {
        self.trip().await?;
        self.inner.get_worker(id).await
    }

    async fn count_workers(&self) -> Result<usize, StoreError> {
        self.trip().await?;
        self.inner.count_workers().await
    }

    async fn set_availability(
        &self,
        worker_id: Uuid,
        availability: Availability,
    ) -> Result<Option<Worker>, StoreError> {
        self.trip().await?;
        self.inner.set_availability(worker_id, availability).await
    }
}
