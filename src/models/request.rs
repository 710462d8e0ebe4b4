use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::geo::GeoPoint;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Completed,
    Canceled,
}

/// A pickup request. `collector_id` is set once by a claim; after the request
/// leaves `Pending` neither it nor `status` changes again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub collector_id: Option<Uuid>,
    pub items: Value,
    pub status: RequestStatus,
    pub location: Option<GeoPoint>,
    pub address: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

impl PickupRequest {
    pub fn new(requester_id: Uuid, items: Value, location: Option<GeoPoint>) -> Self {
        Self {
            id: Uuid::new_v4(),
            requester_id,
            collector_id: None,
            items,
            status: RequestStatus::Pending,
            location,
            address: None,
            scheduled_at: None,
            completed_at: None,
            priority: Priority::Normal,
            metadata: Value::Null,
            created_at: Utc::now(),
        }
    }

    /// Pending with nobody assigned yet.
    pub fn is_open(&self) -> bool {
        self.status == RequestStatus::Pending && self.collector_id.is_none()
    }

    /// Claimed by `worker_id` and awaiting pickup.
    pub fn is_active_for(&self, worker_id: Uuid) -> bool {
        self.status == RequestStatus::Pending && self.collector_id == Some(worker_id)
    }
}
