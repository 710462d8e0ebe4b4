use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::aggregation::MaterialTotals;
use crate::error::DispatchError;
use crate::geo::GeoPoint;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Availability {
    Online,
    Offline,
    Busy,
}

impl FromStr for Availability {
    type Err = DispatchError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "online" => Ok(Availability::Online),
            "offline" => Ok(Availability::Offline),
            "busy" => Ok(Availability::Busy),
            _ => Err(DispatchError::InvalidAvailability(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub id: Uuid,
    pub name: String,
    pub location: Option<GeoPoint>,
    pub availability: Availability,
    pub rating: f64,
    pub updated_at: DateTime<Utc>,
}

impl Worker {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            location: None,
            availability: Availability::Offline,
            rating: 0.0,
            updated_at: Utc::now(),
        }
    }
}

/// Read-only view derived from a worker's completed requests.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerStats {
    pub worker_id: Uuid,
    pub availability: Availability,
    pub rating: f64,
    pub completed_today: usize,
    pub completed_lifetime: usize,
    pub collected: MaterialTotals,
}
