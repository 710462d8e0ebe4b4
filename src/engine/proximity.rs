use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::engine::bounded;
use crate::error::DispatchError;
use crate::geo::GeoPoint;
use crate::observability::metrics::Metrics;
use crate::store::{NearbyRequest, RecordStore};

pub const DEFAULT_RADIUS_METERS: f64 = 5_000.0;

/// Answers "which open requests are near this worker".
#[derive(Clone)]
pub struct ProximityIndex {
    store: Arc<dyn RecordStore>,
    default_radius_meters: f64,
    timeout: Duration,
    metrics: Metrics,
}

impl ProximityIndex {
    pub fn new(
        store: Arc<dyn RecordStore>,
        default_radius_meters: f64,
        timeout: Duration,
        metrics: Metrics,
    ) -> Self {
        Self {
            store,
            default_radius_meters,
            timeout,
            metrics,
        }
    }

    /// Records the worker's position, then returns open requests within
    /// `radius_meters` (or the configured default), nearest first. Equal
    /// distances keep creation order.
    pub async fn find_nearby(
        &self,
        worker_id: Uuid,
        lat: f64,
        lng: f64,
        radius_meters: Option<f64>,
    ) -> Result<Vec<NearbyRequest>, DispatchError> {
        let origin = GeoPoint::checked(lat, lng)?;
        let radius = radius_meters.unwrap_or(self.default_radius_meters);
        if !radius.is_finite() || radius <= 0.0 {
            return Err(DispatchError::InvalidRadius(radius));
        }

        let start = Instant::now();
        let result = bounded(
            self.timeout,
            self.store.reposition_and_find_open(worker_id, origin, radius),
        )
        .await;
        let elapsed = start.elapsed().as_secs_f64();

        let mut nearby = match result {
            Ok(nearby) => nearby,
            Err(reason) => {
                self.metrics
                    .nearby_query_latency_seconds
                    .with_label_values(&["error"])
                    .observe(elapsed);
                warn!(worker_id = %worker_id, error = %reason, "nearby lookup failed");
                return Err(DispatchError::LocationQueryFailed(reason));
            }
        };

        nearby.sort_by(|a, b| {
            a.distance_meters
                .total_cmp(&b.distance_meters)
                .then_with(|| a.request.created_at.cmp(&b.request.created_at))
                .then_with(|| a.request.id.cmp(&b.request.id))
        });

        self.metrics
            .nearby_query_latency_seconds
            .with_label_values(&["success"])
            .observe(elapsed);
        self.metrics.nearby_results.observe(nearby.len() as f64);

        debug!(
            worker_id = %worker_id,
            radius_meters = radius,
            results = nearby.len(),
            "nearby lookup"
        );

        Ok(nearby)
    }
}
