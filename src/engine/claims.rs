use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use prometheus::IntCounterVec;
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::{bounded, refresh_open_requests};
use crate::error::DispatchError;
use crate::models::event::{RequestEvent, RequestEventKind};
use crate::models::request::PickupRequest;
use crate::models::worker::{Availability, Worker};
use crate::observability::metrics::Metrics;
use crate::store::{CancelOutcome, ClaimOutcome, CompleteOutcome, RecordStore};

/// Drives a request through `open -> claimed -> completed` (or `canceled`)
/// using conditional updates in the store, so concurrent claims on one request
/// produce exactly one winner.
#[derive(Clone)]
pub struct ClaimCoordinator {
    store: Arc<dyn RecordStore>,
    timeout: Duration,
    metrics: Metrics,
    events_tx: broadcast::Sender<RequestEvent>,
}

impl ClaimCoordinator {
    pub fn new(
        store: Arc<dyn RecordStore>,
        timeout: Duration,
        metrics: Metrics,
        events_tx: broadcast::Sender<RequestEvent>,
    ) -> Self {
        Self {
            store,
            timeout,
            metrics,
            events_tx,
        }
    }

    pub async fn claim(
        &self,
        worker_id: Uuid,
        request_id: Uuid,
    ) -> Result<PickupRequest, DispatchError> {
        let outcome = bounded(self.timeout, self.store.claim_request(request_id, worker_id))
            .await
            .map_err(|reason| {
                warn!(
                    request_id = %request_id,
                    worker_id = %worker_id,
                    error = %reason,
                    "claim failed"
                );
                DispatchError::ClaimFailed(reason)
            });

        let result = match outcome {
            Ok(ClaimOutcome::Claimed(request)) => Ok(request),
            Ok(ClaimOutcome::AlreadyClaimed) => {
                Err(DispatchError::RequestAlreadyClaimed(request_id))
            }
            Ok(ClaimOutcome::Closed(_)) => Err(DispatchError::RequestClosed(request_id)),
            Ok(ClaimOutcome::NotFound) => Err(DispatchError::RequestNotFound(request_id)),
            Err(err) => Err(err),
        };

        record(&self.metrics.claims_total, &result);

        let request = result?;
        info!(request_id = %request_id, worker_id = %worker_id, "request claimed");
        self.publish(RequestEventKind::Claimed, request_id, Some(worker_id));
        refresh_open_requests(self.store.as_ref(), &self.metrics, self.timeout).await;
        Ok(request)
    }

    /// Marks a claimed request completed. Repeating the call after success
    /// returns the stored request unchanged.
    pub async fn complete(
        &self,
        worker_id: Uuid,
        request_id: Uuid,
    ) -> Result<PickupRequest, DispatchError> {
        let outcome = bounded(
            self.timeout,
            self.store.complete_request(request_id, worker_id, Utc::now()),
        )
        .await
        .map_err(|reason| {
            warn!(
                request_id = %request_id,
                worker_id = %worker_id,
                error = %reason,
                "completion failed"
            );
            DispatchError::CompletionFailed(reason)
        });

        let (result, fresh) = match outcome {
            Ok(CompleteOutcome::Completed(request)) => (Ok(request), true),
            Ok(CompleteOutcome::AlreadyCompleted(request)) => (Ok(request), false),
            Ok(CompleteOutcome::NotOwner) => {
                (Err(DispatchError::UnauthorizedCompletion(request_id)), false)
            }
            Ok(CompleteOutcome::Canceled) => {
                (Err(DispatchError::RequestClosed(request_id)), false)
            }
            Err(err) => (Err(err), false),
        };

        record(&self.metrics.completions_total, &result);

        let request = result?;
        if fresh {
            info!(request_id = %request_id, worker_id = %worker_id, "request completed");
            self.publish(RequestEventKind::Completed, request_id, Some(worker_id));
        }
        Ok(request)
    }

    /// Cancels an open or claimed request. Canceling twice is a no-op.
    pub async fn cancel(&self, request_id: Uuid) -> Result<PickupRequest, DispatchError> {
        let outcome = bounded(self.timeout, self.store.cancel_request(request_id))
            .await
            .map_err(DispatchError::CancellationFailed);

        let (result, fresh) = match outcome {
            Ok(CancelOutcome::Canceled(request)) => (Ok(request), true),
            Ok(CancelOutcome::AlreadyCanceled(request)) => (Ok(request), false),
            Ok(CancelOutcome::Completed) => {
                (Err(DispatchError::RequestClosed(request_id)), false)
            }
            Ok(CancelOutcome::NotFound) => {
                (Err(DispatchError::RequestNotFound(request_id)), false)
            }
            Err(err) => (Err(err), false),
        };

        record(&self.metrics.cancellations_total, &result);

        let request = result?;
        if fresh {
            info!(request_id = %request_id, "request canceled");
            self.publish(RequestEventKind::Canceled, request_id, request.collector_id);
            refresh_open_requests(self.store.as_ref(), &self.metrics, self.timeout).await;
        }
        Ok(request)
    }

    /// Held claims are left alone; going offline does not release them.
    pub async fn set_availability(
        &self,
        worker_id: Uuid,
        status: &str,
    ) -> Result<Worker, DispatchError> {
        let availability: Availability = status.parse()?;

        let worker = bounded(
            self.timeout,
            self.store.set_availability(worker_id, availability),
        )
        .await
        .map_err(DispatchError::AvailabilityUpdateFailed)?
        .ok_or(DispatchError::WorkerNotFound(worker_id))?;

        info!(worker_id = %worker_id, availability = ?availability, "availability updated");
        Ok(worker)
    }

    fn publish(&self, kind: RequestEventKind, request_id: Uuid, worker_id: Option<Uuid>) {
        let _ = self.events_tx.send(RequestEvent {
            kind,
            request_id,
            worker_id,
            at: Utc::now(),
        });
    }
}

fn record(counter: &IntCounterVec, result: &Result<PickupRequest, DispatchError>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(err) => err.kind(),
    };
    counter.with_label_values(&[outcome]).inc();
}
