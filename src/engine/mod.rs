pub mod aggregation;
pub mod claims;
pub mod matching;
pub mod proximity;

use std::future::Future;
use std::time::Duration;

use crate::error::StoreError;
use crate::observability::metrics::Metrics;
use crate::store::RecordStore;

/// Runs a store call under `timeout`, flattening both failure modes into a
/// message for the caller's generic error kind.
pub(crate) async fn bounded<T, F>(timeout: Duration, call: F) -> Result<T, String>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result.map_err(|err| err.to_string()),
        Err(_) => Err(format!(
            "store call timed out after {} ms",
            timeout.as_millis()
        )),
    }
}

/// Re-reads the open request count into the `open_requests` gauge. Runs after
/// a write has already committed, so a failed read only leaves the gauge stale.
pub(crate) async fn refresh_open_requests(
    store: &dyn RecordStore,
    metrics: &Metrics,
    timeout: Duration,
) {
    match bounded(timeout, store.count_open_requests()).await {
        Ok(open) => metrics.open_requests.set(open as i64),
        Err(err) => tracing::warn!(error = %err, "open request gauge not refreshed"),
    }
}
