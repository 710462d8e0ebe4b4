use std::sync::Arc;

use tokio::sync::broadcast;

use crate::engine::matching::{MatchingService, MatchingSettings};
use crate::models::event::RequestEvent;
use crate::observability::metrics::Metrics;
use crate::store::RecordStore;

pub struct AppState {
    pub matching: MatchingService,
    pub events_tx: broadcast::Sender<RequestEvent>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RecordStore>,
        settings: MatchingSettings,
        event_buffer_size: usize,
    ) -> Self {
        let (events_tx, _unused_rx) = broadcast::channel(event_buffer_size);
        let metrics = Metrics::new();
        let matching =
            MatchingService::new(store, settings, metrics.clone(), events_tx.clone());

        Self {
            matching,
            events_tx,
            metrics,
        }
    }
}
