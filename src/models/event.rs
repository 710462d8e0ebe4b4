use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RequestEventKind {
    Claimed,
    Completed,
    Canceled,
}

/// Lifecycle transition broadcast to `/ws` subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestEvent {
    pub kind: RequestEventKind,
    pub request_id: Uuid,
    pub worker_id: Option<Uuid>,
    pub at: DateTime<Utc>,
}
