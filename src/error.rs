use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Failure reported by a [`crate::store::RecordStore`] implementation.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

/// Caller-visible failures of the matching core. None of these are retried
/// internally.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DispatchError {
    #[error("invalid coordinates: lat={lat}, lng={lng}")]
    InvalidCoordinates { lat: f64, lng: f64 },

    #[error("invalid search radius: {0}")]
    InvalidRadius(f64),

    #[error("location query failed: {0}")]
    LocationQueryFailed(String),

    #[error("request {0} not found")]
    RequestNotFound(Uuid),

    #[error("request {0} is already claimed")]
    RequestAlreadyClaimed(Uuid),

    #[error("request {0} is no longer open")]
    RequestClosed(Uuid),

    #[error("not allowed to complete request {0}")]
    UnauthorizedCompletion(Uuid),

    #[error("claim failed: {0}")]
    ClaimFailed(String),

    #[error("completion failed: {0}")]
    CompletionFailed(String),

    #[error("cancellation failed: {0}")]
    CancellationFailed(String),

    #[error("invalid availability: {0}")]
    InvalidAvailability(String),

    #[error("worker {0} not found")]
    WorkerNotFound(Uuid),

    #[error("availability update failed: {0}")]
    AvailabilityUpdateFailed(String),

    #[error("report query failed: {0}")]
    ReportFailed(String),

    #[error("request submission failed: {0}")]
    SubmissionFailed(String),

    #[error("worker registration failed: {0}")]
    RegistrationFailed(String),

    #[error("record lookup failed: {0}")]
    LookupFailed(String),
}

impl DispatchError {
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::InvalidCoordinates { .. } => "InvalidCoordinates",
            DispatchError::InvalidRadius(_) => "InvalidRadius",
            DispatchError::LocationQueryFailed(_) => "LocationQueryFailed",
            DispatchError::RequestNotFound(_) => "RequestNotFound",
            DispatchError::RequestAlreadyClaimed(_) => "RequestAlreadyClaimed",
            DispatchError::RequestClosed(_) => "RequestClosed",
            DispatchError::UnauthorizedCompletion(_) => "UnauthorizedCompletion",
            DispatchError::ClaimFailed(_) => "ClaimFailed",
            DispatchError::CompletionFailed(_) => "CompletionFailed",
            DispatchError::CancellationFailed(_) => "CancellationFailed",
            DispatchError::InvalidAvailability(_) => "InvalidAvailability",
            DispatchError::WorkerNotFound(_) => "WorkerNotFound",
            DispatchError::AvailabilityUpdateFailed(_) => "AvailabilityUpdateFailed",
            DispatchError::ReportFailed(_) => "ReportFailed",
            DispatchError::SubmissionFailed(_) => "SubmissionFailed",
            DispatchError::RegistrationFailed(_) => "RegistrationFailed",
            DispatchError::LookupFailed(_) => "LookupFailed",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::InvalidCoordinates { .. }
            | DispatchError::InvalidRadius(_)
            | DispatchError::InvalidAvailability(_) => StatusCode::BAD_REQUEST,
            DispatchError::RequestNotFound(_) | DispatchError::WorkerNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            DispatchError::RequestAlreadyClaimed(_) | DispatchError::RequestClosed(_) => {
                StatusCode::CONFLICT
            }
            DispatchError::UnauthorizedCompletion(_) => StatusCode::FORBIDDEN,
            DispatchError::LocationQueryFailed(_)
            | DispatchError::ClaimFailed(_)
            | DispatchError::CompletionFailed(_)
            | DispatchError::CancellationFailed(_)
            | DispatchError::AvailabilityUpdateFailed(_)
            | DispatchError::ReportFailed(_)
            | DispatchError::SubmissionFailed(_)
            | DispatchError::RegistrationFailed(_)
            | DispatchError::LookupFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match &self {
            AppError::Dispatch(err) => (err.status_code(), err.kind(), err.to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BadRequest", msg.clone()),
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal", msg.clone())
            }
        };

        let body = Json(json!({
            "error": message,
            "kind": kind
        }));

        (status, body).into_response()
    }
}
