use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Failure of a single upstream request. Every variant is transient from the
/// sync job's point of view: the page is abandoned and counted.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream returned {status} for {endpoint}")]
    Status { status: u16, endpoint: String },
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("sync aborted after {failures} failed pages ({written} records written)")]
    FailureCeiling { failures: u32, written: u64 },
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("catalog store error: {0}")]
    Store(#[from] sea_orm::DbErr),
}

/// Serving-path error. Only the message of `NotFound` and `Validation` reaches
/// the client; internal causes are logged.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Internal(anyhow::Error::new(err))
    }
}

impl From<UpstreamError> for AppError {
    fn from(err: UpstreamError) -> Self {
        Self::Internal(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong while loading movies".to_string(),
                )
            },
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
