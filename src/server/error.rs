use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::error::{FetchError, ServiceError};

const UPSTREAM_FAILED: &str = "Failed to fetch revisions from upstream";
const INTERNAL_FAILED: &str = "Failed to generate diff";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl From<FetchError> for ApiError {
    fn from(e: FetchError) -> Self {
        ApiError::Service(ServiceError::Fetch(e))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Service(ServiceError::Fetch(FetchError::RevisionNotFound(_))) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Service(ServiceError::Fetch(e)) if e.is_upstream_status() => {
                StatusCode::BAD_GATEWAY
            }
            ApiError::Service(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Upstream errors carry request urls; those stay in the log.
        let message = if status == StatusCode::BAD_GATEWAY {
            UPSTREAM_FAILED.to_string()
        } else if status.is_server_error() {
            INTERNAL_FAILED.to_string()
        } else {
            self.to_string()
        };
        if status.is_server_error() {
            error!(%status, "request failed: {self}");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}
