use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::pipeline::{PipelineError, SOURCE_HEADER};
use crate::refresh::RefreshError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("group not found")]
    NotFound,

    #[error("lookup failed: {0}")]
    Lookup(#[from] PipelineError),

    #[error("refresh failed: {0}")]
    Refresh(#[from] RefreshError),
}

/// Client-facing error body. Internal detail stays in the logs.
#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            GatewayError::NotFound => (StatusCode::NOT_FOUND, "Not Found"),
            GatewayError::Lookup(_) | GatewayError::Refresh(_) => {
                tracing::error!(error = %self, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server Error")
            }
        };

        let mut headers = HeaderMap::new();
        if matches!(self, GatewayError::NotFound) {
            headers.insert(SOURCE_HEADER, HeaderValue::from_static("miss"));
        }

        (status, headers, Json(ErrorResponse { error: message })).into_response()
    }
}
