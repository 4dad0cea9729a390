use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, info, instrument};

use crate::gateway::error::GatewayError;
use crate::gateway::state::AppState;
use crate::group::GroupRecord;
use crate::pipeline::{LookupResult, SOURCE_HEADER};

#[derive(Debug, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct RefreshResponse {
    pub scheduled: usize,
    pub batches: usize,
    pub summary: String,
}

/// `GET /v1/groups/{id}`. Ids that are not integers are reported as absent.
#[instrument(skip(state))]
pub async fn group_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, GatewayError> {
    let Ok(id) = raw_id.parse::<i64>() else {
        debug!("Non-numeric group id");
        return Err(GatewayError::NotFound);
    };

    let result = state.pipeline.get_by_id(id).await?;
    let source = result.as_header_value();
    let LookupResult::Hit { record, .. } = result else {
        return Err(GatewayError::NotFound);
    };

    Ok(make_response(record, source))
}

fn make_response(record: GroupRecord, source: &'static str) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(SOURCE_HEADER, HeaderValue::from_static(source));
    (StatusCode::OK, headers, Json(record)).into_response()
}

/// `POST /v1/refresh`. Returns once every batch is queued.
#[instrument(skip(state))]
pub async fn refresh_handler(State(state): State<AppState>) -> Result<Response, GatewayError> {
    let summary = state.orchestrator.run().await?;
    info!(%summary, "On-demand refresh dispatched");

    let body = RefreshResponse {
        scheduled: summary.scheduled,
        batches: summary.batches,
        summary: summary.to_string(),
    };
    Ok((StatusCode::ACCEPTED, Json(body)).into_response())
}
