//! Local stand-in for the VK `groups.getById` endpoint.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::get,
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use strata::remote::{GET_BY_ID_METHOD, VkClient, VkClientConfig};

use super::TEST_TOKEN;

/// One request as seen by the mock API.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub query: HashMap<String, String>,
    pub authorization: Option<String>,
}

#[derive(Default)]
struct ApiState {
    groups: Mutex<HashMap<i64, Value>>,
    failing: Mutex<HashSet<i64>>,
    status_override: Mutex<Option<StatusCode>>,
    requests: Mutex<Vec<SeenRequest>>,
}

pub struct MockVkApi {
    pub addr: SocketAddr,
    state: Arc<ApiState>,
    _server: JoinHandle<()>,
}

impl MockVkApi {
    pub async fn start() -> Self {
        let state = Arc::new(ApiState::default());
        let app = Router::new()
            .route(&format!("/method/{}", GET_BY_ID_METHOD), get(get_by_id))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            _server: server,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/method", self.addr)
    }

    pub fn client_config(&self) -> VkClientConfig {
        VkClientConfig::new(TEST_TOKEN).base_url(self.base_url())
    }

    pub fn client(&self) -> VkClient {
        VkClient::new(self.client_config()).unwrap()
    }

    /// Serves `id` with the VK field names (`members_count`).
    pub fn insert(&self, id: i64, name: &str, members_count: i64) {
        self.state.groups.lock().insert(
            id,
            json!({"id": id, "name": name, "members_count": members_count}),
        );
    }

    /// Serves a raw entry as-is.
    pub fn insert_raw(&self, id: i64, entry: Value) {
        self.state.groups.lock().insert(id, entry);
    }

    /// Any request naming `id` gets a VK error body.
    pub fn fail_id(&self, id: i64) {
        self.state.failing.lock().insert(id);
    }

    pub fn respond_with_status(&self, status: StatusCode) {
        *self.state.status_override.lock() = Some(status);
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.state.requests.lock().clone()
    }
}

fn requested_ids(query: &HashMap<String, String>) -> Vec<i64> {
    query
        .get("group_id")
        .or_else(|| query.get("group_ids"))
        .map(|raw| raw.split(',').filter_map(|id| id.trim().parse().ok()).collect())
        .unwrap_or_default()
}

async fn get_by_id(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let ids = requested_ids(&query);
    state.requests.lock().push(SeenRequest {
        query,
        authorization: headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    if let Some(status) = *state.status_override.lock() {
        return (status, "upstream unavailable").into_response();
    }

    let failing = state.failing.lock().clone();
    if ids.is_empty() || ids.iter().any(|id| failing.contains(id)) {
        return Json(json!({
            "error": {"error_code": 100, "error_msg": "One of the parameters specified was missing or invalid"}
        }))
        .into_response();
    }

    let groups = state.groups.lock();
    let entries: Vec<Value> = ids.iter().filter_map(|id| groups.get(id).cloned()).collect();
    if entries.is_empty() {
        return Json(json!({
            "error": {"error_code": 100, "error_msg": "group_ids is undefined"}
        }))
        .into_response();
    }

    Json(json!({ "response": entries })).into_response()
}
