//! HTTP client for the VK `groups.getById` method.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::error::{FetchError, FetchResult};
use super::response::{parse_batch, parse_single};
use super::{
    DEFAULT_API_URL, DEFAULT_API_VERSION, GET_BY_ID_METHOD, GROUP_FIELDS, GroupFetcher,
    check_batch,
};
use crate::config::{Config, DEFAULT_MAX_BATCH_SIZE};
use crate::group::GroupRecord;

#[derive(Debug, Clone)]
/// Connection settings for [`VkClient`].
pub struct VkClientConfig {
    /// Method base URL (without the method name).
    pub base_url: String,
    /// Bearer token.
    pub access_token: String,
    /// Value sent as the `v` query parameter.
    pub api_version: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Largest accepted batch.
    pub max_batch_size: usize,
}

impl VkClientConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            access_token: access_token.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(10),
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn max_batch_size(mut self, max: usize) -> Self {
        self.max_batch_size = max;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl From<&Config> for VkClientConfig {
    fn from(config: &Config) -> Self {
        Self {
            base_url: config.api_url.clone(),
            access_token: config.access_token.clone(),
            api_version: config.api_version.clone(),
            timeout: config.http_timeout,
            max_batch_size: config.max_batch_size,
        }
    }
}

/// Stateless VK API handle. Construct once and share it behind an `Arc`.
#[derive(Clone)]
pub struct VkClient {
    http: HttpClient,
    config: VkClientConfig,
}

impl std::fmt::Debug for VkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VkClient")
            .field("base_url", &self.config.base_url)
            .field("api_version", &self.config.api_version)
            .field("max_batch_size", &self.config.max_batch_size)
            .finish()
    }
}

impl VkClient {
    /// Builds the client and its connection pool.
    pub fn new(config: VkClientConfig) -> FetchResult<Self> {
        let http = HttpClient::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &VkClientConfig {
        &self.config
    }

    fn method_url(&self) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            GET_BY_ID_METHOD
        )
    }

    async fn call(&self, id_param: (&str, String)) -> FetchResult<Value> {
        let params = [
            id_param,
            ("fields", GROUP_FIELDS.to_string()),
            ("v", self.config.api_version.clone()),
        ];

        let resp = self
            .http
            .get(self.method_url())
            .query(&params)
            .bearer_auth(&self.config.access_token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "VK API returned non-success status");
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| FetchError::Validation(format!("body is not JSON: {}", e)))
    }
}

#[async_trait]
impl GroupFetcher for VkClient {
    #[instrument(skip(self))]
    async fn fetch_one(&self, id: i64) -> FetchResult<GroupRecord> {
        let body = self.call(("group_id", id.to_string())).await?;
        let record = parse_single(&body)?;
        debug!(group_id = record.id, "Fetched group from VK");
        Ok(record)
    }

    #[instrument(skip(self, ids), fields(batch_size = ids.len()))]
    async fn fetch_batch(&self, ids: &[i64]) -> FetchResult<Vec<GroupRecord>> {
        check_batch(ids, self.config.max_batch_size)?;

        let joined = ids
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(",");

        let body = self.call(("group_ids", joined)).await?;
        let records = parse_batch(&body)?;
        debug!(returned = records.len(), "Fetched group batch from VK");
        Ok(records)
    }

    fn max_batch_size(&self) -> usize {
        self.config.max_batch_size
    }
}
