//! Environment-backed configuration.
//!
//! Everything except the VK access token has a default. Override with `STRATA_*`
//! environment variables.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::remote::{DEFAULT_API_URL, DEFAULT_API_VERSION};

/// Server configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `STRATA_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Directory of the durable group store. Default: `./.data`.
    pub storage_path: PathBuf,

    /// Max entries held by the fast cache. Default: `100_000`.
    pub cache_capacity: u64,

    /// Bearer token sent to the VK API. Required.
    pub access_token: String,

    /// VK API method base URL.
    pub api_url: String,

    /// VK API version sent as `v`.
    pub api_version: String,

    /// Per-request timeout for outbound API calls. Default: 10s.
    pub http_timeout: Duration,

    /// Records last confirmed longer ago than this are refreshed. Default: 24h.
    pub staleness: Duration,

    /// Networked fast-cache target (`redis://host:port/db`). When unset the
    /// in-process cache is used.
    pub cache_url: Option<String>,

    /// Max ids per refresh batch (and per `groups.getById` call). Default: `500`.
    pub max_batch_size: usize,

    /// How often the refresh scheduler fires. Default: 24h.
    pub refresh_every: Duration,

    /// Number of concurrent batch workers. Default: `4`.
    pub refresh_workers: usize,
}

/// Default staleness window and refresh period (once a day).
pub const DEFAULT_STALENESS_SECS: u64 = 60 * 60 * 24;
/// Default number of ids per refresh batch.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 500;
/// Upper bound for the staleness window and refresh period (ten years).
pub const MAX_INTERVAL_SECS: u64 = 60 * 60 * 24 * 365 * 10;
/// Upper bound for the outbound request timeout.
pub const MAX_HTTP_TIMEOUT_SECS: u64 = 60 * 60;

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            storage_path: PathBuf::from("./.data"),
            cache_capacity: 100_000,
            access_token: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            http_timeout: Duration::from_secs(10),
            staleness: Duration::from_secs(DEFAULT_STALENESS_SECS),
            cache_url: None,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            refresh_every: Duration::from_secs(DEFAULT_STALENESS_SECS),
            refresh_workers: 4,
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "STRATA_PORT";
    const ENV_BIND_ADDR: &'static str = "STRATA_BIND_ADDR";
    const ENV_STORAGE_PATH: &'static str = "STRATA_STORAGE_PATH";
    const ENV_CACHE_CAPACITY: &'static str = "STRATA_CACHE_CAPACITY";
    const ENV_CACHE_URL: &'static str = "STRATA_CACHE_URL";
    const ENV_ACCESS_TOKEN: &'static str = "STRATA_VK_ACCESS_TOKEN";
    const ENV_API_URL: &'static str = "STRATA_VK_API_URL";
    const ENV_API_VERSION: &'static str = "STRATA_VK_API_VERSION";
    const ENV_HTTP_TIMEOUT_SECS: &'static str = "STRATA_HTTP_TIMEOUT_SECS";
    const ENV_STALENESS_SECS: &'static str = "STRATA_STALENESS_SECS";
    const ENV_MAX_BATCH_SIZE: &'static str = "STRATA_MAX_BATCH_SIZE";
    const ENV_REFRESH_INTERVAL_SECS: &'static str = "STRATA_REFRESH_INTERVAL_SECS";
    const ENV_REFRESH_WORKERS: &'static str = "STRATA_REFRESH_WORKERS";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let storage_path = Self::parse_path_from_env(Self::ENV_STORAGE_PATH, defaults.storage_path);
        let cache_capacity =
            Self::parse_number_from_env(Self::ENV_CACHE_CAPACITY, defaults.cache_capacity)?;
        let cache_url = Self::parse_optional_from_env(Self::ENV_CACHE_URL);
        let access_token = Self::parse_required_from_env(Self::ENV_ACCESS_TOKEN)?;
        let api_url = Self::parse_string_from_env(Self::ENV_API_URL, defaults.api_url);
        let api_version = Self::parse_string_from_env(Self::ENV_API_VERSION, defaults.api_version);
        let http_timeout =
            Self::parse_secs_from_env(Self::ENV_HTTP_TIMEOUT_SECS, defaults.http_timeout)?;
        let staleness = Self::parse_secs_from_env(Self::ENV_STALENESS_SECS, defaults.staleness)?;
        let max_batch_size =
            Self::parse_number_from_env(Self::ENV_MAX_BATCH_SIZE, defaults.max_batch_size)?;
        let refresh_every =
            Self::parse_secs_from_env(Self::ENV_REFRESH_INTERVAL_SECS, defaults.refresh_every)?;
        let refresh_workers =
            Self::parse_number_from_env(Self::ENV_REFRESH_WORKERS, defaults.refresh_workers)?;

        Ok(Self {
            port,
            bind_addr,
            storage_path,
            cache_capacity,
            access_token,
            api_url,
            api_version,
            http_timeout,
            staleness,
            cache_url,
            max_batch_size,
            refresh_every,
            refresh_workers,
        })
    }

    /// Checks basic invariants (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_path.exists() && !self.storage_path.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: self.storage_path.clone(),
            });
        }

        if self.access_token.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar {
                name: Self::ENV_ACCESS_TOKEN,
            });
        }

        if self.max_batch_size == 0 {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_MAX_BATCH_SIZE,
            });
        }

        if self.refresh_workers == 0 {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_REFRESH_WORKERS,
            });
        }

        if self.refresh_every.is_zero() {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_REFRESH_INTERVAL_SECS,
            });
        }

        if self.http_timeout.is_zero() {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_HTTP_TIMEOUT_SECS,
            });
        }

        Self::check_upper_bound(
            Self::ENV_REFRESH_INTERVAL_SECS,
            self.refresh_every,
            MAX_INTERVAL_SECS,
        )?;
        Self::check_upper_bound(Self::ENV_STALENESS_SECS, self.staleness, MAX_INTERVAL_SECS)?;
        Self::check_upper_bound(
            Self::ENV_HTTP_TIMEOUT_SECS,
            self.http_timeout,
            MAX_HTTP_TIMEOUT_SECS,
        )?;

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name).map(PathBuf::from).unwrap_or(default)
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
    }

    fn check_upper_bound(
        name: &'static str,
        value: Duration,
        max_secs: u64,
    ) -> Result<(), ConfigError> {
        if value > Duration::from_secs(max_secs) {
            return Err(ConfigError::TooLarge { name, max_secs });
        }
        Ok(())
    }

    fn parse_optional_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_required_from_env(var_name: &'static str) -> Result<String, ConfigError> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingEnvVar { name: var_name })
    }

    fn parse_number_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr<Err = std::num::ParseIntError>,
    {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e| ConfigError::NumberParseError {
                    name: var_name,
                    value,
                    source: e,
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_secs_from_env(
        var_name: &'static str,
        default: Duration,
    ) -> Result<Duration, ConfigError> {
        Self::parse_number_from_env(var_name, default.as_secs()).map(Duration::from_secs)
    }
}
