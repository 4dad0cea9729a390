use super::*;
use serial_test::serial;
use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

const TOKEN: (&str, &str) = ("STRATA_VK_ACCESS_TOKEN", "test-token");

fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, value) in vars {
        unsafe { env::set_var(key, value) };
    }

    let result = f();

    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, _) in vars {
        unsafe { env::remove_var(key) };
    }

    result
}

fn clear_strata_env() {
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    unsafe {
        env::remove_var("STRATA_PORT");
        env::remove_var("STRATA_BIND_ADDR");
        env::remove_var("STRATA_STORAGE_PATH");
        env::remove_var("STRATA_CACHE_CAPACITY");
        env::remove_var("STRATA_CACHE_URL");
        env::remove_var("STRATA_VK_ACCESS_TOKEN");
        env::remove_var("STRATA_VK_API_URL");
        env::remove_var("STRATA_VK_API_VERSION");
        env::remove_var("STRATA_HTTP_TIMEOUT_SECS");
        env::remove_var("STRATA_STALENESS_SECS");
        env::remove_var("STRATA_MAX_BATCH_SIZE");
        env::remove_var("STRATA_REFRESH_INTERVAL_SECS");
        env::remove_var("STRATA_REFRESH_WORKERS");
    }
}

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.port, 8080);
    assert_eq!(
        config.bind_addr,
        IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1))
    );
    assert_eq!(config.storage_path, PathBuf::from("./.data"));
    assert_eq!(config.api_url, "https://api.vk.com/method");
    assert_eq!(config.api_version, "5.131");
    assert_eq!(config.staleness, Duration::from_secs(86_400));
    assert_eq!(config.refresh_every, Duration::from_secs(86_400));
    assert_eq!(config.max_batch_size, 500);
    assert!(config.access_token.is_empty());
}

#[test]
fn test_socket_addr() {
    let config = Config {
        port: 3000,
        bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0)),
        ..Default::default()
    };
    assert_eq!(config.socket_addr(), "0.0.0.0:3000");
}

#[test]
#[serial]
fn test_from_env_requires_access_token() {
    clear_strata_env();

    let err = Config::from_env().unwrap_err();
    assert!(matches!(
        err,
        ConfigError::MissingEnvVar {
            name: "STRATA_VK_ACCESS_TOKEN"
        }
    ));
}

#[test]
#[serial]
fn test_from_env_blank_token_is_missing() {
    clear_strata_env();

    with_env_vars(&[("STRATA_VK_ACCESS_TOKEN", "   ")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar { .. }));
    });
}

#[test]
#[serial]
fn test_from_env_with_defaults() {
    clear_strata_env();

    with_env_vars(&[TOKEN], || {
        let config = Config::from_env().expect("should parse with defaults");

        assert_eq!(config.port, 8080);
        assert_eq!(config.access_token, "test-token");
        assert_eq!(config.max_batch_size, 500);
        assert_eq!(config.refresh_workers, 4);
        assert!(config.validate().is_ok());
    });
}

#[test]
#[serial]
fn test_from_env_refresh_settings() {
    clear_strata_env();

    with_env_vars(
        &[
            TOKEN,
            ("STRATA_STALENESS_SECS", "3600"),
            ("STRATA_MAX_BATCH_SIZE", "100"),
            ("STRATA_REFRESH_INTERVAL_SECS", "600"),
            ("STRATA_REFRESH_WORKERS", "2"),
        ],
        || {
            let config = Config::from_env().expect("should parse");

            assert_eq!(config.staleness, Duration::from_secs(3600));
            assert_eq!(config.max_batch_size, 100);
            assert_eq!(config.refresh_every, Duration::from_secs(600));
            assert_eq!(config.refresh_workers, 2);
        },
    );
}

#[test]
#[serial]
fn test_from_env_targets() {
    clear_strata_env();

    with_env_vars(
        &[
            TOKEN,
            ("STRATA_STORAGE_PATH", "/var/lib/strata"),
            ("STRATA_CACHE_CAPACITY", "42"),
            ("STRATA_CACHE_URL", "redis://cache:6379/0"),
            ("STRATA_VK_API_URL", "http://127.0.0.1:9000/method"),
            ("STRATA_VK_API_VERSION", "5.199"),
        ],
        || {
            let config = Config::from_env().expect("should parse");

            assert_eq!(config.storage_path, PathBuf::from("/var/lib/strata"));
            assert_eq!(config.cache_capacity, 42);
            assert_eq!(config.cache_url.as_deref(), Some("redis://cache:6379/0"));
            assert_eq!(config.api_url, "http://127.0.0.1:9000/method");
            assert_eq!(config.api_version, "5.199");
        },
    );
}

#[test]
#[serial]
fn test_invalid_port_zero() {
    clear_strata_env();

    with_env_vars(&[("STRATA_PORT", "0")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort { .. }));
        assert!(err.to_string().contains("invalid port"));
    });
}

#[test]
#[serial]
fn test_invalid_port_not_number() {
    clear_strata_env();

    with_env_vars(&[("STRATA_PORT", "not_a_port")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::PortParseError { .. }));
    });
}

#[test]
#[serial]
fn test_invalid_batch_size() {
    clear_strata_env();

    with_env_vars(&[TOKEN, ("STRATA_MAX_BATCH_SIZE", "lots")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NumberParseError {
                name: "STRATA_MAX_BATCH_SIZE",
                ..
            }
        ));
        assert!(err.to_string().contains("lots"));
    });
}

#[test]
fn test_validate_rejects_zero_batch_size() {
    let config = Config {
        access_token: "t".to_string(),
        max_batch_size: 0,
        ..Default::default()
    };

    let err = config.validate().unwrap_err();
    assert!(matches!(
        err,
        ConfigError::ZeroValue {
            name: "STRATA_MAX_BATCH_SIZE"
        }
    ));
}

#[test]
fn test_validate_rejects_zero_workers() {
    let config = Config {
        access_token: "t".to_string(),
        refresh_workers: 0,
        ..Default::default()
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::ZeroValue { .. })
    ));
}

#[test]
fn test_validate_rejects_missing_token() {
    let config = Config::default();

    assert!(matches!(
        config.validate(),
        Err(ConfigError::MissingEnvVar { .. })
    ));
}

#[test]
fn test_validate_storage_path_is_file() {
    let file = tempfile::NamedTempFile::new().expect("temp file");
    let config = Config {
        access_token: "t".to_string(),
        storage_path: file.path().to_path_buf(),
        ..Default::default()
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::NotADirectory { .. })
    ));
}

#[test]
#[serial]
fn test_cache_url_defaults_to_none() {
    clear_strata_env();

    with_env_vars(&[TOKEN, ("STRATA_CACHE_URL", "  ")], || {
        let config = Config::from_env().expect("should parse");
        assert!(config.cache_url.is_none());
    });
}

#[test]
#[serial]
fn test_validate_rejects_huge_refresh_interval() {
    clear_strata_env();

    with_env_vars(
        &[TOKEN, ("STRATA_REFRESH_INTERVAL_SECS", "18446744073709551615")],
        || {
            let config = Config::from_env().expect("parses as u64");
            let err = config.validate().unwrap_err();
            assert!(matches!(
                err,
                ConfigError::TooLarge {
                    name: "STRATA_REFRESH_INTERVAL_SECS",
                    ..
                }
            ));
        },
    );
}

#[test]
fn test_validate_duration_bounds() {
    let at_limit = Config {
        access_token: "t".to_string(),
        refresh_every: Duration::from_secs(MAX_INTERVAL_SECS),
        staleness: Duration::from_secs(MAX_INTERVAL_SECS),
        http_timeout: Duration::from_secs(MAX_HTTP_TIMEOUT_SECS),
        ..Default::default()
    };
    assert!(at_limit.validate().is_ok());

    let stale = Config {
        staleness: Duration::from_secs(MAX_INTERVAL_SECS + 1),
        ..at_limit.clone()
    };
    assert!(matches!(
        stale.validate(),
        Err(ConfigError::TooLarge {
            name: "STRATA_STALENESS_SECS",
            ..
        })
    ));

    let slow = Config {
        http_timeout: Duration::from_secs(MAX_HTTP_TIMEOUT_SECS + 1),
        ..at_limit.clone()
    };
    assert!(matches!(
        slow.validate(),
        Err(ConfigError::TooLarge {
            name: "STRATA_HTTP_TIMEOUT_SECS",
            ..
        })
    ));

    let instant = Config {
        http_timeout: Duration::ZERO,
        ..at_limit
    };
    assert!(matches!(
        instant.validate(),
        Err(ConfigError::ZeroValue {
            name: "STRATA_HTTP_TIMEOUT_SECS"
        })
    ));
}
