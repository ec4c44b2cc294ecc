//! Process configuration from environment variables.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `GOLEMIO_API_KEY` | empty | Golemio access token |
//! | `ROUTING_API_KEY` | empty | Bing Maps key |
//! | `BIND_ADDR` | `127.0.0.1:3000` | HTTP listen address |
//! | `REFRESH_INTERVAL_SECS` | `30` | Snapshot refresh period, `0` disables |
//! | `ESTIMATE_DEADLINE_SECS` | `20` | Upper bound on one estimate |
//! | `MOCK_DATA_DIR` | unset | Serve mock data from this directory |
//! | `REDIS_URL` | unset | Cache in Redis instead of in process |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::estimator::EstimatorConfig;
use crate::kv::CacheConfig;
use crate::positions::SnapshotConfig;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;

/// Errors from reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Everything the binary needs to start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub golemio_api_key: String,
    pub routing_api_key: String,
    pub bind_addr: SocketAddr,

    /// Period of the background snapshot refresh. `None` disables it.
    pub refresh_interval: Option<Duration>,

    /// Serve mock data instead of calling the real APIs.
    pub mock_data_dir: Option<PathBuf>,

    /// Redis server for the cache. `None` keeps the cache in process.
    pub redis_url: Option<String>,

    pub cache: CacheConfig,
    pub snapshot: SnapshotConfig,
    pub estimator: EstimatorConfig,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which returns a variable's value
    /// if it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = match var("BIND_ADDR") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "BIND_ADDR",
                value: raw.clone(),
            })?,
            None => DEFAULT_BIND_ADDR.parse().map_err(|_| ConfigError::InvalidValue {
                key: "BIND_ADDR",
                value: DEFAULT_BIND_ADDR.to_string(),
            })?,
        };

        let refresh_secs = parse_secs(
            "REFRESH_INTERVAL_SECS",
            var("REFRESH_INTERVAL_SECS"),
            DEFAULT_REFRESH_INTERVAL_SECS,
        )?;

        let mut estimator = EstimatorConfig::default();
        if let Some(raw) = var("ESTIMATE_DEADLINE_SECS") {
            let secs = parse_secs("ESTIMATE_DEADLINE_SECS", Some(raw.clone()), 0)?;
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "ESTIMATE_DEADLINE_SECS",
                    value: raw,
                });
            }
            estimator = estimator.with_deadline(Duration::from_secs(secs));
        }

        Ok(Self {
            golemio_api_key: var("GOLEMIO_API_KEY").unwrap_or_default(),
            routing_api_key: var("ROUTING_API_KEY").unwrap_or_default(),
            bind_addr,
            refresh_interval: (refresh_secs > 0).then(|| Duration::from_secs(refresh_secs)),
            mock_data_dir: var("MOCK_DATA_DIR").map(PathBuf::from),
            redis_url: var("REDIS_URL"),
            cache: CacheConfig::default(),
            snapshot: SnapshotConfig::default(),
            estimator,
        })
    }
}

fn parse_secs(key: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        None => Ok(default),
    }
}
