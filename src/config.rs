//! Connection and readiness settings, with environment loading.
//!
//! Environment variables:
//! - TRINO_HOST: coordinator host name or IP
//! - TRINO_PORT: coordinator HTTP port
//! - TRINO_USER: user identity sent with every statement (default: root)
//! - TRINO_REQUEST_TIMEOUT_MS: per-request timeout (default: 5000)
//! - TRINO_READINESS_INTERVAL_SECS: wait between readiness attempts (default: 10)
//! - TRINO_READINESS_BUDGET_SECS: total readiness budget (default: 120)

use std::str::FromStr;
use std::time::Duration;

use crate::models::TrinoError;

pub const DEFAULT_USER: &str = "root";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(5000);
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_RETRY_BUDGET: Duration = Duration::from_secs(120);

/// Where and as whom statements are submitted.
///
/// Fields may be left empty here; `QuerySession::execute_query` rejects a
/// missing server, user or port before any request goes out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub server: String,
    pub user: String,
    pub port: Option<u16>,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(server: impl Into<String>, user: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            server: server.into(),
            user: user.into(),
            port,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// `http://<server>:<port>`, or `None` while either part is missing.
    pub fn base_url(&self) -> Option<String> {
        match self.port {
            Some(port) if port != 0 && !self.server.is_empty() => {
                Some(format!("http://{}:{}", self.server.trim_end_matches('/'), port))
            }
            _ => None,
        }
    }

    pub fn from_env() -> Result<Self, TrinoError> {
        let server = std::env::var("TRINO_HOST").unwrap_or_default();
        let user = std::env::var("TRINO_USER").unwrap_or_else(|_| DEFAULT_USER.to_string());
        let port = env_parse::<u16>("TRINO_PORT")?;
        let request_timeout = env_parse::<u64>("TRINO_REQUEST_TIMEOUT_MS")?
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        Ok(Self {
            server,
            user,
            port,
            request_timeout,
        })
    }
}

/// Interval and total budget for a bounded retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessConfig {
    pub interval: Duration,
    pub budget: Duration,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_RETRY_INTERVAL,
            budget: DEFAULT_RETRY_BUDGET,
        }
    }
}

impl ReadinessConfig {
    pub fn from_env() -> Result<Self, TrinoError> {
        let defaults = Self::default();
        let interval = env_parse::<u64>("TRINO_READINESS_INTERVAL_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.interval);
        let budget = env_parse::<u64>("TRINO_READINESS_BUDGET_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.budget);

        if interval.is_zero() {
            return Err(TrinoError::Config(
                "TRINO_READINESS_INTERVAL_SECS must be greater than 0".to_string(),
            ));
        }
        Ok(Self { interval, budget })
    }
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>, TrinoError> {
    match std::env::var(key) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| TrinoError::Config(format!("{} has an invalid value: {}", key, raw))),
        Err(_) => Ok(None),
    }
}
