//! Server configuration read from `ADLA_*` environment variables.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

use crate::api::HttpApiConfig;
use crate::readiness::ReadinessConfig;

pub const DEFAULT_DASHBOARD_ADDR: &str = "127.0.0.1:5000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid ADLA_DASHBOARD_ADDR {value:?}: {source}")]
    BindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub bind_addr: SocketAddr,
    pub api: HttpApiConfig,
    pub use_demo: bool,
    pub readiness: ReadinessConfig,
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_addr = env_string("ADLA_DASHBOARD_ADDR")
            .unwrap_or_else(|| DEFAULT_DASHBOARD_ADDR.to_string());
        let bind_addr = raw_addr
            .parse()
            .map_err(|source| ConfigError::BindAddr {
                value: raw_addr.clone(),
                source,
            })?;

        let api_defaults = HttpApiConfig::default();
        let api = HttpApiConfig {
            base_url: env_string("ADLA_API_BASE_URL").unwrap_or(api_defaults.base_url),
            timeout_ms: env_parsed("ADLA_API_TIMEOUT_MS").unwrap_or(api_defaults.timeout_ms),
            max_retries: env_parsed("ADLA_API_MAX_RETRIES").unwrap_or(api_defaults.max_retries),
            retry_backoff_ms: env_parsed("ADLA_API_RETRY_BACKOFF_MS")
                .unwrap_or(api_defaults.retry_backoff_ms),
        };

        let readiness_defaults = ReadinessConfig::default();
        let readiness = ReadinessConfig {
            max_attempts: env_parsed("ADLA_READINESS_ATTEMPTS")
                .unwrap_or(readiness_defaults.max_attempts),
            initial_delay_ms: env_parsed("ADLA_READINESS_DELAY_MS")
                .unwrap_or(readiness_defaults.initial_delay_ms),
        };

        let use_demo = env_string("ADLA_DASHBOARD_USE_DEMO")
            .and_then(|raw| parse_bool(&raw))
            .unwrap_or(false);

        Ok(Self {
            bind_addr,
            api,
            use_demo,
            readiness,
        })
    }
}

/// Trimmed value of `key`; blank counts as unset.
pub(crate) fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

fn env_parsed<T: FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|raw| raw.parse().ok())
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    const KEYS: [&str; 8] = [
        "ADLA_DASHBOARD_ADDR",
        "ADLA_API_BASE_URL",
        "ADLA_API_TIMEOUT_MS",
        "ADLA_API_MAX_RETRIES",
        "ADLA_API_RETRY_BACKOFF_MS",
        "ADLA_DASHBOARD_USE_DEMO",
        "ADLA_READINESS_ATTEMPTS",
        "ADLA_READINESS_DELAY_MS",
    ];

    fn env_lock() -> &'static Mutex<()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn with_config_env<R>(vars: &[(&str, &str)], f: impl FnOnce() -> R) -> R {
        let _guard = env_lock().lock().expect("env lock should not be poisoned");
        let previous: Vec<(&str, Option<String>)> =
            KEYS.iter().map(|key| (*key, env::var(key).ok())).collect();

        for key in KEYS {
            env::remove_var(key);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }

        let output = f();

        for (key, value) in previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }

        output
    }

    #[test]
    fn defaults_when_env_missing() {
        let cfg = with_config_env(&[], DashboardConfig::from_env).unwrap();

        assert_eq!(cfg.bind_addr, "127.0.0.1:5000".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.api, HttpApiConfig::default());
        assert_eq!(cfg.readiness, ReadinessConfig::default());
        assert!(!cfg.use_demo);
    }

    #[test]
    fn reads_overrides_and_ignores_unparsable_numbers() {
        let cfg = with_config_env(
            &[
                ("ADLA_DASHBOARD_ADDR", "0.0.0.0:9000"),
                ("ADLA_API_BASE_URL", " http://analytics:8000 "),
                ("ADLA_API_TIMEOUT_MS", "2500"),
                ("ADLA_API_MAX_RETRIES", "many"),
                ("ADLA_DASHBOARD_USE_DEMO", "yes"),
                ("ADLA_READINESS_ATTEMPTS", "9"),
            ],
            DashboardConfig::from_env,
        )
        .unwrap();

        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.api.base_url, "http://analytics:8000");
        assert_eq!(cfg.api.timeout_ms, 2500);
        assert_eq!(cfg.api.max_retries, HttpApiConfig::default().max_retries);
        assert!(cfg.use_demo);
        assert_eq!(cfg.readiness.max_attempts, 9);
        assert_eq!(cfg.readiness.initial_delay_ms, 500);
    }

    #[test]
    fn bad_bind_address_is_an_error() {
        let err = with_config_env(&[("ADLA_DASHBOARD_ADDR", "localhost")], DashboardConfig::from_env)
            .unwrap_err();
        assert!(err.to_string().contains("ADLA_DASHBOARD_ADDR"));
    }
}
