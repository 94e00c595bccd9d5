// Client configuration, injected at startup into whatever issues requests

use std::{env, fmt::Display, str::FromStr, time::Duration};

use reqwest::Url;
use tracing::{info, warn};

use crate::airport_cache::CacheConfig;
use crate::api::ClientError;

pub const BASE_URL_VAR: &str = "FLIGHT_API_BASE_URL";
pub const TIMEOUT_VAR: &str = "FLIGHT_API_TIMEOUT_MS";
pub const DEBOUNCE_VAR: &str = "FLIGHT_DEBOUNCE_MS";

pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub timeout_ms: u64,
    pub debounce_ms: u64,
    pub airport_cache: CacheConfig,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            airport_cache: CacheConfig::default(),
        })
    }

    pub fn from_env() -> Result<Self, ClientError> {
        let base_url = env::var(BASE_URL_VAR).map_err(|_| {
            warn!("Environment variable {BASE_URL_VAR} not found");
            ClientError::ConfigError(format!("{BASE_URL_VAR} must be set"))
        })?;

        let mut config = Self::new(&base_url)?;
        config.timeout_ms = try_load(TIMEOUT_VAR, DEFAULT_TIMEOUT_MS)?;
        config.debounce_ms = try_load(DEBOUNCE_VAR, DEFAULT_DEBOUNCE_MS)?;
        info!(base_url = %config.base_url, "Loaded client configuration");
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    // Joins an endpoint onto the base URL, keeping any path prefix the base carries
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ClientError::ConfigError(format!("Invalid base URL {raw:?}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ClientError::ConfigError(format!(
            "Unsupported base URL scheme: {other}"
        ))),
    }
}

fn try_load<T>(key: &str, default: T) -> Result<T, ClientError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ClientError::ConfigError(format!("Invalid {key} value: {e}"))),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_path_prefix() {
        let config = ClientConfig::new("https://api.example.com/v1/").unwrap();
        assert_eq!(
            config.endpoint("/flight-offers"),
            "https://api.example.com/v1/flight-offers"
        );

        let config = ClientConfig::new("http://localhost:5000").unwrap();
        assert_eq!(
            config.endpoint("airport-search"),
            "http://localhost:5000/airport-search"
        );
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(matches!(
            ClientConfig::new("not a url"),
            Err(ClientError::ConfigError(_))
        ));
        assert!(matches!(
            ClientConfig::new("ftp://example.com"),
            Err(ClientError::ConfigError(_))
        ));
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("http://localhost:5000").unwrap();
        assert_eq!(config.debounce_window(), Duration::from_millis(300));
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    // Only test that touches the process environment
    #[test]
    fn test_from_env() {
        env::remove_var(BASE_URL_VAR);
        assert!(ClientConfig::from_env().is_err());

        env::set_var(BASE_URL_VAR, "http://localhost:5000");
        env::set_var(DEBOUNCE_VAR, "150");
        env::remove_var(TIMEOUT_VAR);
        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.debounce_ms, 150);
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);

        env::set_var(DEBOUNCE_VAR, "soon");
        assert!(ClientConfig::from_env().is_err());

        env::remove_var(BASE_URL_VAR);
        env::remove_var(DEBOUNCE_VAR);
    }
}
