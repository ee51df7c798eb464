//! Startup settings and per-provider client configuration.
//!
//! # Design
//! `Settings` is read once at process entry and passed by reference into
//! the client factory; nothing below this module touches the environment.
//! `ClientConfig` is what a `NetworkProvider` owns: a base URL plus its
//! interceptors. `ConfigPatch` describes an extension of a config.

use std::time::Duration;

use tracing::{info, warn};

use crate::error::ConfigError;
use crate::interceptors::Interceptors;

pub const API_URL_VAR: &str = "EVENTIO_API_URL";
pub const API_KEY_VAR: &str = "EVENTIO_API_KEY";
pub const TIMEOUT_VAR: &str = "EVENTIO_HTTP_TIMEOUT_SECS";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Process-wide values the clients need: where the API lives, the key it
/// expects on every call, and how long the transport may wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    api_url: String,
    api_key: String,
    timeout: Duration,
}

impl Settings {
    pub fn new(api_url: &str, api_key: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: non_empty(API_URL_VAR, api_url)?,
            api_key: non_empty(API_KEY_VAR, api_key)?,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup(API_URL_VAR).ok_or(ConfigError::Missing(API_URL_VAR))?;
        let api_key = lookup(API_KEY_VAR).ok_or(ConfigError::Missing(API_KEY_VAR))?;
        let settings = Self::new(&api_url, &api_key)?;

        let timeout = match lookup(TIMEOUT_VAR) {
            Some(raw) => parse_timeout(&raw)?,
            None => {
                info!("{TIMEOUT_VAR} not set, using default: {}s", DEFAULT_TIMEOUT.as_secs());
                DEFAULT_TIMEOUT
            }
        };
        Ok(settings.with_timeout(timeout))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn non_empty(key: &'static str, value: &str) -> Result<String, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        warn!("{key} is empty");
        return Err(ConfigError::Empty(key));
    }
    Ok(value.to_string())
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        key: TIMEOUT_VAR,
        value: raw.to_string(),
        reason: reason.to_string(),
    };
    let secs: u64 = raw.trim().parse().map_err(|e: std::num::ParseIntError| invalid(&e.to_string()))?;
    if secs == 0 {
        return Err(invalid("must be positive"));
    }
    Ok(Duration::from_secs(secs))
}

/// Configuration owned by a `NetworkProvider`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: String,
    interceptors: Interceptors,
}

impl ClientConfig {
    pub fn new(base_url: &str, interceptors: Interceptors) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            interceptors,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn interceptors(&self) -> &Interceptors {
        &self.interceptors
    }

    /// Hooks are concatenated (ours first); the base URL is replaced only
    /// when the patch carries one.
    pub fn merge(&self, patch: &ConfigPatch) -> ClientConfig {
        ClientConfig {
            base_url: patch
                .base_url
                .clone()
                .unwrap_or_else(|| self.base_url.clone()),
            interceptors: self.interceptors.merged(&patch.interceptors),
        }
    }

    /// `base_url` joined with `path` by exactly one slash.
    pub fn url_for(&self, path: &str) -> String {
        if path.is_empty() {
            return self.base_url.clone();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Partial configuration passed to `NetworkProvider::extend`.
#[derive(Debug, Clone, Default)]
pub struct ConfigPatch {
    base_url: Option<String>,
    interceptors: Interceptors,
}

impl ConfigPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.base_url = Some(normalize_base_url(base_url)?);
        Ok(self)
    }

    pub fn with_interceptors(mut self, interceptors: Interceptors) -> Self {
        self.interceptors = interceptors;
        self
    }
}

impl From<Interceptors> for ConfigPatch {
    fn from(interceptors: Interceptors) -> Self {
        ConfigPatch::new().with_interceptors(interceptors)
    }
}

fn normalize_base_url(base_url: &str) -> Result<String, ConfigError> {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyBaseUrl);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn settings_from_lookup_reads_required_values() {
        let settings = Settings::from_lookup(lookup(&[
            (API_URL_VAR, "https://api.eventio.test/v1/"),
            (API_KEY_VAR, " key-123 "),
        ]))
        .unwrap();
        assert_eq!(settings.api_url(), "https://api.eventio.test/v1/");
        assert_eq!(settings.api_key(), "key-123");
        assert_eq!(settings.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn missing_url_is_fatal() {
        let err = Settings::from_lookup(lookup(&[(API_KEY_VAR, "k")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(API_URL_VAR));
    }

    #[test]
    fn missing_key_is_fatal() {
        let err = Settings::from_lookup(lookup(&[(API_URL_VAR, "http://x")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(API_KEY_VAR));
    }

    #[test]
    fn blank_values_are_rejected() {
        assert_eq!(Settings::new("", "k").unwrap_err(), ConfigError::Empty(API_URL_VAR));
        assert_eq!(Settings::new("http://x", "  ").unwrap_err(), ConfigError::Empty(API_KEY_VAR));
    }

    #[test]
    fn timeout_override_must_be_positive_integer() {
        let base = [(API_URL_VAR, "http://x"), (API_KEY_VAR, "k")];

        let mut vars = base.to_vec();
        vars.push((TIMEOUT_VAR, "5"));
        let settings = Settings::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(settings.timeout(), Duration::from_secs(5));

        for bad in ["0", "soon", "-1"] {
            let mut vars = base.to_vec();
            vars.push((TIMEOUT_VAR, bad));
            let err = Settings::from_lookup(lookup(&vars)).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { key: TIMEOUT_VAR, .. }), "{bad}");
        }
    }

    #[test]
    fn client_config_trims_trailing_slash_and_joins_paths() {
        let config = ClientConfig::new("http://localhost:3000/", Interceptors::new()).unwrap();
        assert_eq!(config.base_url(), "http://localhost:3000");
        assert_eq!(config.url_for("/events"), "http://localhost:3000/events");
        assert_eq!(config.url_for("events/7"), "http://localhost:3000/events/7");
        assert_eq!(config.url_for(""), "http://localhost:3000");
    }

    #[test]
    fn empty_base_url_is_rejected() {
        assert_eq!(
            ClientConfig::new("  ", Interceptors::new()).unwrap_err(),
            ConfigError::EmptyBaseUrl
        );
        assert!(ConfigPatch::new().with_base_url("/").is_err());
    }

    #[test]
    fn merge_overrides_base_url_only_when_given() {
        let base = ClientConfig::new("http://a", Interceptors::new().before(Ok)).unwrap();

        let kept = base.merge(&ConfigPatch::from(Interceptors::new().before(Ok)));
        assert_eq!(kept.base_url(), "http://a");
        assert_eq!(kept.interceptors().before_request().len(), 2);

        let moved = base.merge(&ConfigPatch::new().with_base_url("http://b/").unwrap());
        assert_eq!(moved.base_url(), "http://b");
        assert_eq!(moved.interceptors().before_request().len(), 1);
    }
}
