//! Client configuration loaded from the environment.
//!
//! | Variable | Field | Default |
//! |---|---|---|
//! | `API_BASE_URL` | `base_url` | empty: paths must be absolute URLs |
//! | `API_STORAGE_PATH` | `storage_path` | unset: in-memory storage |
//! | `API_ATTACH_BEARER` | `attach_bearer` | `false` |
//! | `API_FALLBACK` | `fallback` (JSON text) | `[]` |

use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

pub const ENV_BASE_URL: &str = "API_BASE_URL";
pub const ENV_STORAGE_PATH: &str = "API_STORAGE_PATH";
pub const ENV_ATTACH_BEARER: &str = "API_ATTACH_BEARER";
pub const ENV_FALLBACK: &str = "API_FALLBACK";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Prefix for relative request paths.
    pub base_url: String,
    /// File backing the token store; `None` keeps tokens in memory.
    pub storage_path: Option<PathBuf>,
    /// Install the bearer-attaching interceptor instead of the pass-through.
    pub attach_bearer: bool,
    /// Value every failed operation resolves with.
    pub fallback: Value,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            storage_path: None,
            attach_bearer: false,
            fallback: Value::Array(Vec::new()),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup. Unset variables keep
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            config.base_url = base_url;
        }
        if let Some(path) = lookup(ENV_STORAGE_PATH).filter(|p| !p.is_empty()) {
            config.storage_path = Some(PathBuf::from(path));
        }
        if let Some(raw) = lookup(ENV_ATTACH_BEARER) {
            config.attach_bearer = parse_flag(ENV_ATTACH_BEARER, &raw)?;
        }
        if let Some(raw) = lookup(ENV_FALLBACK) {
            config.fallback = serde_json::from_str(&raw).map_err(|_| ConfigError::InvalidValue {
                key: ENV_FALLBACK,
                value: raw.clone(),
            })?;
        }
        Ok(config)
    }
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.fallback, json!([]));
    }

    #[test]
    fn reads_every_variable() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, "http://localhost:3001"),
            (ENV_STORAGE_PATH, "/tmp/session.json"),
            (ENV_ATTACH_BEARER, "yes"),
            (ENV_FALLBACK, "null"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:3001");
        assert_eq!(config.storage_path, Some(PathBuf::from("/tmp/session.json")));
        assert!(config.attach_bearer);
        assert_eq!(config.fallback, Value::Null);
    }

    #[test]
    fn rejects_unknown_flag() {
        let err = ClientConfig::from_lookup(lookup(&[(ENV_ATTACH_BEARER, "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: ENV_ATTACH_BEARER, .. }));
    }

    #[test]
    fn rejects_invalid_fallback_json() {
        let err = ClientConfig::from_lookup(lookup(&[(ENV_FALLBACK, "[oops")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: ENV_FALLBACK, .. }));
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: ClientConfig = serde_json::from_str(r#"{"attach_bearer":true}"#).unwrap();
        assert!(config.attach_bearer);
        assert_eq!(config.fallback, json!([]));
    }
}
