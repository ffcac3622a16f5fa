//! Client Configuration
//!
//! Loaded from defaults, a JSON document, or environment variables.
//! In the browser the environment is read at compile time.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_COURSE_ID: &str = "master-ia";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value: {reason}")]
    Invalid { key: String, reason: String },

    #[error("Malformed config: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL every resource path is appended to
    pub api_url: String,
    /// Sent as `Accept-Language` when set
    pub accept_language: Option<String>,
    /// Course the academy endpoints are scoped to
    pub course_id: String,
    /// Staleness window of list queries, in seconds
    pub list_stale_secs: u64,
    /// Staleness window of aggregate statistics, in seconds
    pub stats_stale_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            accept_language: None,
            course_id: DEFAULT_COURSE_ID.to_string(),
            list_stale_secs: 60,
            stats_stale_secs: 30,
        }
    }
}

impl ClientConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read `TAREAS_*` variables, falling back to defaults for unset ones
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            api_url: try_load("TAREAS_API_URL", defaults.api_url)?,
            accept_language: var("TAREAS_ACCEPT_LANGUAGE"),
            course_id: try_load("TAREAS_COURSE_ID", defaults.course_id)?,
            list_stale_secs: try_load("TAREAS_LIST_STALE_SECS", defaults.list_stale_secs)?,
            stats_stale_secs: try_load("TAREAS_STATS_STALE_SECS", defaults.stats_stale_secs)?,
        })
    }

    pub fn list_stale_time(&self) -> Duration {
        Duration::from_secs(self.list_stale_secs)
    }

    pub fn stats_stale_time(&self) -> Duration {
        Duration::from_secs(self.stats_stale_secs)
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

#[cfg(target_arch = "wasm32")]
fn var(key: &str) -> Option<String> {
    let value = match key {
        "TAREAS_API_URL" => option_env!("TAREAS_API_URL"),
        "TAREAS_ACCEPT_LANGUAGE" => option_env!("TAREAS_ACCEPT_LANGUAGE"),
        "TAREAS_COURSE_ID" => option_env!("TAREAS_COURSE_ID"),
        "TAREAS_LIST_STALE_SECS" => option_env!("TAREAS_LIST_STALE_SECS"),
        "TAREAS_STATS_STALE_SECS" => option_env!("TAREAS_STATS_STALE_SECS"),
        _ => None,
    };
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

fn try_load<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match var(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key: key.to_string(),
                reason: e.to_string(),
            }
        }),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_lesson_windows() {
        let config = ClientConfig::default();
        assert_eq!(config.list_stale_time(), Duration::from_secs(60));
        assert_eq!(config.stats_stale_time(), Duration::from_secs(30));
        assert_eq!(config.course_id, "master-ia");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ClientConfig::from_json(r#"{"api_url":"http://example.test","stats_stale_secs":5}"#).unwrap();
        assert_eq!(config.api_url, "http://example.test");
        assert_eq!(config.stats_stale_secs, 5);
        assert_eq!(config.list_stale_secs, 60);
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        assert!(matches!(
            ClientConfig::from_json("{not json"),
            Err(ConfigError::Malformed(_))
        ));
    }

    #[test]
    fn test_env_overrides_and_invalid_values() {
        std::env::set_var("TAREAS_LIST_STALE_SECS", "120");
        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.list_stale_secs, 120);

        std::env::set_var("TAREAS_LIST_STALE_SECS", "soon");
        let err = ClientConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "TAREAS_LIST_STALE_SECS"));

        std::env::remove_var("TAREAS_LIST_STALE_SECS");
    }
}
