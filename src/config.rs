//! Engine-state persistence (spec.md §6) and small non-persisted
//! engine-wide knobs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FilterCoreError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    pub enabled: bool,
    pub last_update: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_update: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Deserializes either a subscription-metadata object or, for the
/// single reserved `requests_blocked` key, a decimal string.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub requests_blocked: u64,
    pub subscriptions: HashMap<PathBuf, SubscriptionConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            requests_blocked: 0,
            subscriptions: HashMap::new(),
        }
    }
}

impl EngineConfig {
    /// Loads the config file. A missing or corrupt file is treated as
    /// "no subscriptions" (spec.md §7) rather than an error.
    pub fn load(path: &Path) -> EngineConfig {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(_) => return EngineConfig::default(),
        };
        let raw: serde_json::Value = match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(_) => return EngineConfig::default(),
        };
        let mut config = EngineConfig::default();
        if let serde_json::Value::Object(map) = raw {
            for (key, value) in map {
                if key == "requests_blocked" {
                    if let Some(s) = value.as_str() {
                        config.requests_blocked = s.parse().unwrap_or(0);
                    }
                    continue;
                }
                if let Ok(sub) = serde_json::from_value::<SubscriptionConfig>(value) {
                    config.subscriptions.insert(PathBuf::from(key), sub);
                }
            }
        }
        config
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut map = serde_json::Map::new();
        map.insert(
            "requests_blocked".to_string(),
            serde_json::Value::String(self.requests_blocked.to_string()),
        );
        for (sub_path, cfg) in &self.subscriptions {
            map.insert(
                sub_path.to_string_lossy().to_string(),
                serde_json::to_value(cfg).map_err(|source| FilterCoreError::ConfigParse {
                    path: path.to_path_buf(),
                    source,
                })?,
            );
        }
        let text = serde_json::to_string_pretty(&serde_json::Value::Object(map)).map_err(|source| {
            FilterCoreError::ConfigParse { path: path.to_path_buf(), source }
        })?;
        std::fs::write(path, text).map_err(|source| FilterCoreError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Engine-wide knobs that have no dedicated UI or persisted location
/// in spec.md §6; exposed as constructor parameters with the defaults
/// spec.md §4.8/§4.9 name.
#[derive(Debug, Clone)]
pub struct Settings {
    pub log_prune_interval_seconds: i64,
    pub domain_cache_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_prune_interval_seconds: 30 * 60,
            domain_cache_capacity: 24,
        }
    }
}
