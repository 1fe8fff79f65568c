//! Configuration for the matching engine.

use crate::matching::StrategyKind;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatcherSettings {
    /// "first" or "strongest", case-insensitive
    #[serde(default, deserialize_with = "deserialize_strategy")]
    pub strategy: StrategyKind,

    /// Webserver mode: destination is neither matched nor part of cache keys
    #[serde(default)]
    pub webserver: bool,

    #[serde(default)]
    pub cache: CacheSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_max_size", alias = "max_size")]
    pub max_size: usize,

    /// Seed the cache with unambiguous pairs whenever a simulation is loaded
    #[serde(default = "default_true")]
    pub preload: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_size: default_max_size(),
            preload: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_size() -> usize {
    10_000
}

fn deserialize_strategy<'de, D>(deserializer: D) -> Result<StrategyKind, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

impl MatcherSettings {
    /// Load settings from a YAML (or JSON) file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        let settings: MatcherSettings = serde_yaml::from_str(&contents)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.cache.enabled && self.cache.max_size == 0 {
            anyhow::bail!("cache.maxSize must be greater than 0 when the cache is enabled");
        }
        Ok(())
    }
}
