//! Orchestrator configuration
//!
//! Loaded from YAML, then overridden from the environment.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use taskflow_metrics::DEFAULT_CAPACITY;
use taskflow_stages::SimulatedDelay;

pub const ENV_METRICS_CAPACITY: &str = "TASKFLOW_METRICS_CAPACITY";
pub const ENV_SEED: &str = "TASKFLOW_SEED";
pub const ENV_ENABLE_TRANSLATION: &str = "TASKFLOW_ENABLE_TRANSLATION";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Samples retained by the metrics recorder
    pub metrics_capacity: usize,

    /// Seed for placeholder model output; entropy when absent
    pub random_seed: Option<u64>,

    /// Register the translation graph
    pub enable_translation: bool,

    /// Per-stage simulated latency
    pub simulated_delay: Option<SimulatedDelay>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            metrics_capacity: DEFAULT_CAPACITY,
            random_seed: None,
            enable_translation: true,
            simulated_delay: None,
        }
    }
}

impl OrchestratorConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    /// Apply `TASKFLOW_*` variables from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = lookup(ENV_METRICS_CAPACITY) {
            self.metrics_capacity = parse_env(ENV_METRICS_CAPACITY, &value)?;
        }
        if let Some(value) = lookup(ENV_SEED) {
            self.random_seed = Some(parse_env(ENV_SEED, &value)?);
        }
        if let Some(value) = lookup(ENV_ENABLE_TRANSLATION) {
            self.enable_translation = parse_flag(ENV_ENABLE_TRANSLATION, &value)?;
        }
        Ok(self)
    }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Env {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Env {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.metrics_capacity, 1000);
        assert!(config.enable_translation);
        assert_eq!(config.random_seed, None);
        assert_eq!(config.simulated_delay, None);
    }

    #[test]
    fn test_partial_yaml() {
        let config = OrchestratorConfig::from_yaml(
            "random_seed: 42\nsimulated_delay:\n  min_ms: 5\n  max_ms: 20\n",
        )
        .unwrap();
        assert_eq!(config.random_seed, Some(42));
        assert_eq!(config.simulated_delay, Some(SimulatedDelay::new(5, 20)));
        assert_eq!(config.metrics_capacity, 1000);
    }

    #[test]
    fn test_bad_yaml() {
        let err = OrchestratorConfig::from_yaml("metrics_capacity: lots").unwrap_err();
        assert!(err.to_string().starts_with("CONFIG/yaml"));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_METRICS_CAPACITY, "50"),
            (ENV_SEED, "7"),
            (ENV_ENABLE_TRANSLATION, "off"),
        ]
        .into_iter()
        .collect();

        let config = OrchestratorConfig::default()
            .with_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.metrics_capacity, 50);
        assert_eq!(config.random_seed, Some(7));
        assert!(!config.enable_translation);
    }

    #[test]
    fn test_invalid_override() {
        let err = OrchestratorConfig::default()
            .with_overrides(|key| (key == ENV_SEED).then(|| "seven".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { ref key, .. } if key == ENV_SEED));
    }

    #[test]
    fn test_missing_file() {
        let err = OrchestratorConfig::from_file("/nonexistent/taskflow.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
