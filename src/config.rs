//! Orchestrator configuration.
//!
//! Loaded from YAML or from the environment:
//! - `AI_CORE_PLUGINS`: comma-separated built-in plugin ids, in wrapping order
//! - `AI_CORE_CACHE_CAPACITY`: entries kept by the `cache` plugin (default 128)
//! - `AI_CORE_CONTEXT_COUNT`: fallback message window for `context_window`
//! - `AI_CORE_TRACE`: `1`/`true` to record spans for every call

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Error, ErrorContext, Result};

pub const DEFAULT_CACHE_CAPACITY: usize = 128;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Built-in plugin ids, outermost first.
    pub plugins: Vec<String>,
    pub cache_capacity: usize,
    pub default_context_count: Option<usize>,
    pub trace: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            plugins: Vec::new(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            default_context_count: None,
            trace: false,
        }
    }
}

impl OrchestratorConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source (keeps tests off the process env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(list) = lookup("AI_CORE_PLUGINS") {
            config.plugins = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(raw) = lookup("AI_CORE_CACHE_CAPACITY") {
            config.cache_capacity = parse_usize("AI_CORE_CACHE_CAPACITY", &raw)?;
        }
        if let Some(raw) = lookup("AI_CORE_CONTEXT_COUNT") {
            config.default_context_count = Some(parse_usize("AI_CORE_CONTEXT_COUNT", &raw)?);
        }
        if let Some(raw) = lookup("AI_CORE_TRACE") {
            config.trace = matches!(raw.trim(), "1" | "true" | "yes" | "on");
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache_capacity == 0 {
            return Err(Error::validation_with_context(
                "cache capacity must be at least 1",
                ErrorContext::new()
                    .with_field_path("cache_capacity")
                    .with_source("config_loader"),
            ));
        }
        if self.default_context_count == Some(0) {
            return Err(Error::validation_with_context(
                "context window must keep at least one message",
                ErrorContext::new()
                    .with_field_path("default_context_count")
                    .with_details("omit the field to keep the whole conversation")
                    .with_source("config_loader"),
            ));
        }
        Ok(())
    }
}

fn parse_usize(key: &str, raw: &str) -> Result<usize> {
    raw.trim().parse::<usize>().map_err(|e| {
        Error::configuration_with_context(
            format!("invalid value '{}'", raw),
            ErrorContext::new()
                .with_field_path(key)
                .with_details(e.to_string())
                .with_source("config_loader"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn yaml_fills_missing_fields_with_defaults() {
        let config = OrchestratorConfig::from_yaml_str("plugins: [logging, cache]\ntrace: true\n")
            .unwrap();
        assert_eq!(config.plugins, vec!["logging", "cache"]);
        assert_eq!(config.cache_capacity, DEFAULT_CACHE_CAPACITY);
        assert!(config.trace);
    }

    #[test]
    fn env_lookup_parses_every_key() {
        let vars: HashMap<&str, &str> = [
            ("AI_CORE_PLUGINS", "logging, context_window,,cache"),
            ("AI_CORE_CACHE_CAPACITY", "16"),
            ("AI_CORE_CONTEXT_COUNT", "5"),
            ("AI_CORE_TRACE", "1"),
        ]
        .into_iter()
        .collect();
        let config =
            OrchestratorConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.plugins, vec!["logging", "context_window", "cache"]);
        assert_eq!(config.cache_capacity, 16);
        assert_eq!(config.default_context_count, Some(5));
        assert!(config.trace);
    }

    #[test]
    fn bad_numbers_are_configuration_errors() {
        let err = OrchestratorConfig::from_lookup(|k| {
            (k == "AI_CORE_CACHE_CAPACITY").then(|| "lots".to_string())
        })
        .unwrap_err();
        let ctx = err.context().unwrap();
        assert_eq!(ctx.field_path.as_deref(), Some("AI_CORE_CACHE_CAPACITY"));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = OrchestratorConfig::from_yaml_str("cache_capacity: 0").unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("cache_capacity")
        );
    }

    #[test]
    fn empty_context_window_is_rejected() {
        let err = OrchestratorConfig::from_lookup(|k| {
            (k == "AI_CORE_CONTEXT_COUNT").then(|| "0".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(err.to_string().starts_with("Validation error: context window"));
    }
}
