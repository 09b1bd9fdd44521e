//! Plugin registry.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::base::Plugin;
use crate::config::OrchestratorConfig;
use crate::{Error, ErrorContext, Result};

/// Builds a plugin instance from configuration.
pub type PluginFactory = Arc<dyn Fn(&OrchestratorConfig) -> Arc<dyn Plugin> + Send + Sync>;

/// Maps plugin ids to factories; built-ins plus anything an extension registers.
pub struct PluginRegistry {
    factories: RwLock<HashMap<String, PluginFactory>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_builtins() -> Self {
        let registry = Self::new();
        for (id, factory) in super::builtin::builtin_plugins() {
            registry.register(id, factory);
        }
        registry
    }

    pub fn register(&self, id: impl Into<String>, factory: PluginFactory) {
        self.factories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.into(), factory);
    }

    pub fn has(&self, id: &str) -> bool {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    pub fn create(&self, id: &str, config: &OrchestratorConfig) -> Result<Arc<dyn Plugin>> {
        let factory = self
            .factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned();
        match factory {
            Some(factory) => Ok(factory(config)),
            None => Err(Error::configuration_with_context(
                format!("unknown plugin '{}'", id),
                ErrorContext::new()
                    .with_field_path("plugins")
                    .with_details(format!("known plugins: {}", self.ids().join(", ")))
                    .with_source("plugin_registry"),
            )),
        }
    }

    /// Instantiate every plugin named in `config.plugins`, keeping their order.
    pub fn create_all(&self, config: &OrchestratorConfig) -> Result<Vec<Arc<dyn Plugin>>> {
        config
            .plugins
            .iter()
            .map(|id| self.create(id, config))
            .collect()
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::LoggingPlugin;

    #[test]
    fn builtins_are_enumerable() {
        let registry = PluginRegistry::with_builtins();
        assert_eq!(registry.ids(), vec!["cache", "context_window", "logging"]);
    }

    #[test]
    fn create_all_keeps_config_order() {
        let registry = PluginRegistry::with_builtins();
        let config = OrchestratorConfig {
            plugins: vec!["logging".into(), "cache".into()],
            ..Default::default()
        };
        let plugins = registry.create_all(&config).unwrap();
        let names: Vec<_> = plugins.iter().map(|p| p.name().to_string()).collect();
        assert_eq!(names, vec!["logging", "cache"]);
    }

    #[test]
    fn unknown_plugin_is_a_configuration_error() {
        let registry = PluginRegistry::with_builtins();
        let err = match registry.create("nope", &OrchestratorConfig::default()) {
            Err(e) => e,
            Ok(_) => panic!("created an unknown plugin"),
        };
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn extensions_can_register_factories() {
        let registry = PluginRegistry::new();
        fn audit(_: &OrchestratorConfig) -> Arc<dyn Plugin> {
            Arc::new(LoggingPlugin::new())
        }
        registry.register("audit", Arc::new(audit));
        assert!(registry.has("audit"));
        assert!(!registry.has("cache"));
    }
}
