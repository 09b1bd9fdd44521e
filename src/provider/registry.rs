//! Provider registry.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::debug;

use super::ProviderAdapter;
use crate::{Error, Result};

/// Creates an adapter instance for a provider id.
pub type ProviderFactory = Arc<dyn Fn() -> Arc<dyn ProviderAdapter> + Send + Sync>;

/// Maps provider ids to adapter factories.
///
/// Reads are lock-free snapshots; `register`/`unregister` publish a new map.
/// Meant to be built at startup and shared via `Arc`.
pub struct ProviderRegistry {
    providers: ArcSwap<HashMap<String, ProviderFactory>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// Registry pre-populated with every built-in adapter.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        for (id, factory) in super::builtin_providers() {
            registry.register(id, factory);
        }
        registry
    }

    /// Register (or replace) the factory for `provider_id`. Last write wins.
    pub fn register(&self, provider_id: impl Into<String>, factory: ProviderFactory) {
        let provider_id = provider_id.into();
        debug!(provider = provider_id.as_str(), "registering provider");
        self.providers.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.insert(provider_id.clone(), factory.clone());
            next
        });
    }

    /// Register a single shared adapter instance.
    pub fn register_adapter(&self, provider_id: impl Into<String>, adapter: Arc<dyn ProviderAdapter>) {
        self.register(provider_id, Arc::new(move || adapter.clone()));
    }

    pub fn unregister(&self, provider_id: &str) -> bool {
        let mut removed = false;
        self.providers.rcu(|current| {
            let mut next = HashMap::clone(current);
            removed = next.remove(provider_id).is_some();
            next
        });
        removed
    }

    /// Resolve an adapter. Never suspends.
    pub fn resolve(&self, provider_id: &str) -> Result<Arc<dyn ProviderAdapter>> {
        self.providers
            .load()
            .get(provider_id)
            .map(|factory| factory())
            .ok_or_else(|| Error::ProviderNotFound {
                provider: provider_id.to_string(),
            })
    }

    pub fn contains(&self, provider_id: &str) -> bool {
        self.providers.load().contains_key(provider_id)
    }

    /// Registered ids, sorted.
    pub fn provider_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.providers.load().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.providers.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{EchoProvider, ScriptedProvider};

    #[test]
    fn resolve_unknown_provider_fails() {
        let registry = ProviderRegistry::new();
        match registry.resolve("nope") {
            Err(Error::ProviderNotFound { provider }) => assert_eq!(provider, "nope"),
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("resolved an unregistered provider"),
        }
    }

    #[test]
    fn re_registration_last_write_wins() {
        let registry = ProviderRegistry::new();
        registry.register_adapter("p", Arc::new(EchoProvider::new()));
        registry.register_adapter("p", Arc::new(ScriptedProvider::new("scripted", vec![])));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.resolve("p").unwrap().id(), "scripted");
    }

    #[test]
    fn builtins_are_enumerable() {
        let registry = ProviderRegistry::with_builtins();
        assert!(registry.contains("echo"));
        assert_eq!(registry.provider_ids(), vec!["echo".to_string()]);
    }

    #[test]
    fn unregister_removes_entry() {
        let registry = ProviderRegistry::with_builtins();
        assert!(registry.unregister("echo"));
        assert!(!registry.unregister("echo"));
        assert!(registry.is_empty());
    }
}
