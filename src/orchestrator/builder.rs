use std::sync::Arc;

use tracing::debug;

use crate::config::OrchestratorConfig;
use crate::orchestrator::core::Orchestrator;
use crate::plugins::{Plugin, PluginPipeline, PluginRegistry};
use crate::provider::ProviderRegistry;
use crate::trace::TraceRecorder;
use crate::Result;

/// Builder for [`Orchestrator`].
///
/// Plugins named in the config are created first (outermost), then the ids
/// added with [`builtin_plugin`](Self::builtin_plugin), then the ones added
/// with [`plugin`](Self::plugin), in call order.
pub struct OrchestratorBuilder {
    registry: Option<Arc<ProviderRegistry>>,
    plugin_registry: PluginRegistry,
    builtin_ids: Vec<String>,
    plugins: Vec<Arc<dyn Plugin>>,
    config: OrchestratorConfig,
    recorder: Option<Arc<TraceRecorder>>,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            registry: None,
            plugin_registry: PluginRegistry::with_builtins(),
            builtin_ids: Vec::new(),
            plugins: Vec::new(),
            config: OrchestratorConfig::default(),
            recorder: None,
        }
    }

    /// Share a provider registry. Defaults to one holding the built-ins.
    pub fn registry(mut self, registry: Arc<ProviderRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Replace the plugin factory table used to resolve config ids.
    pub fn plugin_registry(mut self, registry: PluginRegistry) -> Self {
        self.plugin_registry = registry;
        self
    }

    pub fn plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Enable a plugin by id, placed after the configured list.
    ///
    /// Survives a later [`config`](Self::config) call.
    pub fn builtin_plugin(mut self, id: impl Into<String>) -> Self {
        self.builtin_ids.push(id.into());
        self
    }

    pub fn config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Record spans into `recorder`. Implied by `trace: true` in config.
    pub fn trace_recorder(mut self, recorder: Arc<TraceRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn build(mut self) -> Result<Orchestrator> {
        self.config.plugins.append(&mut self.builtin_ids);
        self.config.validate()?;

        let mut plugins = self.plugin_registry.create_all(&self.config)?;
        plugins.extend(self.plugins);
        let pipeline = PluginPipeline::compose(plugins);

        let recorder = match self.recorder {
            Some(r) => Some(r),
            None if self.config.trace => Some(Arc::new(TraceRecorder::new())),
            None => None,
        };
        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(ProviderRegistry::with_builtins()));

        debug!(
            plugins = ?pipeline.names(),
            providers = registry.len(),
            trace = recorder.is_some(),
            "orchestrator built"
        );

        Ok(Orchestrator::from_parts(registry, pipeline, self.config, recorder))
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
