//! Built-in plugins.

mod cache;
mod context_window;
mod logging;

pub use cache::{cache_key, CachePlugin};
pub use context_window::ContextWindowPlugin;
pub use logging::LoggingPlugin;

use std::sync::Arc;

use super::base::Plugin;
use super::registry::PluginFactory;
use crate::config::OrchestratorConfig;

fn logging(_: &OrchestratorConfig) -> Arc<dyn Plugin> {
    Arc::new(LoggingPlugin::new())
}

fn cache(config: &OrchestratorConfig) -> Arc<dyn Plugin> {
    Arc::new(CachePlugin::new(config.cache_capacity))
}

fn context_window(config: &OrchestratorConfig) -> Arc<dyn Plugin> {
    Arc::new(ContextWindowPlugin::new(config.default_context_count))
}

/// Index of built-in plugins, keyed by stable plugin id.
pub fn builtin_plugins() -> Vec<(&'static str, PluginFactory)> {
    let logging: PluginFactory = Arc::new(logging);
    let cache: PluginFactory = Arc::new(cache);
    let context_window: PluginFactory = Arc::new(context_window);
    vec![
        ("logging", logging),
        ("cache", cache),
        ("context_window", context_window),
    ]
}
