//! Plugin system: hooks, onion pipeline, registry and built-ins.

mod base;
pub mod builtin;
mod pipeline;
mod registry;

pub use base::{Plugin, PluginContext};
pub use builtin::{builtin_plugins, CachePlugin, ContextWindowPlugin, LoggingPlugin};
pub use pipeline::PluginPipeline;
pub use registry::{PluginFactory, PluginRegistry};
