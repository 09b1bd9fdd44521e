//! # ai-core-rust
//!
//! 多厂商 AI 补全编排核心：提供商注册、插件管线、流式分块回调与调用链追踪。
//!
//! Completion orchestration core for multi-provider AI backends. One entry
//! point, [`Orchestrator::completions`], turns a conversation and an assistant
//! configuration into an ordered stream of chunks while plugins observe and
//! rewrite the call.
//!
//! ## Overview
//!
//! A call filters the conversation, resolves a provider adapter from the
//! [`ProviderRegistry`], and drains the adapter's event stream inside a
//! [`PluginPipeline`]. Provider-specific events are normalized into
//! [`NormalizedEvent`]s before anything downstream sees them, so plugins and
//! callers never branch on the provider.
//!
//! ## Key Features
//!
//! - **Provider registry**: adapters registered by id; last registration wins
//! - **Onion plugins**: before-hooks in order, after-hooks in reverse, errors routed outward
//! - **Streaming chunks**: text and thinking deltas with running token usage
//! - **Cancellation**: a [`CancellationToken`](tokio_util::sync::CancellationToken) aborts the call and releases the stream
//! - **Tracing**: spans per call phase, rebuilt into trees by [`trace::build_trace_trees`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ai_core_rust::{Assistant, CompletionsParams, Message, Model, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> ai_core_rust::Result<()> {
//!     let orchestrator = Orchestrator::builder().builtin_plugin("logging").build()?;
//!
//!     let assistant = Assistant::new("helper", Model::new("echo-1", "echo"));
//!     let params = CompletionsParams::new(
//!         vec![Message::user("Hello there")],
//!         assistant,
//!         |chunk| {
//!             if let Some(text) = chunk.text {
//!                 print!("{text}");
//!             }
//!         },
//!     );
//!
//!     let response = orchestrator.completions(params).await?;
//!     println!("\n{} tokens", response.usage.total_tokens);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`orchestrator`] | Completion state machine and builder |
//! | [`provider`] | Adapter trait, registry, built-in adapters |
//! | [`plugins`] | Plugin trait, onion pipeline, built-in plugins |
//! | [`normalize`] | Provider event → normalized event |
//! | [`filter`] | Default conversation filter and overrides |
//! | [`identity`] | Stable model identity strings |
//! | [`trace`] | Span recording and trace trees |
//! | [`config`] | YAML / environment configuration |
//! | [`types`] | Messages, models, events, usage, chunks |

pub mod config;
pub mod filter;
pub mod identity;
pub mod normalize;
pub mod orchestrator;
pub mod plugins;
pub mod provider;
pub mod trace;
pub mod types;

// Re-export main types for convenience
pub use config::OrchestratorConfig;
pub use filter::{FilterMode, MessageFilterFn};
pub use orchestrator::{CompletionState, CompletionsParams, Orchestrator, OrchestratorBuilder};
pub use plugins::{Plugin, PluginContext, PluginPipeline, PluginRegistry};
pub use provider::{ProviderAdapter, ProviderRegistry, ProviderRequest};
pub use trace::{SpanEntity, TraceModal, TraceRecorder};
pub use types::{
    Assistant, AssistantSettings, ChunkCallbackData, CompletionResponse, Message, MessageRole,
    Model, NormalizedEvent, RawProviderEvent, Usage,
};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A pinned, boxed stream of fallible items, as returned by provider adapters
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
