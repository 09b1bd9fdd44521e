//! Completion orchestrator.
//!
//! One call moves through `Idle → Filtering → Resolving → Streaming` and ends
//! in `Completed` or `Failed`. The provider stream runs as the innermost step
//! of the plugin chain, so plugins see the request before the adapter does and
//! the aggregated response after it finishes.

mod builder;
mod core;
mod execution;
mod params;
mod state;

pub use builder::OrchestratorBuilder;
pub use self::core::Orchestrator;
pub use params::{ChunkCallback, CompletionsParams};
pub use state::CompletionState;
