//! Span recording and trace-tree reconstruction.
//!
//! The orchestrator records a flat list of [`SpanEntity`] values while a call
//! runs; [`build_trace_trees`] turns any such list into [`TraceModal`] trees
//! with root-relative offsets and duration percentages for rendering.

mod recorder;
mod tree;

pub use recorder::{SpanGuard, TraceRecorder};
pub use tree::{build_trace_tree, build_trace_trees, SpanEntity, TraceModal};
