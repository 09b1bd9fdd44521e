//! In-process span sink written to by the orchestrator.

use std::sync::{Mutex, PoisonError};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use super::tree::{build_trace_trees, SpanEntity, TraceModal};

fn now_ms() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1_000.0)
        .unwrap_or_default()
}

/// Collects finished spans. Share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct TraceRecorder {
    spans: Mutex<Vec<SpanEntity>>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a span; it is recorded when the guard finishes or drops.
    pub fn span(&self, name: impl Into<String>, parent: Option<&str>) -> SpanGuard<'_> {
        SpanGuard {
            recorder: self,
            id: uuid::Uuid::new_v4().to_string(),
            parent_id: parent.map(str::to_string),
            name: name.into(),
            start: now_ms(),
            started: Instant::now(),
            done: false,
        }
    }

    pub fn record(&self, span: SpanEntity) {
        self.spans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(span);
    }

    pub fn spans(&self) -> Vec<SpanEntity> {
        self.spans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<SpanEntity> {
        std::mem::take(&mut *self.spans.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn trees(&self) -> Vec<TraceModal> {
        build_trace_trees(&self.spans())
    }

    pub fn len(&self) -> usize {
        self.spans.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An open span.
pub struct SpanGuard<'a> {
    recorder: &'a TraceRecorder,
    id: String,
    parent_id: Option<String>,
    name: String,
    start: f64,
    started: Instant,
    done: bool,
}

impl<'a> SpanGuard<'a> {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Open a child span.
    pub fn child(&self, name: impl Into<String>) -> SpanGuard<'a> {
        self.recorder.span(name, Some(&self.id))
    }

    pub fn finish(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if self.done {
            return;
        }
        self.done = true;
        self.recorder.record(SpanEntity {
            id: std::mem::take(&mut self.id),
            parent_id: self.parent_id.take(),
            name: std::mem::take(&mut self.name),
            start: self.start,
            duration: self.started.elapsed().as_secs_f64() * 1_000.0,
        });
    }
}

impl Drop for SpanGuard<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_guards_build_one_tree() {
        let recorder = TraceRecorder::new();
        {
            let root = recorder.span("completions", None);
            root.child("filter_messages").finish();
            {
                let _stream = root.child("provider_stream");
            }
            root.finish();
        }
        assert_eq!(recorder.len(), 3);

        let trees = recorder.trees();
        assert_eq!(trees.len(), 1);
        let root = &trees[0];
        assert_eq!(root.name, "completions");
        let names: Vec<_> = root.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["filter_messages", "provider_stream"]);
        assert!(root.children.iter().all(|c| c.start >= 0.0));
    }

    #[test]
    fn take_drains() {
        let recorder = TraceRecorder::new();
        recorder.span("a", None).finish();
        assert_eq!(recorder.take().len(), 1);
        assert!(recorder.is_empty());
    }
}
