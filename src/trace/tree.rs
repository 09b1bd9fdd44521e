//! Flat span list → parent-relative trace trees.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One recorded operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanEntity {
    pub id: String,
    pub parent_id: Option<String>,
    pub name: String,
    /// Absolute start, in milliseconds.
    pub start: f64,
    /// Milliseconds.
    pub duration: f64,
}

impl SpanEntity {
    pub fn new(
        id: impl Into<String>,
        parent_id: Option<&str>,
        name: impl Into<String>,
        start: f64,
        duration: f64,
    ) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.map(str::to_string),
            name: name.into(),
            start,
            duration,
        }
    }
}

/// A span placed in its tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceModal {
    pub id: String,
    pub parent_id: Option<String>,
    pub name: String,
    /// Offset from the root's start.
    pub start: f64,
    pub duration: f64,
    /// `duration / root.duration`; siblings are not normalized against each other.
    pub percent: f64,
    pub children: Vec<TraceModal>,
}

impl TraceModal {
    /// Depth-first search by id.
    pub fn find(&self, id: &str) -> Option<&TraceModal> {
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            if node.id == id {
                return Some(node);
            }
            pending.extend(node.children.iter().rev());
        }
        None
    }

    /// Number of spans in this subtree, including itself.
    pub fn size(&self) -> usize {
        let mut pending = vec![self];
        let mut count = 0;
        while let Some(node) = pending.pop() {
            count += 1;
            pending.extend(node.children.iter());
        }
        count
    }
}

struct Builder<'a> {
    spans: &'a [SpanEntity],
    children: HashMap<&'a str, Vec<usize>>,
    visited: HashSet<usize>,
}

/// A span whose children are still being placed.
struct Frame {
    idx: usize,
    kids: std::vec::IntoIter<usize>,
    children: Vec<TraceModal>,
}

impl<'a> Builder<'a> {
    fn enter(&mut self, idx: usize) -> Frame {
        self.visited.insert(idx);
        let spans = self.spans;
        let mut kids: Vec<usize> = self
            .children
            .get(spans[idx].id.as_str())
            .map(|v| {
                v.iter()
                    .copied()
                    .filter(|i| !self.visited.contains(i))
                    .collect()
            })
            .unwrap_or_default();
        kids.sort_by(|a, b| spans[*a].start.total_cmp(&spans[*b].start));
        Frame {
            idx,
            children: Vec::with_capacity(kids.len()),
            kids: kids.into_iter(),
        }
    }

    fn finish(&self, frame: Frame, root_start: f64, root_duration: f64) -> TraceModal {
        let span = &self.spans[frame.idx];
        TraceModal {
            id: span.id.clone(),
            parent_id: span.parent_id.clone(),
            name: span.name.clone(),
            start: span.start - root_start,
            duration: span.duration,
            percent: if root_duration > 0.0 {
                span.duration / root_duration
            } else {
                0.0
            },
            children: frame.children,
        }
    }

    /// Depth-first placement with an explicit stack, so nesting depth is
    /// bounded by memory rather than by the thread's stack.
    fn root(&mut self, idx: usize) -> TraceModal {
        let (root_start, root_duration) = (self.spans[idx].start, self.spans[idx].duration);
        let mut stack: Vec<Frame> = Vec::new();
        let mut current = self.enter(idx);

        loop {
            // A span reachable twice (cycle or duplicate parent link) is placed once.
            let visited = &self.visited;
            if let Some(kid) = current.kids.by_ref().find(|k| !visited.contains(k)) {
                let next = self.enter(kid);
                stack.push(std::mem::replace(&mut current, next));
                continue;
            }
            let node = self.finish(current, root_start, root_duration);
            match stack.pop() {
                Some(mut parent) => {
                    parent.children.push(node);
                    current = parent;
                }
                None => return node,
            }
        }
    }
}

/// Build one tree per root.
///
/// Roots are spans without a parent, or whose parent id is not in `spans`.
/// Spans caught in a parent cycle are promoted to roots so none is lost.
/// Trees are returned ordered by root start.
pub fn build_trace_trees(spans: &[SpanEntity]) -> Vec<TraceModal> {
    let ids: HashSet<&str> = spans.iter().map(|s| s.id.as_str()).collect();

    let mut children: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut roots: Vec<usize> = Vec::new();
    for (idx, span) in spans.iter().enumerate() {
        match span.parent_id.as_deref() {
            Some(parent) if ids.contains(parent) && parent != span.id => {
                children.entry(parent).or_default().push(idx)
            }
            _ => roots.push(idx),
        }
    }
    roots.sort_by(|a, b| spans[*a].start.total_cmp(&spans[*b].start));

    let mut builder = Builder {
        spans,
        children,
        visited: HashSet::new(),
    };
    let mut trees: Vec<TraceModal> = roots.into_iter().map(|r| builder.root(r)).collect();

    loop {
        let orphan = (0..spans.len())
            .filter(|i| !builder.visited.contains(i))
            .min_by(|a, b| spans[*a].start.total_cmp(&spans[*b].start));
        match orphan {
            Some(idx) => trees.push(builder.root(idx)),
            None => break,
        }
    }

    trees
}

/// Tree rooted at `root_id`, if present.
pub fn build_trace_tree(spans: &[SpanEntity], root_id: &str) -> Option<TraceModal> {
    build_trace_trees(spans)
        .into_iter()
        .find_map(|t| t.find(root_id).cloned())
}
