//! Benchmarks for trace reconstruction and the completion hot path
//!
//! This benchmark measures:
//! - Building trace trees from flat span lists of growing size
//! - Event normalization
//! - One full echo completion through the plugin pipeline

use ai_core_rust::normalize::normalize;
use ai_core_rust::trace::build_trace_trees;
use ai_core_rust::{
    Assistant, CompletionsParams, Message, Model, Orchestrator, RawProviderEvent, SpanEntity,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;

/// Balanced-ish span forest: each span's parent is `i / 4`.
fn span_forest(n: usize) -> Vec<SpanEntity> {
    (0..n)
        .map(|i| {
            let parent = (i > 0).then(|| format!("s{}", (i - 1) / 4));
            SpanEntity::new(
                format!("s{i}"),
                parent.as_deref(),
                format!("op{i}"),
                i as f64,
                (n - i) as f64,
            )
        })
        .collect()
}

fn bench_build_trees(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_trace_trees");
    for n in [16usize, 256, 4096] {
        let spans = span_forest(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &spans, |b, spans| {
            b.iter(|| build_trace_trees(black_box(spans)))
        });
    }
    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");
    let raw = json!({"type": "text", "text": "hello"});
    group.bench_function("text_delta", |b| {
        b.iter(|| {
            let event = RawProviderEvent::from_json(black_box(raw.clone()));
            normalize("bench", event)
        })
    });
    group.finish();
}

fn bench_echo_completion(c: &mut Criterion) {
    let mut group = c.benchmark_group("completion");
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(_) => return,
    };
    let orchestrator = match Orchestrator::builder().builtin_plugin("context_window").build() {
        Ok(o) => o,
        Err(_) => return,
    };
    let prompt = "the quick brown fox jumps over the lazy dog";

    group.bench_function("echo_with_plugin", |b| {
        b.to_async(&runtime).iter(|| async {
            let params = CompletionsParams::new(
                vec![Message::user(prompt)],
                Assistant::new("bench", Model::new("echo-1", "echo")),
                |chunk| {
                    black_box(chunk);
                },
            );
            orchestrator.completions(params).await
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_build_trees,
    bench_normalize,
    bench_echo_completion
);
criterion_main!(benches);
