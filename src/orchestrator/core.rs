use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::OrchestratorConfig;
use crate::filter::apply_filter;
use crate::orchestrator::builder::OrchestratorBuilder;
use crate::orchestrator::execution::{stream_completion, ChunkSink};
use crate::orchestrator::params::CompletionsParams;
use crate::orchestrator::state::{CallState, CompletionState};
use crate::plugins::{PluginContext, PluginPipeline};
use crate::provider::{ProviderRegistry, ProviderRequest};
use crate::trace::{SpanGuard, TraceRecorder};
use crate::types::CompletionResponse;
use crate::{Error, Result};

/// Runs completion calls: filter, resolve, then stream through the plugin chain.
///
/// Cheap to share behind an `Arc`; calls do not share mutable state apart
/// from the provider registry and whatever plugins keep.
pub struct Orchestrator {
    registry: Arc<ProviderRegistry>,
    pipeline: PluginPipeline,
    config: OrchestratorConfig,
    recorder: Option<Arc<TraceRecorder>>,
}

fn ensure_live(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(Error::Cancelled)
    } else {
        Ok(())
    }
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Built-in providers, no plugins.
    pub fn new() -> Result<Self> {
        OrchestratorBuilder::new().build()
    }

    /// Configure from `AI_CORE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        OrchestratorBuilder::new()
            .config(OrchestratorConfig::from_env()?)
            .build()
    }

    pub(crate) fn from_parts(
        registry: Arc<ProviderRegistry>,
        pipeline: PluginPipeline,
        config: OrchestratorConfig,
        recorder: Option<Arc<TraceRecorder>>,
    ) -> Self {
        Self {
            registry,
            pipeline,
            config,
            recorder,
        }
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn plugin_names(&self) -> Vec<&str> {
        self.pipeline.names()
    }

    pub fn trace_recorder(&self) -> Option<&Arc<TraceRecorder>> {
        self.recorder.as_ref()
    }

    /// Run one completion call.
    ///
    /// Chunks reach `params.on_chunk` in stream order while the call runs,
    /// each with the running usage. A successful call always ends with one
    /// usage-only chunk carrying the final totals. After a failure or a
    /// cancellation no further chunk is delivered.
    pub async fn completions(&self, params: CompletionsParams) -> Result<CompletionResponse> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let mut call = CallState::new(&request_id);
        let provider = params.assistant.model.provider.clone();
        let model = params.assistant.model.id.clone();
        let root = self.recorder.as_deref().map(|r| r.span("completions", None));

        let result = self.run(&mut call, &request_id, params, root.as_ref()).await;

        match &result {
            Ok(response) => {
                call.advance(CompletionState::Completed);
                info!(
                    request_id = request_id.as_str(),
                    provider = provider.as_str(),
                    model = model.as_str(),
                    chunks = response.chunk_count,
                    total_tokens = response.usage.total_tokens,
                    "completion finished"
                );
            }
            Err(err) => {
                call.advance(CompletionState::Failed);
                warn!(
                    request_id = request_id.as_str(),
                    provider = provider.as_str(),
                    model = model.as_str(),
                    cancelled = err.is_cancelled(),
                    error = %err,
                    "completion failed"
                );
            }
        }
        result
    }

    async fn run(
        &self,
        call: &mut CallState,
        request_id: &str,
        params: CompletionsParams,
        root: Option<&SpanGuard<'_>>,
    ) -> Result<CompletionResponse> {
        let CompletionsParams {
            messages,
            assistant,
            on_chunk,
            on_filter_messages,
            filter_mode,
            plugins,
            cancel,
        } = params;
        ensure_live(&cancel)?;

        call.advance(CompletionState::Filtering);
        let filtered = {
            let _span = root.map(|r| r.child("filter_messages"));
            apply_filter(&messages, on_filter_messages.as_ref(), filter_mode)
        };
        ensure_live(&cancel)?;

        call.advance(CompletionState::Resolving);
        let adapter = {
            let _span = root.map(|r| r.child("resolve_provider"));
            self.registry.resolve(&assistant.model.provider)?
        };
        ensure_live(&cancel)?;

        call.advance(CompletionState::Streaming);
        let prompt = Some(assistant.prompt).filter(|p| !p.is_empty());
        let request = ProviderRequest {
            request_id: request_id.to_string(),
            model: assistant.model,
            prompt,
            messages: filtered,
            settings: assistant.settings,
            cancel: cancel.clone(),
        };

        let pipeline = self.pipeline.clone().extend(plugins);
        let mut ctx = PluginContext::new(request);
        let sink = ChunkSink::new(on_chunk, cancel);
        let pipeline_span = root.map(|r| r.child("plugin_pipeline"));

        let outcome = pipeline
            .run(&mut ctx, |request| {
                let span = pipeline_span.as_ref().map(|s| s.child("provider_stream"));
                stream_completion(adapter, &pipeline, request, &sink, span)
            })
            .await;
        drop(pipeline_span);
        let mut response = outcome?;

        if let Err(err) = sink.finish(&response) {
            // Cancelled between the unwind and the last chunk.
            pipeline.notify_cancelled(&mut ctx).await;
            return Err(err);
        }
        response.chunk_count = sink.delivered();
        Ok(response)
    }
}
