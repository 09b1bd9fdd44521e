use async_trait::async_trait;
use tracing::{info, trace, warn};

use crate::plugins::{Plugin, PluginContext};
use crate::provider::ProviderRequest;
use crate::types::{CompletionResponse, NormalizedEvent};
use crate::{Error, Result};

/// Emits one structured log line per hook.
#[derive(Debug, Default)]
pub struct LoggingPlugin;

impl LoggingPlugin {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Plugin for LoggingPlugin {
    fn name(&self) -> &str {
        "logging"
    }

    async fn on_before_request(&self, ctx: &mut PluginContext) -> Result<Option<CompletionResponse>> {
        info!(
            request_id = ctx.request_id(),
            provider = ctx.provider(),
            model = ctx.model(),
            messages = ctx.request.messages.len(),
            "completion request"
        );
        Ok(None)
    }

    async fn on_after_response(
        &self,
        ctx: &mut PluginContext,
        response: CompletionResponse,
    ) -> Result<CompletionResponse> {
        info!(
            request_id = ctx.request_id(),
            provider = ctx.provider(),
            model = ctx.model(),
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            finish_reason = response.finish_reason.as_deref().unwrap_or(""),
            short_circuited = ctx.is_short_circuited(),
            "completion finished"
        );
        Ok(response)
    }

    async fn on_error(&self, ctx: &mut PluginContext, error: Error) -> Result<CompletionResponse> {
        warn!(
            request_id = ctx.request_id(),
            provider = ctx.provider(),
            model = ctx.model(),
            error = %error,
            "completion failed"
        );
        Err(error)
    }

    async fn on_stream_event(&self, request: &ProviderRequest, event: &NormalizedEvent) -> Result<()> {
        trace!(request_id = request.request_id.as_str(), kind = ?event.kind, "stream event");
        Ok(())
    }
}
