//! Base plugin types.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::provider::ProviderRequest;
use crate::types::{CompletionResponse, NormalizedEvent};
use crate::{Error, Result};

/// Per-call state shared by every hook of one pipeline run.
#[derive(Debug, Clone)]
pub struct PluginContext {
    /// Request that will be handed to the provider; before-hooks may rewrite it.
    pub request: ProviderRequest,
    pub metadata: HashMap<String, serde_json::Value>,
    /// Name of the plugin that answered without calling the provider.
    pub short_circuited_by: Option<String>,
    /// Plugins whose before-hook completed and so take part in unwinding.
    pub(crate) entered: usize,
}

impl PluginContext {
    pub fn new(request: ProviderRequest) -> Self {
        Self {
            request,
            metadata: HashMap::new(),
            short_circuited_by: None,
            entered: 0,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request.request_id
    }

    pub fn provider(&self) -> &str {
        &self.request.model.provider
    }

    pub fn model(&self) -> &str {
        &self.request.model.id
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.metadata.insert(key.into(), value);
    }

    pub fn is_short_circuited(&self) -> bool {
        self.short_circuited_by.is_some()
    }
}

/// Middleware around the provider call.
///
/// Hooks default to pass-through, so a plugin only implements what it needs.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    /// Runs before the provider call. Returning a response skips the provider
    /// and every plugin registered after this one.
    async fn on_before_request(&self, _ctx: &mut PluginContext) -> Result<Option<CompletionResponse>> {
        Ok(None)
    }

    async fn on_after_response(
        &self,
        _ctx: &mut PluginContext,
        response: CompletionResponse,
    ) -> Result<CompletionResponse> {
        Ok(response)
    }

    /// Returning `Ok` recovers the call; returning `Err` passes the (possibly
    /// replaced) error outward. Recovery is ignored for [`Error::Cancelled`].
    async fn on_error(&self, _ctx: &mut PluginContext, error: Error) -> Result<CompletionResponse> {
        Err(error)
    }

    /// Observes each normalized event, in stream order.
    async fn on_stream_event(
        &self,
        _request: &ProviderRequest,
        _event: &NormalizedEvent,
    ) -> Result<()> {
        Ok(())
    }
}
