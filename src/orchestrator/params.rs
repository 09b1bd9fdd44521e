use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::filter::{FilterMode, MessageFilterFn};
use crate::plugins::Plugin;
use crate::types::{Assistant, ChunkCallbackData, Message};

/// Receives chunks synchronously, in stream order.
pub type ChunkCallback = Arc<dyn Fn(ChunkCallbackData) + Send + Sync>;

/// Request envelope for one completion call.
pub struct CompletionsParams {
    pub messages: Vec<Message>,
    pub assistant: Assistant,
    pub on_chunk: ChunkCallback,
    pub on_filter_messages: Option<MessageFilterFn>,
    pub filter_mode: FilterMode,
    /// Extra plugins for this call only, wrapped inside the orchestrator's own.
    pub plugins: Vec<Arc<dyn Plugin>>,
    pub cancel: CancellationToken,
}

impl CompletionsParams {
    pub fn new<F>(messages: Vec<Message>, assistant: Assistant, on_chunk: F) -> Self
    where
        F: Fn(ChunkCallbackData) + Send + Sync + 'static,
    {
        Self {
            messages,
            assistant,
            on_chunk: Arc::new(on_chunk),
            on_filter_messages: None,
            filter_mode: FilterMode::default(),
            plugins: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn filter_messages<F>(mut self, filter: F, mode: FilterMode) -> Self
    where
        F: Fn(&[Message]) -> Vec<Message> + Send + Sync + 'static,
    {
        self.on_filter_messages = Some(Arc::new(filter));
        self.filter_mode = mode;
        self
    }

    pub fn plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Use a caller-owned token; cancelling it aborts the call.
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }
}

impl std::fmt::Debug for CompletionsParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionsParams")
            .field("messages", &self.messages.len())
            .field("assistant", &self.assistant.name)
            .field("model", &self.assistant.model.id)
            .field("custom_filter", &self.on_filter_messages.is_some())
            .field("filter_mode", &self.filter_mode)
            .field("plugins", &self.plugins.len())
            .finish()
    }
}
