//! Provider adapters and the registry that resolves them.
//!
//! An adapter has one capability: turn a [`ProviderRequest`] into a lazy,
//! cancellable stream of [`RawProviderEvent`]s. Wire protocols live behind
//! this trait; the orchestrator never sees them.

mod builtin;
mod registry;

pub use builtin::{builtin_providers, EchoProvider, ScriptStep, ScriptedProvider};
pub use registry::{ProviderFactory, ProviderRegistry};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::types::{AssistantSettings, Message, Model, RawProviderEvent};
use crate::{BoxStream, Result};

/// Payload handed to an adapter for one streaming call.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub request_id: String,
    pub model: Model,
    /// System prompt of the assistant, if any.
    pub prompt: Option<String>,
    pub messages: Vec<Message>,
    pub settings: AssistantSettings,
    /// Cancelled when the caller aborts; adapters stop producing events.
    pub cancel: CancellationToken,
}

#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn id(&self) -> &str;

    /// Open a streaming call.
    ///
    /// Anything acquired for the call must be owned by the returned stream so
    /// that dropping the stream releases it.
    async fn stream(&self, request: ProviderRequest)
        -> Result<BoxStream<'static, RawProviderEvent>>;
}
