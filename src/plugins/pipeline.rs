//! Onion composition of plugins around the provider call.

use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use super::base::{Plugin, PluginContext};
use crate::provider::ProviderRequest;
use crate::types::{CompletionResponse, NormalizedEvent};
use crate::{Error, Result};

/// An ordered plugin chain composed into a single callable.
///
/// Registration order is significant: earlier plugins wrap later ones.
#[derive(Clone, Default)]
pub struct PluginPipeline {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginPipeline {
    pub fn compose(plugins: Vec<Arc<dyn Plugin>>) -> Self {
        Self { plugins }
    }

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Append `more` inside the current chain.
    pub fn extend(mut self, more: impl IntoIterator<Item = Arc<dyn Plugin>>) -> Self {
        self.plugins.extend(more);
        self
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// Run the chain around `next`.
    ///
    /// Before-hooks fire in order, then `next` with the (possibly rewritten)
    /// request, then after-hooks in reverse. A failure at depth `i` is offered
    /// to the `on_error` hooks of plugins `i-1..=0`; a failure of `next` is
    /// offered to all of them. A before-hook answering with a response stops
    /// the descent: only the plugins outside it see that response.
    ///
    /// The cancel token is checked again before each after-hook and once the
    /// chain has unwound. Cancellation observed there replaces the outcome,
    /// so every plugin still outside sees it through `on_error`.
    pub async fn run<F, Fut>(&self, ctx: &mut PluginContext, next: F) -> Result<CompletionResponse>
    where
        F: FnOnce(ProviderRequest) -> Fut,
        Fut: Future<Output = Result<CompletionResponse>>,
    {
        let mut entered = self.plugins.len();
        let mut early: Option<Result<CompletionResponse>> = None;

        for (depth, plugin) in self.plugins.iter().enumerate() {
            match plugin.on_before_request(ctx).await {
                Ok(None) => {}
                Ok(Some(response)) => {
                    debug!(
                        plugin = plugin.name(),
                        request_id = ctx.request_id(),
                        "plugin short-circuited request"
                    );
                    ctx.short_circuited_by = Some(plugin.name().to_string());
                    entered = depth;
                    early = Some(Ok(response));
                    break;
                }
                Err(e) => {
                    entered = depth;
                    early = Some(Err(Error::from_plugin(plugin.name(), e)));
                    break;
                }
            }
        }
        ctx.entered = entered;

        let mut outcome = match early {
            Some(outcome) => outcome,
            None => next(ctx.request.clone()).await,
        };

        for plugin in self.plugins[..entered].iter().rev() {
            if ctx.request.cancel.is_cancelled() && !matches!(outcome, Err(Error::Cancelled)) {
                debug!(
                    plugin = plugin.name(),
                    request_id = ctx.request_id(),
                    "cancelled while unwinding"
                );
                outcome = Err(Error::Cancelled);
            }
            outcome = match outcome {
                Ok(response) => plugin
                    .on_after_response(ctx, response)
                    .await
                    .map_err(|e| Error::from_plugin(plugin.name(), e)),
                Err(Error::Cancelled) => {
                    // Terminal: the hook may release resources but cannot recover.
                    let _ = plugin.on_error(ctx, Error::Cancelled).await;
                    Err(Error::Cancelled)
                }
                Err(err) => plugin.on_error(ctx, err).await,
            };
        }

        if ctx.request.cancel.is_cancelled() && outcome.is_ok() {
            self.notify_cancelled(ctx).await;
            return Err(Error::Cancelled);
        }
        outcome
    }

    /// Offer [`Error::Cancelled`] to every plugin that took part in the last
    /// run, innermost first. Used when cancellation lands after the chain has
    /// already unwound with a response.
    pub async fn notify_cancelled(&self, ctx: &mut PluginContext) {
        let entered = ctx.entered.min(self.plugins.len());
        for plugin in self.plugins[..entered].iter().rev() {
            let _ = plugin.on_error(ctx, Error::Cancelled).await;
        }
    }

    /// Offer a streamed event to every plugin, in registration order.
    pub async fn dispatch_stream_event(
        &self,
        request: &ProviderRequest,
        event: &NormalizedEvent,
    ) -> Result<()> {
        for plugin in &self.plugins {
            plugin
                .on_stream_event(request, event)
                .await
                .map_err(|e| Error::from_plugin(plugin.name(), e))?;
        }
        Ok(())
    }
}
