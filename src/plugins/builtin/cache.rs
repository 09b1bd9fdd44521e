//! Response cache.

use async_trait::async_trait;
use lru::LruCache;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

use crate::identity::model_identity;
use crate::plugins::{Plugin, PluginContext};
use crate::provider::ProviderRequest;
use crate::types::CompletionResponse;
use crate::Result;

const CACHE_KEY_META: &str = "cache_key";

/// Hash of everything that shapes a completion: model identity, prompt,
/// messages and sampling settings.
pub fn cache_key(request: &ProviderRequest) -> String {
    let mut parts: BTreeMap<&str, String> = BTreeMap::new();
    parts.insert("model", model_identity(&request.model));
    if let Some(ref prompt) = request.prompt {
        parts.insert("prompt", prompt.clone());
    }
    parts.insert(
        "messages",
        serde_json::to_string(&request.messages).unwrap_or_default(),
    );
    if let Some(t) = request.settings.temperature {
        parts.insert("temperature", format!("{:.2}", t));
    }
    if let Some(p) = request.settings.top_p {
        parts.insert("top_p", format!("{:.2}", p));
    }
    if let Some(m) = request.settings.max_tokens {
        parts.insert("max_tokens", m.to_string());
    }
    let canonical = serde_json::to_string(&parts).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Answers repeated requests from memory without calling the provider.
pub struct CachePlugin {
    entries: Mutex<LruCache<String, CompletionResponse>>,
}

impl CachePlugin {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[async_trait]
impl Plugin for CachePlugin {
    fn name(&self) -> &str {
        "cache"
    }

    async fn on_before_request(&self, ctx: &mut PluginContext) -> Result<Option<CompletionResponse>> {
        let key = cache_key(&ctx.request);
        let hit = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        match hit {
            Some(response) => {
                debug!(request_id = ctx.request_id(), key = key.as_str(), "cache hit");
                Ok(Some(response))
            }
            None => {
                ctx.set_metadata(CACHE_KEY_META, serde_json::Value::String(key));
                Ok(None)
            }
        }
    }

    async fn on_after_response(
        &self,
        ctx: &mut PluginContext,
        response: CompletionResponse,
    ) -> Result<CompletionResponse> {
        if let Some(key) = ctx.metadata.get(CACHE_KEY_META).and_then(|v| v.as_str()) {
            self.entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .put(key.to_string(), response.clone());
        }
        Ok(response)
    }
}
