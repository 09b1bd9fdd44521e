use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::normalize::normalize;
use crate::orchestrator::params::ChunkCallback;
use crate::plugins::PluginPipeline;
use crate::provider::{ProviderAdapter, ProviderRequest};
use crate::trace::SpanGuard;
use crate::types::{ChunkCallbackData, CompletionResponse, Usage};
use crate::{Error, Result};

/// Text and thinking the caller has already received.
#[derive(Default)]
struct Delivered {
    text: String,
    thinking: String,
}

/// Delivers chunks to the caller and counts them.
///
/// Refuses delivery once the call is cancelled.
pub(crate) struct ChunkSink {
    on_chunk: ChunkCallback,
    cancel: CancellationToken,
    delivered: AtomicUsize,
    seen: Mutex<Delivered>,
}

impl ChunkSink {
    pub(crate) fn new(on_chunk: ChunkCallback, cancel: CancellationToken) -> Self {
        Self {
            on_chunk,
            cancel,
            delivered: AtomicUsize::new(0),
            seen: Mutex::new(Delivered::default()),
        }
    }

    pub(crate) fn emit(&self, chunk: ChunkCallbackData) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        {
            let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(t) = &chunk.text {
                seen.text.push_str(t);
            }
            if let Some(t) = &chunk.thinking {
                seen.thinking.push_str(t);
            }
        }
        (self.on_chunk)(chunk);
        self.delivered.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Close a successful call.
    ///
    /// Whatever part of the final response the caller has not seen goes out
    /// first, then the usage-only chunk with the final totals. When the delivered
    /// text is not a prefix of the final text, the final text is sent whole.
    pub(crate) fn finish(&self, response: &CompletionResponse) -> Result<()> {
        let (text, thinking) = {
            let seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
            (
                unseen(&seen.text, &response.text),
                unseen(&seen.thinking, &response.thinking),
            )
        };
        if text.is_some() || thinking.is_some() {
            self.emit(ChunkCallbackData {
                text,
                thinking,
                usage: Some(response.usage),
            })?;
        }
        self.emit(ChunkCallbackData {
            usage: Some(response.usage),
            ..Default::default()
        })
    }

    pub(crate) fn delivered(&self) -> usize {
        self.delivered.load(Ordering::Relaxed)
    }
}

fn unseen(delivered: &str, full: &str) -> Option<String> {
    let rest = full.strip_prefix(delivered).unwrap_or(full);
    (!rest.is_empty()).then(|| rest.to_string())
}

/// Error raised by the adapter mid-stream, re-tagged with what was counted so far.
fn interrupted(err: Error, usage: Usage) -> Error {
    match err {
        Error::Cancelled => Error::Cancelled,
        Error::Stream { message, .. } => Error::Stream {
            message,
            partial_usage: usage,
        },
        other => Error::Stream {
            message: other.to_string(),
            partial_usage: usage,
        },
    }
}

/// Innermost step of the plugin chain: open the provider stream and drain it.
///
/// Every event goes to the plugins' stream hooks, is normalized, and folded
/// into the response. Events carrying text or thinking become chunks with the
/// running usage. Usage events are increments. Cancellation is checked
/// before each poll; returning drops the adapter stream.
pub(crate) async fn stream_completion(
    adapter: Arc<dyn ProviderAdapter>,
    pipeline: &PluginPipeline,
    request: ProviderRequest,
    sink: &ChunkSink,
    _span: Option<SpanGuard<'_>>,
) -> Result<CompletionResponse> {
    let cancel = request.cancel.clone();
    let provider = request.model.provider.clone();

    let mut stream = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(Error::Cancelled),
        opened = adapter.stream(request.clone()) => opened?,
    };

    let mut response = CompletionResponse::default();
    let mut usage = Usage::default();

    loop {
        let item = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            item = stream.next() => item,
        };
        let raw = match item {
            None => break,
            Some(Ok(raw)) => raw,
            Some(Err(err)) => return Err(interrupted(err, usage)),
        };

        let event = normalize(&provider, raw)?;
        pipeline.dispatch_stream_event(&request, &event).await?;

        if let Some(delta) = event.usage() {
            usage += delta;
        }
        if let Some(reason) = event.finish_reason() {
            response.finish_reason = Some(reason.to_string());
        }
        if let Some(session) = event.session() {
            response.session = Some(session.clone());
        }

        let text = event.text().filter(|t| !t.is_empty());
        let thinking = event.thinking().filter(|t| !t.is_empty());
        if text.is_none() && thinking.is_none() {
            continue;
        }
        if let Some(t) = text {
            response.text.push_str(t);
        }
        if let Some(t) = thinking {
            response.thinking.push_str(t);
        }
        sink.emit(ChunkCallbackData {
            text: text.map(str::to_string),
            thinking: thinking.map(str::to_string),
            usage: Some(usage),
        })?;
    }

    // Adapters end their streams early on cancellation.
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    trace!(
        request_id = request.request_id.as_str(),
        provider = provider.as_str(),
        chunks = sink.delivered(),
        total_tokens = usage.total_tokens,
        "provider stream drained"
    );
    response.usage = usage;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupted_keeps_partial_usage() {
        let err = interrupted(Error::runtime("socket closed"), Usage::new(3, 2));
        assert_eq!(err.partial_usage(), Some(&Usage::new(3, 2)));
        assert!(matches!(err, Error::Stream { .. }));
    }

    #[test]
    fn interrupted_leaves_cancellation_alone() {
        assert!(interrupted(Error::Cancelled, Usage::new(1, 1)).is_cancelled());
    }

    #[test]
    fn sink_stops_after_cancel() {
        let seen = Arc::new(Mutex::new(0));
        let seen2 = seen.clone();
        let token = CancellationToken::new();
        let sink = ChunkSink::new(
            Arc::new(move |_| *seen2.lock().unwrap() += 1),
            token.clone(),
        );
        sink.emit(ChunkCallbackData::default()).unwrap();
        token.cancel();
        assert!(sink.emit(ChunkCallbackData::default()).unwrap_err().is_cancelled());
        assert_eq!(*seen.lock().unwrap(), 1);
        assert_eq!(sink.delivered(), 1);
    }

    fn recording_sink() -> (ChunkSink, Arc<Mutex<Vec<ChunkCallbackData>>>) {
        let chunks: Arc<Mutex<Vec<ChunkCallbackData>>> = Arc::default();
        let out = chunks.clone();
        let sink = ChunkSink::new(
            Arc::new(move |c: ChunkCallbackData| out.lock().unwrap().push(c)),
            CancellationToken::new(),
        );
        (sink, chunks)
    }

    #[test]
    fn finish_sends_only_the_unseen_suffix() {
        let (sink, chunks) = recording_sink();
        sink.emit(ChunkCallbackData {
            text: Some("hello".into()),
            ..Default::default()
        })
        .unwrap();
        let mut response = CompletionResponse::from_text("hello world");
        response.usage = Usage::new(1, 2);
        sink.finish(&response).unwrap();

        let chunks = chunks.lock().unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].text.as_deref(), Some(" world"));
        assert_eq!(chunks[2].text, None);
        assert_eq!(chunks[2].usage, Some(Usage::new(1, 2)));
    }

    #[test]
    fn finish_resends_rewritten_text_whole() {
        let (sink, chunks) = recording_sink();
        sink.emit(ChunkCallbackData {
            text: Some("par".into()),
            ..Default::default()
        })
        .unwrap();
        sink.finish(&CompletionResponse::from_text("recovered")).unwrap();

        let texts: Vec<_> = chunks.lock().unwrap().iter().map(|c| c.text.clone()).collect();
        assert_eq!(
            texts,
            vec![Some(String::from("par")), Some(String::from("recovered")), None]
        );
    }

    #[test]
    fn finish_after_full_stream_is_usage_only() {
        let (sink, chunks) = recording_sink();
        sink.emit(ChunkCallbackData {
            text: Some("done".into()),
            ..Default::default()
        })
        .unwrap();
        sink.finish(&CompletionResponse::from_text("done")).unwrap();
        assert_eq!(chunks.lock().unwrap().len(), 2);
    }
}
