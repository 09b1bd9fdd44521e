//! Built-in adapters.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;

use super::{ProviderAdapter, ProviderFactory, ProviderRequest};
use crate::types::{ContentDelta, MessageRole, RawProviderEvent, Usage};
use crate::{BoxStream, Error, Result};

/// Index of built-in adapters, keyed by stable provider id.
pub fn builtin_providers() -> Vec<(&'static str, ProviderFactory)> {
    let echo: ProviderFactory = Arc::new(echo);
    vec![("echo", echo)]
}

fn echo() -> Arc<dyn ProviderAdapter> {
    Arc::new(EchoProvider::new())
}

/// Streams the last user message back one word at a time.
#[derive(Debug, Default)]
pub struct EchoProvider;

impl EchoProvider {
    pub fn new() -> Self {
        Self
    }
}

fn word_count(s: &str) -> u64 {
    s.split_whitespace().count() as u64
}

#[async_trait]
impl ProviderAdapter for EchoProvider {
    fn id(&self) -> &str {
        "echo"
    }

    async fn stream(
        &self,
        request: ProviderRequest,
    ) -> Result<BoxStream<'static, RawProviderEvent>> {
        let prompt_tokens: u64 = request.prompt.as_deref().map(word_count).unwrap_or(0)
            + request
                .messages
                .iter()
                .map(|m| word_count(&m.text()))
                .sum::<u64>();
        let reply = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.text())
            .unwrap_or_default();

        let completion_tokens = word_count(&reply);
        let words: Vec<String> = reply
            .split_inclusive(char::is_whitespace)
            .map(str::to_string)
            .collect();

        let mut events: Vec<RawProviderEvent> = words
            .into_iter()
            .map(|w| RawProviderEvent::Content(ContentDelta::Text { text: w }))
            .collect();
        events.push(RawProviderEvent::Content(ContentDelta::Finish {
            finish_reason: Some("stop".to_string()),
            usage: Some(Usage::new(prompt_tokens, completion_tokens)),
        }));

        let token = request.cancel.clone();
        let stream = futures::stream::iter(events)
            .then(|ev| async move {
                tokio::task::yield_now().await;
                Ok(ev)
            })
            .take_until(async move { token.cancelled().await });
        Ok(Box::pin(stream))
    }
}

/// One step of a [`ScriptedProvider`] replay.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    Event(RawProviderEvent),
    /// Pause before the next step.
    Delay(Duration),
    /// Break the stream with a transport-level failure.
    Fail(String),
}

impl From<RawProviderEvent> for ScriptStep {
    fn from(ev: RawProviderEvent) -> Self {
        ScriptStep::Event(ev)
    }
}

/// Replays a fixed script on every call.
///
/// Tracks how many streams are currently open so callers can check that
/// every exit path releases its connection.
#[derive(Debug, Clone)]
pub struct ScriptedProvider {
    id: String,
    steps: Arc<Vec<ScriptStep>>,
    open: Arc<AtomicUsize>,
    opened_total: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    pub fn new(id: impl Into<String>, steps: Vec<ScriptStep>) -> Self {
        Self {
            id: id.into(),
            steps: Arc::new(steps),
            open: Arc::new(AtomicUsize::new(0)),
            opened_total: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Streams opened and not yet dropped.
    pub fn open_streams(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.opened_total.load(Ordering::SeqCst)
    }
}

/// Held by an open scripted stream; releases its slot on drop.
struct ConnectionGuard(Arc<AtomicUsize>);

impl ConnectionGuard {
    fn acquire(open: Arc<AtomicUsize>) -> Self {
        open.fetch_add(1, Ordering::SeqCst);
        Self(open)
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn stream(
        &self,
        request: ProviderRequest,
    ) -> Result<BoxStream<'static, RawProviderEvent>> {
        self.opened_total.fetch_add(1, Ordering::SeqCst);
        let guard = ConnectionGuard::acquire(self.open.clone());
        let steps: Vec<ScriptStep> = self.steps.as_ref().clone();
        let token = request.cancel.clone();

        let stream = futures::stream::iter(steps)
            .filter_map(|step| async move {
                match step {
                    ScriptStep::Delay(d) => {
                        tokio::time::sleep(d).await;
                        None
                    }
                    ScriptStep::Event(ev) => {
                        tokio::task::yield_now().await;
                        Some(Ok(ev))
                    }
                    ScriptStep::Fail(message) => Some(Err(Error::runtime(message))),
                }
            })
            .take_until(async move { token.cancelled().await })
            .map(move |item| {
                let _held = &guard;
                item
            });
        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AssistantSettings, Message, Model};
    use tokio_util::sync::CancellationToken;

    fn request(messages: Vec<Message>) -> ProviderRequest {
        ProviderRequest {
            request_id: "r1".into(),
            model: Model::new("echo-1", "echo"),
            prompt: None,
            messages,
            settings: AssistantSettings::default(),
            cancel: CancellationToken::new(),
        }
    }

    #[tokio::test]
    async fn echo_streams_words_then_finish() {
        let stream = EchoProvider::new()
            .stream(request(vec![Message::user("hello big world")]))
            .await
            .unwrap();
        let events: Vec<_> = stream.map(|e| e.unwrap()).collect().await;
        let texts: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                RawProviderEvent::Content(ContentDelta::Text { text }) => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["hello ", "big ", "world"]);
        assert!(matches!(
            events.last(),
            Some(RawProviderEvent::Content(ContentDelta::Finish {
                usage: Some(Usage { prompt_tokens: 3, completion_tokens: 3, .. }),
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn echo_counts_words_not_whitespace_runs() {
        let stream = EchoProvider::new()
            .stream(request(vec![Message::user("  two   words ")]))
            .await
            .unwrap();
        let events: Vec<_> = stream.map(|e| e.unwrap()).collect().await;
        let usage = events.iter().find_map(|e| match e {
            RawProviderEvent::Content(ContentDelta::Finish { usage, .. }) => *usage,
            _ => None,
        });
        assert_eq!(usage, Some(Usage::new(2, 2)));
    }

    #[tokio::test]
    async fn scripted_stream_releases_connection_on_drop() {
        let provider = ScriptedProvider::new(
            "s",
            vec![
                RawProviderEvent::Content(ContentDelta::text("a")).into(),
                RawProviderEvent::Content(ContentDelta::text("b")).into(),
            ],
        );
        let mut stream = provider.stream(request(vec![])).await.unwrap();
        assert_eq!(provider.open_streams(), 1);
        let _ = stream.next().await;
        drop(stream);
        assert_eq!(provider.open_streams(), 0);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn scripted_stream_stops_when_cancelled() {
        let provider = ScriptedProvider::new(
            "s",
            vec![
                RawProviderEvent::Content(ContentDelta::text("a")).into(),
                ScriptStep::Delay(Duration::from_secs(30)),
                RawProviderEvent::Content(ContentDelta::text("b")).into(),
            ],
        );
        let req = request(vec![]);
        let token = req.cancel.clone();
        let mut stream = provider.stream(req).await.unwrap();
        assert!(stream.next().await.is_some());
        token.cancel();
        assert!(stream.next().await.is_none());
    }
}
