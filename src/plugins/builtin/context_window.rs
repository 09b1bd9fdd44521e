use async_trait::async_trait;
use tracing::debug;

use crate::plugins::{Plugin, PluginContext};
use crate::types::{CompletionResponse, Message, MessageRole};
use crate::Result;

/// Keeps system messages plus the `context_count` most recent other messages.
///
/// The assistant's own `context_count` wins over the plugin default.
#[derive(Debug, Default)]
pub struct ContextWindowPlugin {
    default_count: Option<usize>,
}

impl ContextWindowPlugin {
    pub fn new(default_count: Option<usize>) -> Self {
        Self { default_count }
    }
}

pub(crate) fn trim_to_window(messages: &[Message], count: usize) -> Vec<Message> {
    let conversational = messages
        .iter()
        .filter(|m| m.role != MessageRole::System)
        .count();
    let mut skip = conversational.saturating_sub(count);
    messages
        .iter()
        .filter(|m| {
            if m.role == MessageRole::System {
                return true;
            }
            if skip > 0 {
                skip -= 1;
                return false;
            }
            true
        })
        .cloned()
        .collect()
}

#[async_trait]
impl Plugin for ContextWindowPlugin {
    fn name(&self) -> &str {
        "context_window"
    }

    async fn on_before_request(&self, ctx: &mut PluginContext) -> Result<Option<CompletionResponse>> {
        let Some(count) = ctx.request.settings.context_count.or(self.default_count) else {
            return Ok(None);
        };
        let before = ctx.request.messages.len();
        ctx.request.messages = trim_to_window(&ctx.request.messages, count);
        debug!(
            request_id = ctx.request_id(),
            before,
            after = ctx.request.messages.len(),
            "context window applied"
        );
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(ms: &[Message]) -> Vec<String> {
        ms.iter().map(|m| m.text()).collect()
    }

    #[test]
    fn keeps_system_and_latest() {
        let ms = vec![
            Message::system("sys"),
            Message::user("1"),
            Message::assistant("2"),
            Message::user("3"),
        ];
        assert_eq!(texts(&trim_to_window(&ms, 2)), vec!["sys", "2", "3"]);
    }

    #[test]
    fn larger_window_keeps_everything() {
        let ms = vec![Message::user("1"), Message::user("2")];
        assert_eq!(trim_to_window(&ms, 10), ms);
    }

    #[test]
    fn zero_window_keeps_only_system() {
        let ms = vec![Message::system("s"), Message::user("1")];
        assert_eq!(texts(&trim_to_window(&ms, 0)), vec!["s"]);
    }
}
