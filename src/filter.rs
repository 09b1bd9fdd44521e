//! Message filtering applied before a request reaches a provider.

use std::sync::Arc;

use crate::types::Message;

/// Caller-supplied replacement or extension of the default filter.
pub type MessageFilterFn = Arc<dyn Fn(&[Message]) -> Vec<Message> + Send + Sync>;

/// How a caller-supplied filter combines with the default one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterMode {
    /// Run only the caller's filter.
    #[default]
    Replace,
    /// Run the default filter, then the caller's filter on its output.
    Chain,
}

/// Drop mention markers, keeping the relative order of everything else.
pub fn filter_messages(messages: &[Message]) -> Vec<Message> {
    messages.iter().filter(|m| !m.is_mention()).cloned().collect()
}

/// Apply the default filter and/or an override according to `mode`.
pub fn apply_filter(
    messages: &[Message],
    custom: Option<&MessageFilterFn>,
    mode: FilterMode,
) -> Vec<Message> {
    match (custom, mode) {
        (None, _) => filter_messages(messages),
        (Some(f), FilterMode::Replace) => f(messages),
        (Some(f), FilterMode::Chain) => f(&filter_messages(messages)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MENTION_MARKER;

    fn kinds(ms: &[Message]) -> Vec<Option<&str>> {
        ms.iter().map(|m| m.kind.as_deref()).collect()
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(filter_messages(&[]).is_empty());
    }

    #[test]
    fn removes_only_mentions() {
        let input = vec![
            Message::user("@gpt").with_kind(MENTION_MARKER),
            Message::user("hello").with_kind("text"),
        ];
        let out = filter_messages(&input);
        assert_eq!(kinds(&out), vec![Some("text")]);
        // input untouched
        assert_eq!(input.len(), 2);
    }

    #[test]
    fn preserves_relative_order() {
        let input = vec![
            Message::user("1"),
            Message::user("@").with_kind(MENTION_MARKER),
            Message::assistant("2"),
            Message::user("@").with_kind(MENTION_MARKER),
            Message::user("3"),
        ];
        let texts: Vec<_> = filter_messages(&input).iter().map(|m| m.text()).collect();
        assert_eq!(texts, vec!["1", "2", "3"]);
    }

    #[test]
    fn replace_mode_propagates_override_output_exactly() {
        let input = vec![Message::user("a").with_kind(MENTION_MARKER), Message::user("b")];
        let custom: MessageFilterFn = Arc::new(|ms| ms.to_vec());
        let out = apply_filter(&input, Some(&custom), FilterMode::Replace);
        assert_eq!(out, input);
    }

    #[test]
    fn chain_mode_runs_default_first() {
        let input = vec![
            Message::user("a").with_kind(MENTION_MARKER),
            Message::user("b"),
            Message::user("c"),
        ];
        let seen = Arc::new(std::sync::Mutex::new(0usize));
        let seen_in = seen.clone();
        let custom: MessageFilterFn = Arc::new(move |ms| {
            *seen_in.lock().unwrap() = ms.len();
            ms[1..].to_vec()
        });
        let out = apply_filter(&input, Some(&custom), FilterMode::Chain);
        assert_eq!(*seen.lock().unwrap(), 2);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text(), "c");
    }
}
