//! Raw provider events and their normalized form.

use serde::{Deserialize, Serialize};

use super::usage::Usage;

/// Session/system event emitted by agent-style SDKs (e.g. an `init` message
/// announcing the session and the tools it may call).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub slash_commands: Vec<String>,
    /// Provider-native payload, untouched.
    #[serde(default)]
    pub raw: serde_json::Value,
}

/// Plain content-block event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentDelta {
    #[serde(rename = "text")]
    Text { text: String },

    #[serde(rename = "thinking")]
    Thinking { thinking: String },

    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },

    /// Usage increment reported mid-stream.
    #[serde(rename = "usage")]
    Usage { usage: Usage },

    #[serde(rename = "finish")]
    Finish {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        finish_reason: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        usage: Option<Usage>,
    },
}

impl ContentDelta {
    pub fn text(text: impl Into<String>) -> Self {
        ContentDelta::Text { text: text.into() }
    }
}

/// Event as produced by a provider adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum RawProviderEvent {
    Session(SessionEvent),
    Content(ContentDelta),
    /// A payload the adapter could not classify; rejected by normalization.
    Unrecognized { tag: String, raw: serde_json::Value },
}

const SESSION_TAGS: &[&str] = &["system", "session"];
const CONTENT_TAGS: &[&str] = &["text", "thinking", "tool_use", "usage", "finish"];

impl RawProviderEvent {
    /// Classify an SDK payload by its `type` tag.
    ///
    /// Known tags whose body does not deserialize stay `Unrecognized` so the
    /// normalizer reports them instead of dropping them.
    pub fn from_json(value: serde_json::Value) -> Self {
        let tag = value
            .get("type")
            .and_then(|t| t.as_str())
            .unwrap_or_default()
            .to_string();

        if SESSION_TAGS.contains(&tag.as_str()) {
            if let Some(session) = session_from_sdk(&value) {
                return RawProviderEvent::Session(session);
            }
        } else if CONTENT_TAGS.contains(&tag.as_str()) {
            if let Ok(delta) = serde_json::from_value::<ContentDelta>(value.clone()) {
                return RawProviderEvent::Content(delta);
            }
        }

        RawProviderEvent::Unrecognized { tag, raw: value }
    }

    pub fn tag(&self) -> &str {
        match self {
            RawProviderEvent::Session(_) => "session",
            RawProviderEvent::Content(_) => "content",
            RawProviderEvent::Unrecognized { tag, .. } => tag,
        }
    }
}

fn session_from_sdk(value: &serde_json::Value) -> Option<SessionEvent> {
    let session_id = value.get("session_id")?.as_str()?.to_string();
    let names = |key: &str| -> Vec<String> {
        value
            .get(key)
            .and_then(|v| v.as_array())
            .map(|a| {
                a.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    };
    Some(SessionEvent {
        session_id,
        subtype: value
            .get("subtype")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        model: value
            .get("model")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        tools: names("tools"),
        slash_commands: names("slash_commands"),
        raw: value.clone(),
    })
}

/// Discriminant of a normalized event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Session,
    Content,
}

/// Session details kept after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: String,
    pub tools: Vec<String>,
    pub commands: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventPayload {
    Session(SessionInfo),
    Content(ContentDelta),
}

/// Provider-independent event consumed by plugins and the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub provider: String,
    pub kind: EventKind,
    pub payload: EventPayload,
}

impl NormalizedEvent {
    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            EventPayload::Content(ContentDelta::Text { text }) => Some(text),
            _ => None,
        }
    }

    pub fn thinking(&self) -> Option<&str> {
        match &self.payload {
            EventPayload::Content(ContentDelta::Thinking { thinking }) => Some(thinking),
            _ => None,
        }
    }

    pub fn usage(&self) -> Option<Usage> {
        match &self.payload {
            EventPayload::Content(ContentDelta::Usage { usage }) => Some(*usage),
            EventPayload::Content(ContentDelta::Finish { usage, .. }) => *usage,
            _ => None,
        }
    }

    pub fn finish_reason(&self) -> Option<&str> {
        match &self.payload {
            EventPayload::Content(ContentDelta::Finish { finish_reason, .. }) => {
                finish_reason.as_deref()
            }
            _ => None,
        }
    }

    pub fn session(&self) -> Option<&SessionInfo> {
        match &self.payload {
            EventPayload::Session(info) => Some(info),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_sdk_init_message() {
        let ev = RawProviderEvent::from_json(json!({
            "type": "system",
            "subtype": "init",
            "session_id": "s-1",
            "tools": ["Read", "Bash"],
            "slash_commands": ["compact"],
            "model": "sonnet"
        }));
        match ev {
            RawProviderEvent::Session(s) => {
                assert_eq!(s.session_id, "s-1");
                assert_eq!(s.tools, vec!["Read", "Bash"]);
                assert_eq!(s.slash_commands, vec!["compact"]);
                assert_eq!(s.raw["subtype"], "init");
            }
            other => panic!("expected session, got {other:?}"),
        }
    }

    #[test]
    fn classifies_content_blocks() {
        let ev = RawProviderEvent::from_json(json!({"type": "text", "text": "hi"}));
        assert_eq!(ev, RawProviderEvent::Content(ContentDelta::text("hi")));

        let ev = RawProviderEvent::from_json(json!({
            "type": "finish",
            "finish_reason": "stop",
            "usage": {"promptTokens": 1, "completionTokens": 2, "totalTokens": 3}
        }));
        assert!(matches!(
            ev,
            RawProviderEvent::Content(ContentDelta::Finish { usage: Some(_), .. })
        ));
    }

    #[test]
    fn unknown_and_malformed_tags_are_kept_unrecognized() {
        let ev = RawProviderEvent::from_json(json!({"type": "ping"}));
        assert_eq!(ev.tag(), "ping");

        // Known tag, missing the session id.
        let ev = RawProviderEvent::from_json(json!({"type": "system"}));
        assert!(matches!(ev, RawProviderEvent::Unrecognized { .. }));
    }
}
