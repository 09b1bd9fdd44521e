//! Models and assistants.

use serde::{Deserialize, Serialize};

/// A model exposed by a provider.
///
/// Only `(id, provider)` identify the target; everything else is display or
/// routing metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Model {
    pub fn new(id: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            provider: provider.into(),
            name: None,
            group: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Sampling and context settings of an assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Number of most recent messages sent to the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_count: Option<usize>,
    #[serde(default = "default_stream_output")]
    pub stream_output: bool,
}

fn default_stream_output() -> bool {
    true
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            temperature: None,
            top_p: None,
            max_tokens: None,
            context_count: None,
            stream_output: default_stream_output(),
        }
    }
}

/// Configuration bundle selected by the caller; read-only to the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assistant {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub prompt: String,
    pub model: Model,
    #[serde(default)]
    pub settings: AssistantSettings,
}

impl Assistant {
    pub fn new(name: impl Into<String>, model: Model) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            prompt: String::new(),
            model,
            settings: AssistantSettings::default(),
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_settings(mut self, settings: AssistantSettings) -> Self {
        self.settings = settings;
        self
    }
}
