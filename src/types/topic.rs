use serde::{Deserialize, Serialize};

use super::message::Message;

/// A conversation thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: String,
    pub assistant_id: String,
    pub name: String,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Topic {
    /// Fresh topic with a unique id and no messages.
    pub fn new(assistant_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            assistant_id: assistant_id.into(),
            name: name.into(),
            messages: Vec::new(),
        }
    }
}
