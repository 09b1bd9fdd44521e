//! Stable identity keys for models.

use serde::Serialize;

use crate::types::Model;

/// The `(id, provider)` projection of a [`Model`].
///
/// Field order is fixed by the struct declaration, so serialization does not
/// depend on how the source object was built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ModelIdentity<'a> {
    pub id: &'a str,
    pub provider: &'a str,
}

impl<'a> From<&'a Model> for ModelIdentity<'a> {
    fn from(m: &'a Model) -> Self {
        Self {
            id: &m.id,
            provider: &m.provider,
        }
    }
}

impl ModelIdentity<'_> {
    pub fn key(&self) -> String {
        // Two string fields always serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Canonical identity key of a model, e.g. `{"id":"gpt-4o","provider":"openai"}`.
pub fn model_identity(model: &Model) -> String {
    ModelIdentity::from(model).key()
}

/// Identity key from raw parts.
pub fn model_identity_value(id: &str, provider: &str) -> String {
    ModelIdentity { id, provider }.key()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_extra_fields_and_key_order() {
        let a: Model =
            serde_json::from_str(r#"{"provider":"openai","id":"gpt-4o","name":"GPT-4o"}"#).unwrap();
        let b: Model = serde_json::from_str(
            r#"{"id":"gpt-4o","group":"gpt","provider":"openai","owned_by":"x"}"#,
        )
        .unwrap();
        assert_eq!(model_identity(&a), model_identity(&b));
        assert_eq!(model_identity(&a), r#"{"id":"gpt-4o","provider":"openai"}"#);
    }

    #[test]
    fn distinguishes_providers() {
        let a = Model::new("deepseek-chat", "deepseek");
        let b = Model::new("deepseek-chat", "silicon");
        assert_ne!(model_identity(&a), model_identity(&b));
    }

    #[test]
    fn raw_parts_match_model() {
        let m = Model::new("m", "p").with_name("display");
        assert_eq!(model_identity(&m), model_identity_value("m", "p"));
    }

    #[test]
    fn escapes_separator_characters() {
        // A naive "id:provider" join would collide here.
        let a = Model::new("a:b", "c");
        let b = Model::new("a", "b:c");
        assert_ne!(model_identity(&a), model_identity(&b));
    }
}
