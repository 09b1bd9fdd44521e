//! Token usage counters.

use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// Cumulative token usage for one completion call.
///
/// Providers that omit `totalTokens` get it derived from the other two.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "UsageWire")]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageWire {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

impl From<UsageWire> for Usage {
    fn from(w: UsageWire) -> Self {
        Usage {
            prompt_tokens: w.prompt_tokens,
            completion_tokens: w.completion_tokens,
            total_tokens: w.total_tokens,
        }
        .with_derived_total()
    }
}

impl Usage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    /// Fill a missing total from the prompt and completion counts.
    fn with_derived_total(mut self) -> Self {
        if self.total_tokens == 0 {
            self.total_tokens = self.prompt_tokens.saturating_add(self.completion_tokens);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.prompt_tokens == 0 && self.completion_tokens == 0 && self.total_tokens == 0
    }
}

impl AddAssign for Usage {
    fn add_assign(&mut self, rhs: Self) {
        let rhs = rhs.with_derived_total();
        self.prompt_tokens = self.prompt_tokens.saturating_add(rhs.prompt_tokens);
        self.completion_tokens = self.completion_tokens.saturating_add(rhs.completion_tokens);
        self.total_tokens = self.total_tokens.saturating_add(rhs.total_tokens);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_all_counters() {
        let mut total = Usage::default();
        total += Usage::new(10, 2);
        total += Usage::new(0, 5);
        assert_eq!(total, Usage::new(10, 7));
        assert_eq!(total.total_tokens, 17);
    }

    #[test]
    fn deserializes_partial_camel_case() {
        let u: Usage = serde_json::from_str(r#"{"promptTokens": 4}"#).unwrap();
        assert_eq!(u.prompt_tokens, 4);
        assert_eq!(u.completion_tokens, 0);
        assert_eq!(u.total_tokens, 4);
    }

    #[test]
    fn missing_total_is_derived() {
        let u: Usage =
            serde_json::from_str(r#"{"promptTokens": 7, "completionTokens": 3}"#).unwrap();
        assert_eq!(u, Usage::new(7, 3));

        let mut running = Usage::default();
        running += Usage {
            prompt_tokens: 2,
            completion_tokens: 1,
            total_tokens: 0,
        };
        running += Usage::new(0, 4);
        assert_eq!(running.total_tokens, 7);
    }

    #[test]
    fn reported_total_is_kept() {
        let u: Usage = serde_json::from_str(
            r#"{"promptTokens": 7, "completionTokens": 3, "totalTokens": 12}"#,
        )
        .unwrap();
        assert_eq!(u.total_tokens, 12);
    }
}
