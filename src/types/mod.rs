//! 类型系统模块：编排引擎使用的核心数据类型。
//!
//! # Types Module
//!
//! Strongly-typed representations of everything that crosses the orchestrator
//! boundary.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Message`] | Chat message with role, content and optional `type` marker |
//! | [`Model`] | Model id plus owning provider id |
//! | [`Assistant`] | Model reference and sampling settings chosen by the caller |
//! | [`RawProviderEvent`] | Session or content event as emitted by an adapter |
//! | [`NormalizedEvent`] | Provider-independent event consumed downstream |
//! | [`ChunkCallbackData`] | Incremental output delivered to the caller |
//! | [`CompletionResponse`] | Aggregated result of one call |
//! | [`Usage`] | Token counters |
//! | [`Topic`] | Conversation thread |
//!
//! ## Example
//!
//! ```rust
//! use ai_core_rust::types::{Assistant, Message, Model};
//!
//! let assistant = Assistant::new("Default", Model::new("gpt-4o", "openai"));
//! let messages = vec![
//!     Message::system("You are a helpful assistant"),
//!     Message::user("What's the weather?"),
//! ];
//! assert_eq!(assistant.model.provider, "openai");
//! assert_eq!(messages.len(), 2);
//! ```

pub mod chunk;
pub mod events;
pub mod message;
pub mod model;
pub mod topic;
pub mod usage;

pub use chunk::{ChunkCallbackData, CompletionResponse};
pub use events::{
    ContentDelta, EventKind, EventPayload, NormalizedEvent, RawProviderEvent, SessionEvent,
    SessionInfo,
};
pub use message::{ContentBlock, Message, MessageContent, MessageRole, MENTION_MARKER};
pub use model::{Assistant, AssistantSettings, Model};
pub use topic::Topic;
pub use usage::Usage;
