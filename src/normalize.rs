//! Raw event normalization.
//!
//! Adapters speak either an agent-SDK dialect (session/system messages) or a
//! plain content-block dialect. Both are folded into [`NormalizedEvent`] here,
//! keeping the discriminant so consumers can tell session lifecycle apart
//! from content.

use crate::types::{
    EventKind, EventPayload, NormalizedEvent, RawProviderEvent, SessionEvent, SessionInfo,
};
use crate::{Error, Result};

/// Normalize one event emitted by `provider`.
pub fn normalize(provider: &str, event: RawProviderEvent) -> Result<NormalizedEvent> {
    match event {
        RawProviderEvent::Session(session) => Ok(NormalizedEvent {
            provider: provider.to_string(),
            kind: EventKind::Session,
            payload: EventPayload::Session(session_info(session)),
        }),
        RawProviderEvent::Content(delta) => Ok(NormalizedEvent {
            provider: provider.to_string(),
            kind: EventKind::Content,
            payload: EventPayload::Content(delta),
        }),
        RawProviderEvent::Unrecognized { tag, .. } => Err(Error::Normalization {
            provider: provider.to_string(),
            tag,
        }),
    }
}

fn session_info(session: SessionEvent) -> SessionInfo {
    SessionInfo {
        session_id: session.session_id,
        tools: session.tools,
        commands: session.slash_commands,
        model: session.model,
        raw: session.raw,
    }
}
