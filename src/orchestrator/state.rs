use tracing::debug;

/// Lifecycle of one completion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionState {
    Idle,
    Filtering,
    Resolving,
    Streaming,
    Completed,
    Failed,
}

impl CompletionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionState::Idle => "idle",
            CompletionState::Filtering => "filtering",
            CompletionState::Resolving => "resolving",
            CompletionState::Streaming => "streaming",
            CompletionState::Completed => "completed",
            CompletionState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CompletionState::Completed | CompletionState::Failed)
    }

    pub fn can_transition_to(&self, next: CompletionState) -> bool {
        use CompletionState::*;
        match (self, next) {
            (Idle, Filtering) | (Filtering, Resolving) | (Resolving, Streaming) => true,
            (Streaming, Completed) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for CompletionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks and logs the state of one call.
#[derive(Debug)]
pub(crate) struct CallState {
    request_id: String,
    state: CompletionState,
}

impl CallState {
    pub(crate) fn new(request_id: &str) -> Self {
        Self {
            request_id: request_id.to_string(),
            state: CompletionState::Idle,
        }
    }

    #[cfg(test)]
    pub(crate) fn current(&self) -> CompletionState {
        self.state
    }

    pub(crate) fn advance(&mut self, next: CompletionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        debug!(
            request_id = self.request_id.as_str(),
            from = self.state.as_str(),
            to = next.as_str(),
            "completion state"
        );
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CompletionState::*;

    #[test]
    fn happy_path_is_linear() {
        let path = [Idle, Filtering, Resolving, Streaming, Completed];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn any_live_state_may_fail() {
        for s in [Idle, Filtering, Resolving, Streaming] {
            assert!(s.can_transition_to(Failed));
        }
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Failed));
    }

    #[test]
    fn no_skipping_or_going_back() {
        assert!(!Filtering.can_transition_to(Streaming));
        assert!(!Streaming.can_transition_to(Resolving));
        assert!(!Resolving.can_transition_to(Completed));
    }

    #[test]
    fn call_state_tracks_current() {
        let mut call = CallState::new("r");
        call.advance(Filtering);
        call.advance(Failed);
        assert_eq!(call.current(), Failed);
    }
}
