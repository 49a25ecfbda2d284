//! Speech session state machine with thread-safe transitions.
//!
//! Enforces valid state transitions for the speech capture lifecycle:
//! - Idle -> Listening (session started)
//! - Listening -> Idle (stop requested, provider error, provider end)
//!
//! There is no separate terminal state: a stopped session is simply Idle
//! again and a new session may start from there.

use std::fmt;
use std::sync::{Arc, Mutex};

use confab_core::error::ConfabError;

/// Operational state of a speech session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpeechState {
    /// No session in progress. Ready to start.
    Idle,
    /// Actively streaming transcripts from the provider.
    Listening,
}

impl fmt::Display for SpeechState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeechState::Idle => write!(f, "Idle"),
            SpeechState::Listening => write!(f, "Listening"),
        }
    }
}

impl SpeechState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &SpeechState) -> bool {
        matches!(
            (self, target),
            (SpeechState::Idle, SpeechState::Listening)
                | (SpeechState::Listening, SpeechState::Idle)
        )
    }
}

/// Thread-safe state machine for speech session transitions.
///
/// Wraps `SpeechState` in an `Arc<Mutex<>>` to allow safe concurrent access.
/// Transitions are validated before being applied. Redundant requests (start
/// while Listening, stop while Idle) are filtered out by the session before
/// reaching this machine, so an invalid transition here signals a logic bug.
#[derive(Debug, Clone)]
pub struct StateMachine {
    state: Arc<Mutex<SpeechState>>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// Create a new state machine initialized to `Idle`.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SpeechState::Idle)),
        }
    }

    /// Returns the current state.
    pub fn current(&self) -> SpeechState {
        *self.state.lock().expect("state mutex poisoned")
    }

    /// Attempt to transition to the target state.
    pub fn transition(&self, target: SpeechState) -> Result<(), ConfabError> {
        let mut state = self.state.lock().expect("state mutex poisoned");
        if state.can_transition_to(&target) {
            tracing::debug!("Speech state: {} -> {}", *state, target);
            *state = target;
            Ok(())
        } else {
            Err(ConfabError::Speech(format!(
                "Invalid state transition: {} -> {}",
                *state, target
            )))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
