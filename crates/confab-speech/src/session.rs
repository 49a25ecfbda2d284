//! Speech session driving transcripts into the staged input text.
//!
//! The session binds a locale at start and keeps it for its whole lifetime;
//! language selection changes only affect the next session. Transcript events
//! carry the cumulative text of the current utterance, and the session
//! overwrites the sink with it on every event so earlier words can be revised
//! live as recognition confidence improves.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use confab_core::error::Result;

use crate::provider::{SpeechErrorKind, SpeechEvent, SpeechProvider};
use crate::state::{SpeechState, StateMachine};

/// Receives the cumulative transcript while a session is listening.
///
/// Implemented by the input staging area; the session never sees the rest of
/// the staged state.
pub trait TranscriptSink: Send + Sync {
    /// Replace the staged text with the cumulative transcript.
    fn set_transcript(&self, text: &str);
}

/// Data tracked for one active listening period.
#[derive(Debug, Clone)]
struct ActiveSession {
    id: Uuid,
    locale: String,
    started_at: DateTime<Utc>,
}

impl ActiveSession {
    fn new(locale: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            locale,
            started_at: Utc::now(),
        }
    }

    fn elapsed_secs(&self) -> f64 {
        let elapsed = Utc::now() - self.started_at;
        elapsed.num_milliseconds() as f64 / 1000.0
    }
}

/// A bounded period during which the provider streams transcripts into the
/// staged text.
///
/// Redundant requests are no-ops: starting while Listening and stopping while
/// Idle change nothing. If the provider capability is absent in the host
/// environment the session is permanently disabled and `start` is a no-op.
pub struct SpeechSession {
    state: StateMachine,
    provider: Arc<dyn SpeechProvider>,
    sink: Arc<dyn TranscriptSink>,
    active: Mutex<Option<ActiveSession>>,
}

impl SpeechSession {
    /// Create a new session wrapper in the Idle state.
    pub fn new(provider: Arc<dyn SpeechProvider>, sink: Arc<dyn TranscriptSink>) -> Self {
        Self {
            state: StateMachine::new(),
            provider,
            sink,
            active: Mutex::new(None),
        }
    }

    /// Whether the provider capability exists at all. The presentation layer
    /// hides or disables the listening affordance when this is false.
    pub fn is_available(&self) -> bool {
        self.provider.is_available()
    }

    /// Whether a session is currently active.
    pub fn is_listening(&self) -> bool {
        self.state.current() == SpeechState::Listening
    }

    /// The locale the active session was started with, if one is active.
    pub fn active_locale(&self) -> Option<String> {
        self.active
            .lock()
            .expect("session mutex poisoned")
            .as_ref()
            .map(|s| s.locale.clone())
    }

    /// Start a session bound to `locale`.
    ///
    /// No-op when the capability is unavailable or a session is already
    /// active. The locale stays fixed until the session ends, regardless of
    /// later language selection changes.
    pub fn start(&self, locale: &str) -> Result<()> {
        if !self.provider.is_available() {
            tracing::debug!("Speech capability unavailable, start ignored");
            return Ok(());
        }
        if self.is_listening() {
            tracing::debug!("Speech session already active, start ignored");
            return Ok(());
        }

        self.provider.configure(locale)?;
        self.provider.start()?;
        self.state.transition(SpeechState::Listening)?;

        let session = ActiveSession::new(locale.to_string());
        tracing::info!(session_id = %session.id, locale, "Speech session started");
        *self.active.lock().expect("session mutex poisoned") = Some(session);
        Ok(())
    }

    /// Stop the active session.
    ///
    /// No-op when Idle. Takes effect immediately from the controller's point
    /// of view: the provider is asked to shut down but its `Ended` event is
    /// not awaited, and whatever text is staged at this moment is retained.
    pub fn stop(&self) -> Result<()> {
        if !self.is_listening() {
            tracing::debug!("No speech session active, stop ignored");
            return Ok(());
        }

        if let Err(e) = self.provider.stop() {
            tracing::warn!(error = %e, "Provider stop request failed");
        }
        self.state.transition(SpeechState::Idle)?;
        self.finish_session("stopped");
        Ok(())
    }

    /// Handle a cumulative transcript event (interim or final).
    ///
    /// Overwrites the staged text with the full transcript delivered so far.
    /// Events arriving after the session ended are dropped, which is what
    /// makes `stop` immediate: late provider output cannot disturb the text
    /// that was staged at stop time.
    pub fn on_transcript(&self, cumulative_text: &str, is_final: bool) -> bool {
        if !self.is_listening() {
            tracing::debug!("Transcript after session end, ignored");
            return false;
        }
        self.sink.set_transcript(cumulative_text);
        tracing::debug!(
            chars = cumulative_text.len(),
            is_final,
            "Transcript applied"
        );
        true
    }

    /// Handle a provider error: log it and return to Idle.
    ///
    /// The error is never surfaced into the conversation.
    pub fn on_error(&self, kind: &SpeechErrorKind) {
        if !self.is_listening() {
            return;
        }
        tracing::warn!(kind = %kind, "Speech provider error, session stopped");
        // The provider already tore itself down; only our state needs fixing.
        let _ = self.state.transition(SpeechState::Idle);
        self.finish_session("provider error");
    }

    /// Handle a provider-initiated end of session, e.g. a silence timeout.
    pub fn on_ended(&self) {
        if !self.is_listening() {
            // Normal after a local stop(): the provider's own end event
            // arrives later and has nothing left to do.
            return;
        }
        let _ = self.state.transition(SpeechState::Idle);
        self.finish_session("ended by provider");
    }

    /// Dispatch a provider event to the matching handler.
    ///
    /// Returns true if the event changed any state.
    pub fn handle_event(&self, event: &SpeechEvent) -> bool {
        match event {
            SpeechEvent::Transcript {
                cumulative_text,
                is_final,
            } => self.on_transcript(cumulative_text, *is_final),
            SpeechEvent::Error { kind } => {
                let was_listening = self.is_listening();
                self.on_error(kind);
                was_listening
            }
            SpeechEvent::Ended => {
                let was_listening = self.is_listening();
                self.on_ended();
                was_listening
            }
        }
    }

    fn finish_session(&self, how: &str) {
        let finished = self.active.lock().expect("session mutex poisoned").take();
        if let Some(session) = finished {
            tracing::info!(
                session_id = %session.id,
                elapsed_secs = session.elapsed_secs(),
                "Speech session {}",
                how
            );
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
