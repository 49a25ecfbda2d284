//! Streaming speech-to-text provider seam.
//!
//! The controller never talks to a concrete recognition engine; it drives a
//! `SpeechProvider` and consumes the `SpeechEvent`s the host pumps back in.
//! A mock implementation is provided for tests and for hosts without a real
//! capability.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use confab_core::error::{ConfabError, Result};

/// Error categories a provider can report mid-session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechErrorKind {
    /// No intelligible speech was detected.
    NoSpeech,
    /// The audio capture device failed or disappeared.
    AudioCapture,
    /// The recognition backend was unreachable.
    Network,
    /// Microphone permission was denied.
    NotAllowed,
    /// Anything the provider does not classify further.
    Other(String),
}

impl fmt::Display for SpeechErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeechErrorKind::NoSpeech => write!(f, "no-speech"),
            SpeechErrorKind::AudioCapture => write!(f, "audio-capture"),
            SpeechErrorKind::Network => write!(f, "network"),
            SpeechErrorKind::NotAllowed => write!(f, "not-allowed"),
            SpeechErrorKind::Other(kind) => write!(f, "{}", kind),
        }
    }
}

/// Events pushed by a streaming provider during an active session.
#[derive(Debug, Clone)]
pub enum SpeechEvent {
    /// The cumulative transcript for the current utterance. Each event
    /// carries everything recognized so far, so earlier words may be revised
    /// as confidence improves; consumers overwrite, never append.
    Transcript {
        cumulative_text: String,
        is_final: bool,
    },
    /// The provider failed mid-session and will emit nothing further.
    Error { kind: SpeechErrorKind },
    /// The provider ended the session on its own, e.g. a silence timeout.
    Ended,
}

/// A continuous, interim-results-enabled speech-to-text engine.
///
/// `configure` binds the recognition locale and must be called before
/// `start`; the locale stays fixed for the whole session. Events flow back
/// asynchronously through whatever channel the host wires up.
pub trait SpeechProvider: Send + Sync {
    /// Whether the capability exists in this host environment at all.
    fn is_available(&self) -> bool;

    /// Bind the recognition locale for the next session.
    fn configure(&self, locale: &str) -> Result<()>;

    /// Begin streaming recognition.
    fn start(&self) -> Result<()>;

    /// Request shutdown. The provider may still emit an `Ended` event later;
    /// callers treat the session as over immediately.
    fn stop(&self) -> Result<()>;
}

/// Mock provider that records calls, for tests and capability-less hosts.
pub struct MockSpeechProvider {
    available: bool,
    started: AtomicBool,
    stop_calls: AtomicUsize,
    configured_locales: Mutex<Vec<String>>,
}

impl MockSpeechProvider {
    /// Create a mock provider; `available` controls capability detection.
    pub fn new(available: bool) -> Self {
        Self {
            available,
            started: AtomicBool::new(false),
            stop_calls: AtomicUsize::new(0),
            configured_locales: Mutex::new(Vec::new()),
        }
    }

    /// Whether `start` has been called more recently than `stop`.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// How many times `stop` was called.
    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    /// The most recently configured locale, if any.
    pub fn last_locale(&self) -> Option<String> {
        self.configured_locales
            .lock()
            .expect("locale list mutex poisoned")
            .last()
            .cloned()
    }

    /// Every locale ever passed to `configure`, in order.
    pub fn configured_locales(&self) -> Vec<String> {
        self.configured_locales
            .lock()
            .expect("locale list mutex poisoned")
            .clone()
    }
}

impl SpeechProvider for MockSpeechProvider {
    fn is_available(&self) -> bool {
        self.available
    }

    fn configure(&self, locale: &str) -> Result<()> {
        if !self.available {
            return Err(ConfabError::Speech("provider unavailable".to_string()));
        }
        self.configured_locales
            .lock()
            .expect("locale list mutex poisoned")
            .push(locale.to_string());
        Ok(())
    }

    fn start(&self) -> Result<()> {
        if !self.available {
            return Err(ConfabError::Speech("provider unavailable".to_string()));
        }
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        self.started.store(false, Ordering::SeqCst);
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(SpeechErrorKind::NoSpeech.to_string(), "no-speech");
        assert_eq!(SpeechErrorKind::AudioCapture.to_string(), "audio-capture");
        assert_eq!(SpeechErrorKind::Network.to_string(), "network");
        assert_eq!(SpeechErrorKind::NotAllowed.to_string(), "not-allowed");
        assert_eq!(
            SpeechErrorKind::Other("aborted".to_string()).to_string(),
            "aborted"
        );
    }

    #[test]
    fn test_mock_records_configure_and_start() {
        let provider = MockSpeechProvider::new(true);
        assert!(provider.is_available());
        assert!(!provider.is_started());

        provider.configure("en-US").unwrap();
        provider.start().unwrap();
        assert!(provider.is_started());
        assert_eq!(provider.last_locale(), Some("en-US".to_string()));
    }

    #[test]
    fn test_mock_stop_clears_started() {
        let provider = MockSpeechProvider::new(true);
        provider.configure("en-US").unwrap();
        provider.start().unwrap();
        provider.stop().unwrap();
        assert!(!provider.is_started());
        assert_eq!(provider.stop_calls(), 1);
    }

    #[test]
    fn test_mock_unavailable_rejects_start() {
        let provider = MockSpeechProvider::new(false);
        assert!(!provider.is_available());
        assert!(provider.configure("en-US").is_err());
        assert!(provider.start().is_err());
    }

    #[test]
    fn test_mock_tracks_locale_history() {
        let provider = MockSpeechProvider::new(true);
        provider.configure("en-US").unwrap();
        provider.configure("fr-FR").unwrap();
        assert_eq!(
            provider.configured_locales(),
            vec!["en-US".to_string(), "fr-FR".to_string()]
        );
        assert_eq!(provider.last_locale(), Some("fr-FR".to_string()));
    }
}
