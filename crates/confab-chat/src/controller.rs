//! Central controller wiring store, staging, speech, dispatcher, and
//! overlays.
//!
//! Every user gesture and collaborator callback enters here as a
//! run-to-completion call; the presentation layer observes state snapshots
//! and the broadcast event stream and never receives an error from any of
//! these methods.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;

use confab_core::config::ConfabConfig;
use confab_core::events::ControllerEvent;
use confab_core::types::{Attachment, FileUpload, Language, Message};
use confab_speech::{SpeechEvent, SpeechProvider, SpeechSession, TranscriptSink};

use crate::blobs::BlobStore;
use crate::dispatcher::{ReplyOutcome, ResponseDispatcher};
use crate::error::ChatError;
use crate::overlay::{OverlayKind, OverlayRouter, PointerTarget};
use crate::responder::Responder;
use crate::staging::InputStagingArea;
use crate::store::MessageStore;

/// Capacity of the controller event channel. Observers that fall this far
/// behind lose the oldest events, never the current state.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// The conversation interaction controller.
///
/// Created once at session start with a seeded greeting; lives for the
/// duration of the interactive session. `shutdown` releases any outstanding
/// attachment blob references.
pub struct ChatController {
    store: Arc<MessageStore>,
    staging: Arc<InputStagingArea>,
    blobs: Arc<dyn BlobStore>,
    speech: SpeechSession,
    speech_enabled: bool,
    dispatcher: ResponseDispatcher,
    overlays: OverlayRouter,
    events: broadcast::Sender<ControllerEvent>,
    languages: Vec<Language>,
}

impl ChatController {
    /// Build a controller from configuration and its three collaborators.
    pub fn new(
        config: &ConfabConfig,
        responder: Arc<dyn Responder>,
        provider: Arc<dyn SpeechProvider>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        let languages = if config.languages.is_empty() {
            confab_core::types::default_language_catalog()
        } else {
            config.languages.clone()
        };
        let initial_language = languages
            .iter()
            .find(|l| l.locale_tag == config.speech.default_locale)
            .unwrap_or(&languages[0])
            .clone();

        let store = Arc::new(MessageStore::with_greeting(config.chat.greeting.clone()));
        let staging = Arc::new(InputStagingArea::new(blobs.clone(), initial_language));
        let speech = SpeechSession::new(provider, staging.clone() as Arc<dyn TranscriptSink>);
        let dispatcher = ResponseDispatcher::new(
            store.clone(),
            staging.clone(),
            responder,
            std::time::Duration::from_secs(config.chat.responder_timeout_secs),
        );
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            store,
            staging,
            blobs,
            speech,
            speech_enabled: config.speech.enabled,
            dispatcher,
            overlays: OverlayRouter::new(),
            events,
            languages,
        }
    }

    fn emit(&self, event: ControllerEvent) {
        // Send only fails when no observer is subscribed, which is fine.
        let _ = self.events.send(event);
    }

    /// Subscribe to controller events.
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    // =========================================================================
    // State snapshots
    // =========================================================================

    /// The conversation in append order.
    pub fn messages(&self) -> Vec<Message> {
        self.store.list()
    }

    pub fn is_busy(&self) -> bool {
        self.dispatcher.is_busy()
    }

    pub fn is_listening(&self) -> bool {
        self.speech.is_listening()
    }

    pub fn is_dragging(&self) -> bool {
        self.overlays.is_dragging()
    }

    pub fn staged_text(&self) -> String {
        self.staging.text()
    }

    pub fn staged_attachment(&self) -> Option<Attachment> {
        self.staging.attachment()
    }

    pub fn selected_language(&self) -> Language {
        self.staging.language()
    }

    /// The selectable language catalog.
    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    /// Whether the listening affordance should be shown at all.
    pub fn speech_available(&self) -> bool {
        self.speech_enabled && self.speech.is_available()
    }

    /// The locale bound to the active speech session, if one is active.
    pub fn active_speech_locale(&self) -> Option<String> {
        self.speech.active_locale()
    }

    pub fn overlay_open(&self, overlay: OverlayKind) -> bool {
        self.overlays.is_open(overlay)
    }

    /// Registered outside-pointer listeners, one per open overlay.
    pub fn overlay_listener_count(&self) -> usize {
        self.overlays.listener_count()
    }

    // =========================================================================
    // Input gestures
    // =========================================================================

    /// Replace the staged text.
    pub fn set_text(&self, text: impl Into<String>) {
        self.staging.set_text(text);
    }

    /// Stage a picked file as the pending attachment, replacing any prior one.
    pub fn attach_file(&self, file: &FileUpload) {
        let attachment = self.staging.stage_attachment(file);
        self.emit(ControllerEvent::AttachmentStaged {
            name: attachment.name,
            timestamp: Utc::now(),
        });
    }

    /// Remove the staged attachment.
    pub fn clear_attachment(&self) {
        if self.staging.attachment().is_none() {
            return;
        }
        self.staging.clear_attachment();
        self.emit(ControllerEvent::AttachmentCleared {
            timestamp: Utc::now(),
        });
    }

    /// Select a language from the catalog by locale tag.
    ///
    /// Unknown tags are ignored. Has no effect on an active speech session;
    /// only the next session binds the new locale.
    pub fn select_language(&self, locale_tag: &str) -> bool {
        match self.languages.iter().find(|l| l.locale_tag == locale_tag) {
            Some(language) => {
                self.staging.set_language(language.clone());
                self.emit(ControllerEvent::LanguageChanged {
                    locale: locale_tag.to_string(),
                    timestamp: Utc::now(),
                });
                true
            }
            None => {
                tracing::warn!(locale = locale_tag, "Unknown language selection ignored");
                false
            }
        }
    }

    // =========================================================================
    // Speech gestures and provider callbacks
    // =========================================================================

    /// Start a speech session bound to the currently selected language.
    ///
    /// No-op when the capability is unavailable or a session is active.
    pub fn start_listening(&self) {
        if !self.speech_available() {
            tracing::debug!("Speech unavailable, listening gesture ignored");
            return;
        }
        let was_listening = self.speech.is_listening();
        let locale = self.staging.language().locale_tag;
        if let Err(e) = self.speech.start(&locale) {
            tracing::warn!(error = %e, "Failed to start speech session");
            return;
        }
        if !was_listening && self.speech.is_listening() {
            self.emit(ControllerEvent::SpeechStarted {
                locale,
                timestamp: Utc::now(),
            });
        }
    }

    /// Stop the active speech session. No-op when idle.
    pub fn stop_listening(&self) {
        let was_listening = self.speech.is_listening();
        if let Err(e) = self.speech.stop() {
            tracing::warn!(error = %e, "Failed to stop speech session");
            return;
        }
        if was_listening {
            self.emit(ControllerEvent::SpeechStopped {
                reason: "requested".to_string(),
                timestamp: Utc::now(),
            });
        }
    }

    /// Feed a provider event into the session.
    ///
    /// The host pumps these from whatever channel its provider uses; each
    /// call is one run-to-completion state transition.
    pub fn on_speech_event(&self, event: &SpeechEvent) {
        match event {
            SpeechEvent::Transcript {
                cumulative_text,
                is_final,
            } => {
                if self.speech.on_transcript(cumulative_text, *is_final) {
                    self.emit(ControllerEvent::SpeechTranscript {
                        chars: cumulative_text.chars().count(),
                        is_final: *is_final,
                        timestamp: Utc::now(),
                    });
                }
            }
            SpeechEvent::Error { kind } => {
                if self.speech.is_listening() {
                    self.speech.on_error(kind);
                    self.emit(ControllerEvent::SpeechStopped {
                        reason: format!("provider error: {}", kind),
                        timestamp: Utc::now(),
                    });
                }
            }
            SpeechEvent::Ended => {
                if self.speech.is_listening() {
                    self.speech.on_ended();
                    self.emit(ControllerEvent::SpeechStopped {
                        reason: "provider ended".to_string(),
                        timestamp: Utc::now(),
                    });
                }
            }
        }
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Submit the staged input and await the full round trip.
    ///
    /// Rejections (empty input, submission in flight) and responder failures
    /// are absorbed here: they surface as events and log lines, never as
    /// errors to the presentation layer.
    pub async fn submit(&self) {
        match self.dispatcher.submit().await {
            Ok(receipt) => {
                self.emit(ControllerEvent::SubmissionAccepted {
                    id: receipt.user.id,
                    has_attachment: receipt.user.attachment.is_some(),
                    timestamp: Utc::now(),
                });
                match receipt.outcome {
                    ReplyOutcome::Answered => self.emit(ControllerEvent::ReplyReceived {
                        id: receipt.reply.id,
                        timestamp: Utc::now(),
                    }),
                    ReplyOutcome::Failed(reason) => {
                        self.emit(ControllerEvent::ResponderFailed {
                            reason,
                            timestamp: Utc::now(),
                        })
                    }
                }
            }
            Err(e @ (ChatError::EmptySubmission | ChatError::SubmissionInFlight)) => {
                tracing::debug!(reason = %e, "Submission rejected");
                self.emit(ControllerEvent::SubmissionRejected {
                    reason: e.to_string(),
                    timestamp: Utc::now(),
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "Submission failed");
            }
        }
    }

    // =========================================================================
    // Overlay and drag gestures
    // =========================================================================

    /// Toggle a menu overlay.
    pub fn toggle_overlay(&self, overlay: OverlayKind) {
        let open = self.overlays.toggle(overlay);
        let event = if open {
            ControllerEvent::OverlayOpened {
                overlay: overlay.name().to_string(),
                timestamp: Utc::now(),
            }
        } else {
            ControllerEvent::OverlayClosed {
                overlay: overlay.name().to_string(),
                timestamp: Utc::now(),
            }
        };
        self.emit(event);
    }

    /// Route a pointer-down; overlays it landed outside of are dismissed.
    pub fn pointer_down(&self, target: PointerTarget) {
        for overlay in self.overlays.pointer_down(target) {
            self.emit(ControllerEvent::OverlayClosed {
                overlay: overlay.name().to_string(),
                timestamp: Utc::now(),
            });
        }
    }

    /// A drag entered the drop zone.
    pub fn drag_over(&self) {
        if self.overlays.drag_over() {
            self.emit(ControllerEvent::DragStateChanged {
                dragging: true,
                timestamp: Utc::now(),
            });
        }
    }

    /// The drag left the drop zone without dropping.
    pub fn drag_leave(&self) {
        if self.overlays.drag_leave() {
            self.emit(ControllerEvent::DragStateChanged {
                dragging: false,
                timestamp: Utc::now(),
            });
        }
    }

    /// A drop completed. Stages the first file of the payload (extra files
    /// are ignored) and clears the drag indicator regardless of payload.
    pub fn drop_files(&self, files: &[FileUpload]) {
        if let Some(first) = files.first() {
            if files.len() > 1 {
                tracing::debug!(ignored = files.len() - 1, "Extra dropped files ignored");
            }
            self.attach_file(first);
        }
        if self.overlays.drop_ended() {
            self.emit(ControllerEvent::DragStateChanged {
                dragging: false,
                timestamp: Utc::now(),
            });
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// End the interactive session: stop any speech session, tear down
    /// overlay state, and release all attachment blob references.
    pub fn shutdown(&self) {
        self.stop_listening();
        self.overlays.unmount();
        self.blobs.release_all();
        tracing::info!("Controller shut down");
    }
}

// =============================================================================
// Tests
// =============================================================================
