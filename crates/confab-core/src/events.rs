use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::MessageId;

/// State-transition events emitted by the conversation controller.
///
/// Events are emitted after state changes and consumed by observers such as
/// the presentation layer or an event log. Observers only ever see events and
/// state snapshots; controller errors are handled internally and surface here
/// as rejection or failure events.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ControllerEvent {
    // =========================================================================
    // Submission Events
    // =========================================================================
    /// A submit was accepted and the user message appended.
    SubmissionAccepted {
        id: MessageId,
        has_attachment: bool,
        timestamp: DateTime<Utc>,
    },

    /// A submit was rejected without any state change.
    SubmissionRejected {
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// The responder produced a reply and the bot message was appended.
    ReplyReceived {
        id: MessageId,
        timestamp: DateTime<Utc>,
    },

    /// The responder failed or timed out; a bot-sender error message was
    /// appended instead of a reply.
    ResponderFailed {
        reason: String,
        timestamp: DateTime<Utc>,
    },

    // =========================================================================
    // Speech Events
    // =========================================================================
    /// A speech session started, bound to the given locale.
    SpeechStarted {
        locale: String,
        timestamp: DateTime<Utc>,
    },

    /// A cumulative transcript overwrote the staged text.
    SpeechTranscript {
        chars: usize,
        is_final: bool,
        timestamp: DateTime<Utc>,
    },

    /// The speech session ended (user request, provider error, or
    /// provider-initiated end such as a silence timeout).
    SpeechStopped {
        reason: String,
        timestamp: DateTime<Utc>,
    },

    // =========================================================================
    // Staging Events
    // =========================================================================
    /// A file was staged as the pending attachment, replacing any prior one.
    AttachmentStaged {
        name: String,
        timestamp: DateTime<Utc>,
    },

    /// The staged attachment was removed before submission.
    AttachmentCleared { timestamp: DateTime<Utc> },

    /// The selected language changed.
    LanguageChanged {
        locale: String,
        timestamp: DateTime<Utc>,
    },

    // =========================================================================
    // Overlay Events
    // =========================================================================
    /// A menu overlay became visible.
    OverlayOpened {
        overlay: String,
        timestamp: DateTime<Utc>,
    },

    /// A menu overlay was dismissed.
    OverlayClosed {
        overlay: String,
        timestamp: DateTime<Utc>,
    },

    /// The transient drag-over indicator toggled.
    DragStateChanged {
        dragging: bool,
        timestamp: DateTime<Utc>,
    },
}

impl ControllerEvent {
    /// Returns the timestamp of the event.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ControllerEvent::SubmissionAccepted { timestamp, .. }
            | ControllerEvent::SubmissionRejected { timestamp, .. }
            | ControllerEvent::ReplyReceived { timestamp, .. }
            | ControllerEvent::ResponderFailed { timestamp, .. }
            | ControllerEvent::SpeechStarted { timestamp, .. }
            | ControllerEvent::SpeechTranscript { timestamp, .. }
            | ControllerEvent::SpeechStopped { timestamp, .. }
            | ControllerEvent::AttachmentStaged { timestamp, .. }
            | ControllerEvent::AttachmentCleared { timestamp }
            | ControllerEvent::LanguageChanged { timestamp, .. }
            | ControllerEvent::OverlayOpened { timestamp, .. }
            | ControllerEvent::OverlayClosed { timestamp, .. }
            | ControllerEvent::DragStateChanged { timestamp, .. } => *timestamp,
        }
    }

    /// Returns a human-readable event name for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            ControllerEvent::SubmissionAccepted { .. } => "submission_accepted",
            ControllerEvent::SubmissionRejected { .. } => "submission_rejected",
            ControllerEvent::ReplyReceived { .. } => "reply_received",
            ControllerEvent::ResponderFailed { .. } => "responder_failed",
            ControllerEvent::SpeechStarted { .. } => "speech_started",
            ControllerEvent::SpeechTranscript { .. } => "speech_transcript",
            ControllerEvent::SpeechStopped { .. } => "speech_stopped",
            ControllerEvent::AttachmentStaged { .. } => "attachment_staged",
            ControllerEvent::AttachmentCleared { .. } => "attachment_cleared",
            ControllerEvent::LanguageChanged { .. } => "language_changed",
            ControllerEvent::OverlayOpened { .. } => "overlay_opened",
            ControllerEvent::OverlayClosed { .. } => "overlay_closed",
            ControllerEvent::DragStateChanged { .. } => "drag_state_changed",
        }
    }
}
