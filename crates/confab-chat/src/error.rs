//! Error types for the conversation controller.
//!
//! All of these are handled at the controller boundary: rejected submissions
//! and provider failures are logged and turned into events, never propagated
//! to the presentation layer.

use confab_core::error::ConfabError;

/// Errors from the conversation controller.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("nothing to submit: no text and no attachment")]
    EmptySubmission,
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error("speech capability is unavailable")]
    SpeechUnavailable,
    #[error("speech provider error: {0}")]
    SpeechProvider(String),
    #[error("responder failed: {0}")]
    ResponderFailure(String),
    #[error("responder timed out after {0}s")]
    ResponderTimeout(u64),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ConfabError> for ChatError {
    fn from(err: ConfabError) -> Self {
        match err {
            ConfabError::Speech(msg) => ChatError::SpeechProvider(msg),
            other => ChatError::Internal(other.to_string()),
        }
    }
}
