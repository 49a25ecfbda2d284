//! Not-yet-submitted input: text buffer, at most one attachment, and the
//! active language selection.
//!
//! Also the transcript sink for the speech session: cumulative transcripts
//! overwrite the text buffer in place.

use std::sync::{Arc, Mutex};

use confab_core::types::{Attachment, FileUpload, Language};
use confab_speech::TranscriptSink;

use crate::blobs::BlobStore;

struct StagingInner {
    text: String,
    attachment: Option<Attachment>,
    language: Language,
}

/// Owns the staged input. At most one attachment may be staged; staging a
/// new file silently replaces any previous one.
pub struct InputStagingArea {
    inner: Mutex<StagingInner>,
    blobs: Arc<dyn BlobStore>,
}

impl InputStagingArea {
    pub fn new(blobs: Arc<dyn BlobStore>, language: Language) -> Self {
        Self {
            inner: Mutex::new(StagingInner {
                text: String::new(),
                attachment: None,
                language,
            }),
            blobs,
        }
    }

    /// Replace the staged text buffer. No validation.
    pub fn set_text(&self, text: impl Into<String>) {
        self.inner.lock().expect("staging mutex poisoned").text = text.into();
    }

    /// The current staged text.
    pub fn text(&self) -> String {
        self.inner
            .lock()
            .expect("staging mutex poisoned")
            .text
            .clone()
    }

    /// Stage a file as the pending attachment.
    ///
    /// The file's bytes go to the blob store; any previously staged
    /// attachment is replaced and its blob reference released, since nothing
    /// can reach it afterwards.
    pub fn stage_attachment(&self, file: &FileUpload) -> Attachment {
        let content_ref = self.blobs.stage(file);
        let attachment = Attachment {
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            content_ref,
        };

        let replaced = {
            let mut inner = self.inner.lock().expect("staging mutex poisoned");
            inner.attachment.replace(attachment.clone())
        };
        if let Some(old) = replaced {
            tracing::debug!(replaced = %old.name, "Staged attachment replaced");
            self.blobs.release(old.content_ref);
        }
        attachment
    }

    /// The currently staged attachment, if any.
    pub fn attachment(&self) -> Option<Attachment> {
        self.inner
            .lock()
            .expect("staging mutex poisoned")
            .attachment
            .clone()
    }

    /// Remove the staged attachment and release its blob reference.
    pub fn clear_attachment(&self) {
        let removed = {
            let mut inner = self.inner.lock().expect("staging mutex poisoned");
            inner.attachment.take()
        };
        if let Some(attachment) = removed {
            self.blobs.release(attachment.content_ref);
        }
    }

    /// Clear text and attachment together after a successful submit.
    ///
    /// The blob reference is NOT released here: the attachment has moved
    /// into the appended message and its content must stay resolvable for
    /// the rest of the session.
    pub fn reset_all(&self) {
        let mut inner = self.inner.lock().expect("staging mutex poisoned");
        inner.text.clear();
        inner.attachment = None;
    }

    /// Update the selected language.
    ///
    /// Has no effect on an already-active speech session; the locale is
    /// bound at session start.
    pub fn set_language(&self, language: Language) {
        self.inner.lock().expect("staging mutex poisoned").language = language;
    }

    /// The currently selected language.
    pub fn language(&self) -> Language {
        self.inner
            .lock()
            .expect("staging mutex poisoned")
            .language
            .clone()
    }

    /// Whether there is anything to submit.
    pub fn has_input(&self) -> bool {
        let inner = self.inner.lock().expect("staging mutex poisoned");
        !inner.text.trim().is_empty() || inner.attachment.is_some()
    }
}

impl TranscriptSink for InputStagingArea {
    fn set_transcript(&self, text: &str) {
        self.set_text(text);
    }
}

// =============================================================================
// Tests
// =============================================================================
