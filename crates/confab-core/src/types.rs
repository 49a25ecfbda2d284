use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// Who authored a conversation message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// A message submitted by the person at the keyboard or microphone.
    User,
    /// A reply produced by the responder.
    Bot,
}

// =============================================================================
// Messages and attachments
// =============================================================================

/// Identifier for a conversation message.
///
/// Ids are assigned by the message store from an explicit monotonic counter;
/// they are strictly increasing in append order and never reused.
pub type MessageId = u64;

/// Opaque handle into the blob store for attachment content.
///
/// Valid at most for the lifetime of the conversation session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentRef(pub Uuid);

impl ContentRef {
    /// Mint a fresh, unique handle.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ContentRef {
    fn default() -> Self {
        Self::new()
    }
}

/// A named, typed reference to file content accompanying a message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Original file name, e.g. `report.pdf`.
    pub name: String,
    /// MIME type as reported by the file source, e.g. `application/pdf`.
    pub mime_type: String,
    /// Handle resolvable through the blob store for the session lifetime.
    pub content_ref: ContentRef,
}

/// A single conversation turn.
///
/// Exclusively owned by the message store once appended; immutable thereafter.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub sender: Sender,
    pub attachment: Option<Attachment>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Returns true if this message was authored by the user.
    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }

    /// Returns true if this message was authored by the responder.
    pub fn is_bot(&self) -> bool {
        self.sender == Sender::Bot
    }
}

/// A file yielded by the picker or a drag-and-drop payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileUpload {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

// =============================================================================
// Languages
// =============================================================================

/// An immutable language catalog entry.
///
/// Selected (not owned) by the controller; the locale tag is handed to the
/// speech provider when a session starts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// Human-readable name shown in the language menus.
    pub display_name: String,
    /// BCP 47 tag, e.g. `en-US`.
    pub locale_tag: String,
}

impl Language {
    pub fn new(display_name: impl Into<String>, locale_tag: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            locale_tag: locale_tag.into(),
        }
    }
}

/// The built-in language catalog. The first entry is the default selection.
pub fn default_language_catalog() -> Vec<Language> {
    vec![
        Language::new("English", "en-US"),
        Language::new("Espa\u{00f1}ol", "es-ES"),
        Language::new("Fran\u{00e7}ais", "fr-FR"),
        Language::new("Deutsch", "de-DE"),
        Language::new("Portugu\u{00ea}s", "pt-BR"),
    ]
}

// =============================================================================
// Tests
// =============================================================================
