use thiserror::Error;

/// Top-level error type for the Confab system.
///
/// Each variant wraps a subsystem-specific error. Subsystem crates define
/// their own error types and implement `From<SubsystemError> for ConfabError`
/// so that the `?` operator works seamlessly across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfabError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Speech error: {0}")]
    Speech(String),

    #[error("Attachment error: {0}")]
    Attachment(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for ConfabError {
    fn from(err: toml::de::Error) -> Self {
        ConfabError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfabError {
    fn from(err: toml::ser::Error) -> Self {
        ConfabError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ConfabError {
    fn from(err: serde_json::Error) -> Self {
        ConfabError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Confab operations.
pub type Result<T> = std::result::Result<T, ConfabError>;
