use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ConfabError, Result};
use crate::types::{default_language_catalog, Language};

/// Top-level configuration for the Confab application.
///
/// Loaded from `~/.confab/config.toml` by default. Each section corresponds
/// to a bounded context or cross-cutting concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfabConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    /// The selectable language catalog. The first entry is the fallback
    /// selection when `speech.default_locale` matches nothing.
    #[serde(default = "default_language_catalog")]
    pub languages: Vec<Language>,
}

impl Default for ConfabConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            chat: ChatConfig::default(),
            speech: SpeechConfig::default(),
            languages: default_language_catalog(),
        }
    }
}

impl ConfabConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ConfabConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfabError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Conversation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Greeting seeded into the conversation as message 1.
    pub greeting: String,
    /// Upper bound on how long a submission waits for the responder before
    /// the failure reply is appended and the busy gate is released.
    pub responder_timeout_secs: u64,
    /// Artificial latency of the built-in stub responder, in milliseconds.
    pub stub_responder_delay_ms: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            greeting: "Hi! How can I help you today?".to_string(),
            responder_timeout_secs: 30,
            stub_responder_delay_ms: 1000,
        }
    }
}

/// Speech capture settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Master switch for the listening affordance.
    pub enabled: bool,
    /// Locale tag selected at startup, e.g. `en-US`.
    pub default_locale: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_locale: "en-US".to_string(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConfabConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.chat.responder_timeout_secs, 30);
        assert_eq!(config.chat.stub_responder_delay_ms, 1000);
        assert!(config.speech.enabled);
        assert_eq!(config.speech.default_locale, "en-US");
        assert!(!config.languages.is_empty());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = ConfabConfig::default();
        config.chat.greeting = "Welcome back".to_string();
        config.speech.default_locale = "fr-FR".to_string();
        config.save(&path).unwrap();

        let loaded = ConfabConfig::load(&path).unwrap();
        assert_eq!(loaded.chat.greeting, "Welcome back");
        assert_eq!(loaded.speech.default_locale, "fr-FR");
        assert_eq!(loaded.languages.len(), config.languages.len());
    }

    #[test]
    fn test_load_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.toml");
        assert!(ConfabConfig::load(&path).is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.toml");
        let config = ConfabConfig::load_or_default(&path);
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_load_or_default_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is not [ valid toml").unwrap();
        let config = ConfabConfig::load_or_default(&path);
        assert_eq!(config.chat.responder_timeout_secs, 30);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[speech]\ndefault_locale = \"de-DE\"\n").unwrap();

        let config = ConfabConfig::load(&path).unwrap();
        assert_eq!(config.speech.default_locale, "de-DE");
        // Untouched sections come from defaults.
        assert!(config.speech.enabled);
        assert_eq!(config.general.log_level, "info");
        assert!(!config.languages.is_empty());
    }

    #[test]
    fn test_languages_section_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[[languages]]\ndisplay_name = \"English\"\nlocale_tag = \"en-GB\"\n",
        )
        .unwrap();

        let config = ConfabConfig::load(&path).unwrap();
        assert_eq!(config.languages.len(), 1);
        assert_eq!(config.languages[0].locale_tag, "en-GB");
    }
}
