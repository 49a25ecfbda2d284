//! CLI argument definitions for the Confab application.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Confab, an interactive conversational interface with speech input.
#[derive(Parser, Debug)]
#[command(name = "confab", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Disable the speech capture affordance.
    #[arg(long = "no-speech")]
    pub no_speech: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > CONFAB_CONFIG env var > ~/.confab/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("CONFAB_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

/// Platform default config location: `~/.confab/config.toml`.
fn default_config_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".confab").join("config.toml")
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::parse_from(["confab"]);
        assert!(args.config.is_none());
        assert!(args.log_level.is_none());
        assert!(!args.no_speech);
    }

    #[test]
    fn test_config_flag_wins() {
        let args = CliArgs::parse_from(["confab", "--config", "/tmp/confab.toml"]);
        assert_eq!(
            args.resolve_config_path(),
            PathBuf::from("/tmp/confab.toml")
        );
    }

    #[test]
    fn test_log_level_flag_wins_over_config() {
        let args = CliArgs::parse_from(["confab", "-l", "debug"]);
        assert_eq!(args.resolve_log_level("info"), "debug");
    }

    #[test]
    fn test_log_level_falls_back_to_config() {
        let args = CliArgs::parse_from(["confab"]);
        assert_eq!(args.resolve_log_level("warn"), "warn");
    }

    #[test]
    fn test_no_speech_flag() {
        let args = CliArgs::parse_from(["confab", "--no-speech"]);
        assert!(args.no_speech);
    }

    #[test]
    fn test_default_config_path_shape() {
        let path = default_config_path();
        assert!(path.ends_with(".confab/config.toml"));
    }
}
