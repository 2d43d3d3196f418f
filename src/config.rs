//! Server configuration with TOML support.
//!
//! Hosts typically embed [`ServerConfig`] in their own config file; the
//! standalone `load`/`parse` helpers exist for tools (like the demo binary)
//! that want a dedicated file. Every field has a serde default, so an empty
//! document yields the stock configuration.
//!
//! # Configuration File Format
//!
//! ```toml
//! idle_tick_ms = 5
//! update_tick_ms = 10
//! renderer_wait_ms = 5000
//! show_work_hints = true
//! force_message_only = false
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

fn default_idle_tick_ms() -> u64 {
    5
}

fn default_update_tick_ms() -> u64 {
    10
}

fn default_renderer_wait_ms() -> u64 {
    5_000
}

fn default_show_work_hints() -> bool {
    true
}

/// Tunable behavior of the progress server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// How often the idle loop re-checks for a new session label.
    #[serde(default = "default_idle_tick_ms")]
    pub idle_tick_ms: u64,
    /// Poll cadence while a session is active. Counter changes become
    /// visible with at most this much delay.
    #[serde(default = "default_update_tick_ms")]
    pub update_tick_ms: u64,
    /// Upper bound on waiting for the renderer to finish initializing before
    /// a session's target is selected.
    #[serde(default = "default_renderer_wait_ms")]
    pub renderer_wait_ms: u64,
    /// Whether message-only sessions surface a transient background-work hint
    /// when counters move.
    #[serde(default = "default_show_work_hints")]
    pub show_work_hints: bool,
    /// Skip dialog surfaces entirely and run every session in message-only
    /// mode.
    #[serde(default)]
    pub force_message_only: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            idle_tick_ms: default_idle_tick_ms(),
            update_tick_ms: default_update_tick_ms(),
            renderer_wait_ms: default_renderer_wait_ms(),
            show_work_hints: default_show_work_hints(),
            force_message_only: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse progress server config")
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn idle_tick(&self) -> Duration {
        Duration::from_millis(self.idle_tick_ms)
    }

    pub fn update_tick(&self) -> Duration {
        Duration::from_millis(self.update_tick_ms)
    }

    pub fn renderer_wait(&self) -> Duration {
        Duration::from_millis(self.renderer_wait_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = ServerConfig::parse("").unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.idle_tick(), Duration::from_millis(5));
        assert_eq!(config.update_tick(), Duration::from_millis(10));
        assert_eq!(config.renderer_wait(), Duration::from_secs(5));
        assert!(config.show_work_hints);
        assert!(!config.force_message_only);
    }

    #[test]
    fn partial_document_overrides_only_named_fields() {
        let config =
            ServerConfig::parse("update_tick_ms = 250\nforce_message_only = true\n").unwrap();
        assert_eq!(config.update_tick_ms, 250);
        assert!(config.force_message_only);
        assert_eq!(config.idle_tick_ms, 5);
        assert!(config.show_work_hints);
    }

    #[test]
    fn invalid_toml_reports_a_parse_error() {
        let err = ServerConfig::parse("update_tick_ms = \"soon\"").unwrap_err();
        assert!(err.to_string().contains("parse"));
    }

    #[test]
    fn load_reads_a_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taskgauge.toml");
        std::fs::write(&path, "idle_tick_ms = 75\nshow_work_hints = false\n").unwrap();

        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.idle_tick_ms, 75);
        assert!(!config.show_work_hints);
    }

    #[test]
    fn load_missing_file_is_an_error_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = ServerConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn load_or_default_falls_back_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = ServerConfig::load_or_default(&path).unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn round_trips_through_toml() {
        let config = ServerConfig {
            update_tick_ms: 42,
            ..ServerConfig::default()
        };
        let text = toml::to_string(&config).unwrap();
        let parsed = ServerConfig::parse(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
