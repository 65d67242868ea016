/// Playback configuration
use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlaybackConfig {
    /// Playback errors tolerated before giving up on a track
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Seconds into a track after which "previous" restarts it
    #[serde(default = "default_restart_threshold_secs")]
    pub restart_threshold_secs: f64,

    #[serde(default = "default_readiness_timeout_ms")]
    pub readiness_timeout_ms: u64,

    /// Volume used when no settings are persisted
    #[serde(default = "default_initial_volume")]
    pub initial_volume: u8,

    /// Prefix of every persisted key
    #[serde(default = "default_storage_prefix")]
    pub storage_prefix: String,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            restart_threshold_secs: default_restart_threshold_secs(),
            readiness_timeout_ms: default_readiness_timeout_ms(),
            initial_volume: default_initial_volume(),
            storage_prefix: default_storage_prefix(),
        }
    }
}

impl PlaybackConfig {
    /// Load configuration from an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        // Load from config file if it exists
        if let Some(path) = path.filter(|p| p.exists()) {
            settings = settings.add_source(config::File::from(path));
        }

        // Override with environment variables (ENCORE_MAX_RETRIES, ...)
        settings = settings.add_source(
            config::Environment::with_prefix("ENCORE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| PlaybackError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| PlaybackError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(PlaybackError::Config(
                "max_retries must be at least 1".to_string(),
            ));
        }

        if self.initial_volume > 100 {
            return Err(PlaybackError::Config(format!(
                "initial_volume must be 0-100, got {}",
                self.initial_volume
            )));
        }

        if self.restart_threshold_secs < 0.0 {
            return Err(PlaybackError::Config(
                "restart_threshold_secs must not be negative".to_string(),
            ));
        }

        Ok(())
    }

    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_millis(self.readiness_timeout_ms)
    }
}

// Default values
fn default_max_retries() -> u32 {
    3
}

fn default_restart_threshold_secs() -> f64 {
    5.0
}

fn default_readiness_timeout_ms() -> u64 {
    10_000
}

fn default_initial_volume() -> u8 {
    100
}

fn default_storage_prefix() -> String {
    "player-".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = PlaybackConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.storage_prefix, "player-");
        assert_eq!(config.readiness_timeout(), Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let config = PlaybackConfig {
            max_retries: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PlaybackError::Config(_))));

        let config = PlaybackConfig {
            initial_volume: 101,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PlaybackError::Config(_))));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("encore.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "max_retries = 5").unwrap();
        writeln!(file, "storage_prefix = \"karaoke-\"").unwrap();
        drop(file);

        let config = PlaybackConfig::load(Some(&path)).unwrap();

        assert_eq!(config.max_retries, 5);
        assert_eq!(config.storage_prefix, "karaoke-");
        assert_eq!(config.restart_threshold_secs, 5.0);
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PlaybackConfig::load(Some(&dir.path().join("missing.toml"))).unwrap();
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn environment_overrides() {
        std::env::set_var("ENCORE_INITIAL_VOLUME", "40");
        let config = PlaybackConfig::load(None);
        std::env::remove_var("ENCORE_INITIAL_VOLUME");

        assert_eq!(config.unwrap().initial_volume, 40);
    }
}
