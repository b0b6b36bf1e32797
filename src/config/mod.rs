//! Configuration module for livetune-rs
//!
//! This module handles configuration of the frame queue, the presentation
//! channel and the demo pipeline loop. Configuration is stored as TOML.
//!
//! # Config Location
//!
//! The default config file lives in the platform-appropriate config
//! directory under `dev.hxyulin.livetune-rs`:
//!
//! - **Linux**: `~/.config/dev.hxyulin.livetune-rs/config.toml`
//! - **macOS**: `~/Library/Application Support/dev.hxyulin.livetune-rs/config.toml`
//! - **Windows**: `%APPDATA%\dev.hxyulin.livetune-rs\config.toml`
//!
//! # Example
//!
//! ```toml
//! [frame_queue]
//! capacity = 4
//! acquire_policy = { timeout = { timeout_ms = 50 } }
//! width = 320
//! height = 240
//!
//! [pipeline]
//! iterations = 600
//! ```

use crate::error::{Result, ResultExt, TuneError};
use crate::frame::AcquirePolicy;
use crate::presentation::DEFAULT_QUEUE_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for config directories
pub const APP_ID: &str = "dev.hxyulin.livetune-rs";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// Default number of frames the queue holds
pub const DEFAULT_FRAME_QUEUE_CAPACITY: usize = 10;

/// Default pipeline iteration interval in milliseconds (~30 fps)
pub const DEFAULT_ITERATION_INTERVAL_MS: u64 = 33;

/// Get the path of the default config file
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID).join(CONFIG_FILE))
}

// ==================== Frame Queue Config ====================

/// Frame queue and pool settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameQueueConfig {
    /// Frames held by the queue; the pool holds two more
    pub capacity: usize,

    /// What the producer does when every buffer is checked out
    pub acquire_policy: AcquirePolicy,

    /// Frame width in pixels
    pub width: usize,

    /// Frame height in pixels
    pub height: usize,

    /// Bytes per pixel
    pub channels: usize,
}

impl Default for FrameQueueConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_FRAME_QUEUE_CAPACITY,
            acquire_policy: AcquirePolicy::Block,
            width: 640,
            height: 480,
            channels: 3,
        }
    }
}

// ==================== Presentation Config ====================

/// Presentation channel settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    /// Pending widget refreshes before new ones are dropped
    pub queue_capacity: usize,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

// ==================== Pipeline Config ====================

/// Pipeline loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Stop after this many iterations (0 runs until stopped)
    pub iterations: u64,

    /// Minimum time between iteration starts
    pub iteration_interval_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            iterations: 300,
            iteration_interval_ms: DEFAULT_ITERATION_INTERVAL_MS,
        }
    }
}

// ==================== Top-level Config ====================

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TuneConfig {
    pub frame_queue: FrameQueueConfig,
    pub presentation: PresentationConfig,
    pub pipeline: PipelineConfig,
}

impl TuneConfig {
    /// Parse a config from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| TuneError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TuneError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Load a config file, returning defaults if it is missing or invalid
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save to a config file, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|e| {
                    TuneError::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| TuneError::Serialization(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TuneError::Config(format!("Failed to write config: {}", e)))
    }

    /// Check values that would make the queue unusable
    pub fn validate(&self) -> Result<()> {
        let fq = &self.frame_queue;
        if fq.capacity == 0 {
            return Err(TuneError::Config(
                "frame_queue.capacity must be at least 1".to_string(),
            ));
        }
        if fq.width == 0 || fq.height == 0 || fq.channels == 0 {
            return Err(TuneError::Config(format!(
                "frame dimensions must be non-zero (got {}x{}x{})",
                fq.width, fq.height, fq.channels
            )));
        }
        if self.presentation.queue_capacity == 0 {
            return Err(TuneError::Config(
                "presentation.queue_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TuneConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.frame_queue.capacity, DEFAULT_FRAME_QUEUE_CAPACITY);
        assert_eq!(config.frame_queue.acquire_policy, AcquirePolicy::Block);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = TuneConfig::from_toml(
            r#"
            [frame_queue]
            capacity = 4
            acquire_policy = "fail"
            "#,
        )
        .unwrap();
        assert_eq!(config.frame_queue.capacity, 4);
        assert_eq!(config.frame_queue.acquire_policy, AcquirePolicy::Fail);
        assert_eq!(config.frame_queue.width, 640);
        assert_eq!(config.pipeline, PipelineConfig::default());
    }

    #[test]
    fn test_timeout_policy_toml() {
        let config = TuneConfig::from_toml(
            r#"
            [frame_queue]
            acquire_policy = { timeout = { timeout_ms = 50 } }
            "#,
        )
        .unwrap();
        assert_eq!(
            config.frame_queue.acquire_policy,
            AcquirePolicy::Timeout { timeout_ms: 50 }
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = TuneConfig::from_toml("[frame_queue]\ncapacity = 0\n").unwrap_err();
        assert!(matches!(err, TuneError::Config(_)));

        let err = TuneConfig::from_toml("[frame_queue]\nwidth = 0\n").unwrap_err();
        assert!(err.to_string().contains("non-zero"));

        assert!(TuneConfig::from_toml("not toml at all [").is_err());
    }

    #[test]
    fn test_load_error_names_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[frame_queue]\ncapacity = 0\n").unwrap();

        let err = TuneConfig::load(&path).unwrap_err();
        assert!(matches!(err, TuneError::WithContext { .. }));
        assert!(matches!(err.root(), TuneError::Config(_)));
        assert!(err.to_string().contains(CONFIG_FILE));
    }

    #[test]
    fn test_default_path_ends_with_file() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with(Path::new(APP_ID).join(CONFIG_FILE)));
        }
    }
}
