//! Configuration Management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Canvas and rendering settings
    pub canvas: CanvasConfig,
    /// Snapshot loop scheduling
    pub schedule: ScheduleConfig,
    /// On-device model settings
    pub model: ModelConfig,
    /// Remote classification service settings
    #[serde(default)]
    pub remote: RemoteConfig,
}

/// Canvas configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasConfig {
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    /// Brush diameter in pixels
    pub stroke_width: f32,
    /// Gesture ring buffer capacity (power of 2)
    pub ring_buffer_size: usize,
}

/// Snapshot loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Time between snapshot ticks (ms)
    pub tick_period_ms: u64,
    /// Delay before the first tick (ms)
    pub initial_delay_ms: u64,
}

/// On-device model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the weight file
    pub path: PathBuf,
    /// Model input width (used when building the demo model)
    pub input_width: u32,
    /// Model input height (used when building the demo model)
    pub input_height: u32,
}

/// Remote classification service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Inference endpoint; unset means the on-device model is used
    pub endpoint: Option<String>,
    /// Per-request timeout (ms)
    pub timeout_ms: u64,
    /// Attempts before a tick's request is abandoned
    pub max_retries: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 280,
            height: 280,
            stroke_width: 15.0,
            ring_buffer_size: 1024,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 1000,
            initial_delay_ms: 1000,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("model.bin"),
            input_width: 28,
            input_height: 28,
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_ms: 10_000,
            max_retries: 3,
        }
    }
}

impl ScheduleConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    /// Returns Ok(()) if valid, or Err with a description of the first invalid field.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.canvas.ring_buffer_size == 0
            || !self.canvas.ring_buffer_size.is_power_of_two()
        {
            return Err(crate::Error::Config(format!(
                "ring_buffer_size must be a power of 2, got {}",
                self.canvas.ring_buffer_size
            )));
        }
        if self.canvas.stroke_width <= 0.0 || self.canvas.stroke_width > 200.0 {
            return Err(crate::Error::Config(format!(
                "stroke_width must be in (0, 200], got {}",
                self.canvas.stroke_width
            )));
        }
        if self.schedule.tick_period_ms == 0 {
            return Err(crate::Error::Config(
                "tick_period_ms must be > 0".to_string(),
            ));
        }
        if self.model.input_width == 0 || self.model.input_height == 0 {
            return Err(crate::Error::Config(format!(
                "model input dimensions {}x{} are invalid",
                self.model.input_width, self.model.input_height
            )));
        }
        if self.remote.timeout_ms == 0 {
            return Err(crate::Error::Config("timeout_ms must be > 0".to_string()));
        }
        Ok(())
    }

    /// Load config from file
    pub fn load(path: &PathBuf) -> Result<Self, crate::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from default location
    pub fn load_default() -> Result<Self, crate::Error> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &PathBuf) -> Result<(), crate::Error> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;

        // Create parent directories
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".digit_canvas").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Generate TOML representation
    pub fn to_toml(&self) -> Result<String, crate::Error> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.canvas.width, 280);
        assert_eq!(config.canvas.stroke_width, 15.0);
        assert_eq!(config.schedule.tick_period_ms, 1000);
        assert_eq!(config.model.input_width, 28);
        assert!(config.remote.endpoint.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[canvas]"));
        assert!(toml.contains("[schedule]"));
        assert!(toml.contains("[model]"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.schedule.tick_period_ms = 250;
        config.remote.endpoint = Some("http://localhost:9000/classify".into());
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.schedule.tick_period_ms, 250);
        assert_eq!(
            loaded.remote.endpoint.as_deref(),
            Some("http://localhost:9000/classify")
        );
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.schedule.tick_period_ms = 0;
        let content = toml::to_string_pretty(&config).unwrap();
        std::fs::write(&path, content).unwrap();

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_ring_buffer() {
        let mut config = Config::default();
        config.canvas.ring_buffer_size = 100;
        assert!(config.validate().is_err());

        config.canvas.ring_buffer_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_stroke_width() {
        let mut config = Config::default();
        config.canvas.stroke_width = 0.0;
        assert!(config.validate().is_err());
        config.canvas.stroke_width = 500.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_remote_section_uses_defaults() {
        let toml = r#"
            [canvas]
            width = 100
            height = 100
            stroke_width = 10.0
            ring_buffer_size = 256

            [schedule]
            tick_period_ms = 500
            initial_delay_ms = 500

            [model]
            path = "weights.bin"
            input_width = 28
            input_height = 28
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.remote.max_retries, 3);
        assert_eq!(config.schedule.period(), Duration::from_millis(500));
    }
}
