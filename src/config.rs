//! Configuration for digit-sketch.

use crate::core::surface::{REFERENCE_CANVAS_SIZE, REFERENCE_STROKE_WIDTH};
use crate::core::ResampleFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Largest accepted canvas edge, in pixels.
pub const MAX_CANVAS_SIZE: u32 = 4096;

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Edge length of the square drawing canvas
    pub canvas_size: u32,

    /// Pen width in canvas pixels
    pub stroke_width: f32,

    /// Interpolation used to shrink the canvas to the feature grid
    #[serde(default)]
    pub resample: ResampleFilter,

    /// Remote classifier settings
    pub classifier: ClassifierSettings,

    /// Path for the stats file
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("digit-sketch");

        Self {
            canvas_size: REFERENCE_CANVAS_SIZE,
            stroke_width: REFERENCE_STROKE_WIDTH,
            resample: ResampleFilter::default(),
            classifier: ClassifierSettings::default(),
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_json(&content)
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_path();
        self.save_to(&path)?;
        Ok(path)
    }

    /// Write configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("digit-sketch")
            .join("config.json")
    }

    /// Path of the persisted stats file.
    pub fn stats_path(&self) -> PathBuf {
        self.data_path.join("stats.json")
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.canvas_size == 0 || self.canvas_size > MAX_CANVAS_SIZE {
            return Err(ConfigError::Invalid(format!(
                "canvas_size must be between 1 and {MAX_CANVAS_SIZE}, got {}",
                self.canvas_size
            )));
        }
        if !self.stroke_width.is_finite() || self.stroke_width <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "stroke_width must be positive, got {}",
                self.stroke_width
            )));
        }
        if self.classifier.url.trim().is_empty() {
            return Err(ConfigError::Invalid("classifier.url is empty".to_string()));
        }
        Ok(())
    }
}

/// Remote classifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierSettings {
    /// Predict endpoint
    pub url: String,

    /// Per-request timeout
    #[serde(with = "duration_serde", rename = "timeout_secs")]
    pub timeout: Duration,

    /// Extra attempts after a failed request
    pub retries: u32,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000/predict".to_string(),
            timeout: Duration::from_secs(10),
            retries: 2,
        }
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.canvas_size, 280);
        assert_eq!(config.stroke_width, 20.0);
        assert_eq!(config.resample, ResampleFilter::Area);
        assert_eq!(config.classifier.timeout, Duration::from_secs(10));
        assert_eq!(config.classifier.retries, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_round_trip_shape() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("\"timeout_secs\":10"));
        assert!(json.contains("\"resample\":\"area\""));

        let parsed = Config::from_json(&json).unwrap();
        assert_eq!(parsed.canvas_size, 280);
    }

    #[test]
    fn test_resample_defaults_when_missing() {
        let config = Config::from_json(
            r#"{
                "canvas_size": 560,
                "stroke_width": 40.0,
                "classifier": {"url": "http://127.0.0.1:9000/predict", "timeout_secs": 3, "retries": 0},
                "data_path": "/tmp/digit-sketch"
            }"#,
        )
        .unwrap();
        assert_eq!(config.resample, ResampleFilter::Area);
        assert_eq!(config.classifier.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_save_then_load() {
        let dir = std::env::temp_dir().join(format!("digit-sketch-config-{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("config.json");

        let mut config = Config::default();
        config.canvas_size = 560;
        config.resample = ResampleFilter::Lanczos3;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.canvas_size, 560);
        assert_eq!(loaded.resample, ResampleFilter::Lanczos3);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let path = std::env::temp_dir()
            .join(format!("digit-sketch-config-{}", uuid::Uuid::new_v4()))
            .join("config.json");
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.canvas_size, REFERENCE_CANVAS_SIZE);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = std::env::temp_dir().join(format!("digit-sketch-config-{}", uuid::Uuid::new_v4()));
        let path = dir.join("config.json");
        let mut config = Config::default();
        config.stroke_width = 0.0;
        config.save_to(&path).unwrap();

        assert!(matches!(Config::load_from(&path), Err(ConfigError::Invalid(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.canvas_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.stroke_width = -1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.classifier.url = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
