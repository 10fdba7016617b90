use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_originals_path")]
    pub originals_path: PathBuf,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub thumbnails: ThumbnailConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub geocoder: GeocoderConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub sqlite_path: PathBuf,
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("photoindex")
        .join("catalog.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sqlite_path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailConfig {
    #[serde(default = "default_thumb_cache_path")]
    pub path: PathBuf,
}

fn default_thumb_cache_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("photoindex/thumbnails")
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            path: default_thumb_cache_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub enabled: bool,

    /// ONNX model file. Defaults to `<data_local_dir>/photoindex/models/classifier.onnx`.
    #[serde(default)]
    pub model_path: Option<PathBuf>,

    /// Where to fetch the model from when `model_path` does not exist yet.
    #[serde(default)]
    pub model_url: Option<String>,

    /// One label per line, in model output order.
    #[serde(default)]
    pub labels_path: Option<PathBuf>,

    #[serde(default = "default_input_name")]
    pub input_name: String,

    #[serde(default = "default_input_size")]
    pub input_size: u32,

    #[serde(default = "default_threads")]
    pub threads: usize,
}

fn default_input_name() -> String {
    "input".to_string()
}

fn default_input_size() -> u32 {
    224
}

fn default_threads() -> usize {
    4
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model_path: None,
            model_url: None,
            labels_path: None,
            input_name: default_input_name(),
            input_size: default_input_size(),
            threads: default_threads(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_geocoder_endpoint")]
    pub endpoint: String,

    /// Nominatim's usage policy requires an identifying User-Agent.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_geocoder_endpoint() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_user_agent() -> String {
    format!("photoindex/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_geocoder_endpoint(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    #[default]
    Stderr,
    File,
    Journald,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub target: LogTarget,

    /// Directory for the rolling log file when `target = "file"`.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

fn default_originals_path() -> PathBuf {
    dirs::picture_dir().unwrap_or_else(|| PathBuf::from("originals"))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            originals_path: default_originals_path(),
            database: DatabaseConfig::default(),
            thumbnails: ThumbnailConfig::default(),
            classifier: ClassifierConfig::default(),
            geocoder: GeocoderConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load from `PHOTOINDEX_CONFIG` or the default location, writing a
    /// default config file on first run.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("photoindex")
    }

    fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("PHOTOINDEX_CONFIG") {
            return PathBuf::from(path);
        }

        Self::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            originals_path = "/srv/photos"

            [geocoder]
            enabled = true
            "#,
        )
        .unwrap();

        assert_eq!(config.originals_path, PathBuf::from("/srv/photos"));
        assert!(config.geocoder.enabled);
        assert_eq!(config.geocoder.endpoint, "https://nominatim.openstreetmap.org");
        assert!(!config.classifier.enabled);
        assert_eq!(config.classifier.input_size, 224);
        assert_eq!(config.logging.target, LogTarget::Stderr);
    }

    #[test]
    fn test_log_target_parses_lowercase() {
        let config: Config = toml::from_str("[logging]\ntarget = \"journald\"\n").unwrap();
        assert_eq!(config.logging.target, LogTarget::Journald);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let mut config = Config::default();
        config.originals_path = PathBuf::from("/data/originals");
        config.classifier.labels_path = Some(PathBuf::from("/models/labels.txt"));
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.originals_path, config.originals_path);
        assert_eq!(loaded.classifier.labels_path, config.classifier.labels_path);
    }
}
