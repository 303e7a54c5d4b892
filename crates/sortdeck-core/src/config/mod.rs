//! Configuration management for sortdeck.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Every section implements `Default`, so a missing file or a
//! partial file both yield a usable configuration.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for sortdeck.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Source image settings
    pub input: InputConfig,

    /// Output folder settings
    pub output: OutputConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Embedding model settings
    pub embedding: EmbeddingConfig,

    /// Category list
    pub categories: CategoriesConfig,

    /// Slide geometry
    pub slides: SlidesConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.sortdeck.sortdeck/config.toml
    /// - Linux: ~/.config/sortdeck/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\sortdeck\config\config.toml
    ///
    /// Falls back to ~/.sortdeck/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "sortdeck", "sortdeck")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".sortdeck").join("config.toml")
            })
    }

    /// Get the resolved model directory path (with ~ expansion).
    pub fn model_dir(&self) -> PathBuf {
        expand(&self.general.model_dir)
    }

    /// Directory for the cached category embeddings.
    ///
    /// Sits beside the models directory: `~/.sortdeck/models` puts the cache
    /// at `~/.sortdeck/cache`.
    pub fn cache_dir(&self) -> PathBuf {
        let model_dir = self.model_dir();
        model_dir.parent().unwrap_or(&model_dir).join("cache")
    }

    /// Resolved source image folder.
    pub fn input_dir(&self) -> PathBuf {
        expand(&self.input.dir)
    }

    /// Resolved root of the per-category folders.
    pub fn categorized_dir(&self) -> PathBuf {
        expand(&self.output.categorized_dir)
    }

    /// Resolved deck output folder.
    pub fn decks_dir(&self) -> PathBuf {
        expand(&self.output.decks_dir)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

fn expand(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    let expanded = shellexpand::tilde(&path_str);
    PathBuf::from(expanded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.categories.labels.len(), 6);
        assert_eq!(config.categories.labels[0], "Success & Hard Work");
        assert_eq!(config.input.dir, PathBuf::from("motivational_images"));
        assert_eq!(config.output.categorized_dir, PathBuf::from("Final_images"));
        assert_eq!(config.output.decks_dir, PathBuf::from("presentations"));
        assert_eq!(config.slides.width_in, 10.0);
        assert_eq!(config.slides.max_image_height_in, 6.5);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[categories]"));
        assert!(toml.contains("[slides]"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [input]
            dir = "raw"

            [slides]
            width_in = 13.333
            "#,
        )
        .unwrap();
        assert_eq!(config.input.dir, PathBuf::from("raw"));
        assert!(!config.input.recursive);
        assert_eq!(config.slides.width_in, 13.333);
        assert_eq!(config.slides.height_in, 7.5);
        assert_eq!(config.categories.labels.len(), 6);
    }

    #[test]
    fn test_invalid_toml_is_rejected_by_validation() {
        let err = Config::from_toml(
            r#"
            [categories]
            labels = []
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("categories.labels"));
    }

    #[test]
    fn test_cache_dir_beside_models() {
        let mut config = Config::default();
        config.general.model_dir = PathBuf::from("/opt/sortdeck/models");
        assert_eq!(config.cache_dir(), PathBuf::from("/opt/sortdeck/cache"));
    }

    #[test]
    fn test_prompt_template() {
        let mut categories = CategoriesConfig::default();
        assert_eq!(categories.prompt_for("Habits"), "Habits");
        categories.prompt_template = "a motivational poster about {label}".into();
        assert_eq!(
            categories.prompt_for("Habits"),
            "a motivational poster about Habits"
        );
    }
}
