//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::layout::{BoundingBox, SlideSize};
use crate::output::OutputFormat;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where models are stored
    pub model_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("~/.sortdeck/models"),
        }
    }
}

/// Where source images are read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Folder holding the raw images
    pub dir: PathBuf,

    /// Descend into subfolders
    pub recursive: bool,

    /// Accepted file extensions (case-insensitive)
    pub supported_formats: Vec<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("motivational_images"),
            recursive: false,
            supported_formats: vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()],
        }
    }
}

/// Where categorized images and decks are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root of the per-category image folders
    pub categorized_dir: PathBuf,

    /// Folder receiving one `.pptx` per category
    pub decks_dir: PathBuf,

    /// Format of the optional assignment manifest ("json" or "jsonl")
    pub manifest_format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            categorized_dir: PathBuf::from("Final_images"),
            decks_dir: PathBuf::from("presentations"),
            manifest_format: "json".to_string(),
        }
    }
}

impl OutputConfig {
    /// Parsed manifest format, falling back to JSON.
    pub fn manifest_format(&self) -> OutputFormat {
        OutputFormat::parse(&self.manifest_format).unwrap_or(OutputFormat::Json)
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            max_image_dimension: 10000,
        }
    }
}

/// Embedding model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Model name/variant ("siglip-base-patch16" or "siglip-base-patch16-384")
    pub model: String,

    /// Image input size, 224 for base and 384 for the 384 variant.
    pub image_size: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "siglip-base-patch16".to_string(),
            image_size: 224,
        }
    }
}

impl EmbeddingConfig {
    /// Resolve image size from model name.
    pub fn image_size_for_model(model: &str) -> u32 {
        if model.contains("384") {
            384
        } else {
            224
        }
    }
}

/// The fixed category list and how its labels are encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoriesConfig {
    /// Category display names, in tie-break order
    pub labels: Vec<String>,

    /// Text fed to the encoder for each label; `{label}` is substituted.
    pub prompt_template: String,

    /// Persist encoded labels next to the models and reuse them across runs
    pub cache: bool,
}

impl Default for CategoriesConfig {
    fn default() -> Self {
        Self {
            labels: [
                "Success & Hard Work",
                "Habits & Discipline",
                "Time & Productivity",
                "Attitude & Positivity",
                "Knowledge & Learning",
                "Life Lessons / General Motivation",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            prompt_template: "{label}".to_string(),
            cache: true,
        }
    }
}

impl CategoriesConfig {
    /// Render the encoder prompt for one label.
    pub fn prompt_for(&self, label: &str) -> String {
        self.prompt_template.replace("{label}", label)
    }
}

/// Slide geometry, in inches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlidesConfig {
    /// Full slide width
    pub width_in: f64,

    /// Full slide height
    pub height_in: f64,

    /// Largest width an image may occupy
    pub max_image_width_in: f64,

    /// Largest height an image may occupy
    pub max_image_height_in: f64,
}

impl Default for SlidesConfig {
    fn default() -> Self {
        Self {
            width_in: 10.0,
            height_in: 7.5,
            max_image_width_in: 9.0,
            max_image_height_in: 6.5,
        }
    }
}

impl SlidesConfig {
    pub fn slide_size(&self) -> SlideSize {
        SlideSize::new(self.width_in, self.height_in)
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::new(self.max_image_width_in, self.max_image_height_in)
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
