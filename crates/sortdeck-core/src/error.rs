//! Error types for the sortdeck pipeline.
//!
//! Errors are organized by stage so that the caller can decide, per error,
//! whether to skip the current image or abort the run. The skip policy lives in
//! [`PipelineError::is_recoverable`].

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for sortdeck operations.
#[derive(Error, Debug)]
pub enum SortdeckError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Categorization pipeline errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Slide layout errors
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    /// Deck construction errors
    #[error("Deck error: {0}")]
    Deck(#[from] DeckError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Unsupported image format
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Embedding model failed to load or to run inference
    #[error("Model error: {message}")]
    Model { message: String },

    /// Copying one image into its category folder failed
    #[error("Storage error for {path}: {message}")]
    Storage { path: PathBuf, message: String },

    /// A category folder could not be created
    #[error("Category folder unavailable for {category:?} at {path}: {message}")]
    BucketUnavailable {
        category: String,
        path: PathBuf,
        message: String,
    },
}

impl PipelineError {
    /// Whether the batch may skip the current image and continue.
    ///
    /// Decode-stage and per-image storage failures are skips. Model failures
    /// and unusable category folders are not: the former aborts the run, the
    /// latter is handled per category by the sorter.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PipelineError::Decode { .. }
                | PipelineError::UnsupportedFormat { .. }
                | PipelineError::FileNotFound(_)
                | PipelineError::FileTooLarge { .. }
                | PipelineError::ImageTooLarge { .. }
                | PipelineError::Storage { .. }
        )
    }

    /// Short reason used in skip lines and the run manifest.
    pub fn skip_reason(&self) -> &'static str {
        match self {
            PipelineError::Decode { .. }
            | PipelineError::UnsupportedFormat { .. }
            | PipelineError::FileNotFound(_) => "undecodable",
            PipelineError::FileTooLarge { .. } | PipelineError::ImageTooLarge { .. } => {
                "too large"
            }
            PipelineError::Storage { .. } => "copy failed",
            PipelineError::BucketUnavailable { .. } => "category folder unavailable",
            PipelineError::Model { .. } => "model error",
        }
    }
}

/// Slide layout errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// Non-positive or non-finite dimensions, or a slide smaller than its box
    #[error("Invalid dimensions: {message}")]
    InvalidDimensions { message: String },
}

/// Deck construction errors.
#[derive(Error, Debug)]
pub enum DeckError {
    /// Reading an image or writing the deck file failed
    #[error("IO error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The zip container could not be written
    #[error("Failed to write deck package: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML generation failed
    #[error("XML generation failed: {0}")]
    Xml(String),

    /// Image cannot be embedded in a deck
    #[error("Cannot embed {path}: {message}")]
    Image { path: PathBuf, message: String },

    /// Placement could not be computed for an image
    #[error("Layout failed for {path}: {source}")]
    Layout {
        path: PathBuf,
        #[source]
        source: LayoutError,
    },
}

impl DeckError {
    /// Whether the deck can leave this image out and carry on.
    pub fn is_per_image(&self) -> bool {
        matches!(self, DeckError::Image { .. } | DeckError::Layout { .. })
    }
}

/// Convenience type alias for sortdeck results.
pub type Result<T> = std::result::Result<T, SortdeckError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_is_recoverable() {
        let err = PipelineError::Decode {
            path: PathBuf::from("broken.jpg"),
            message: "truncated".into(),
        };
        assert!(err.is_recoverable());
        assert_eq!(err.skip_reason(), "undecodable");
    }

    #[test]
    fn test_model_error_is_fatal() {
        let err = PipelineError::Model {
            message: "session gone".into(),
        };
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_bucket_unavailable_is_not_a_plain_skip() {
        let err = PipelineError::BucketUnavailable {
            category: "Habits & Discipline".into(),
            path: PathBuf::from("/out/Habits & Discipline"),
            message: "permission denied".into(),
        };
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("Habits & Discipline"));
    }

    #[test]
    fn test_layout_error_in_deck_is_per_image() {
        let err = DeckError::Layout {
            path: PathBuf::from("a.png"),
            source: LayoutError::InvalidDimensions {
                message: "width is 0".into(),
            },
        };
        assert!(err.is_per_image());
        assert!(!DeckError::Xml("bad".into()).is_per_image());
    }
}
