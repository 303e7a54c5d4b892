//! Configuration validation with range checks.

use std::collections::HashMap;

use crate::error::ConfigError;
use crate::output::OutputFormat;
use crate::storage::sanitize_category_name;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        self.validate_categories()?;
        self.validate_slides()?;

        if self.input.supported_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "input.supported_formats must not be empty".into(),
            ));
        }
        if OutputFormat::parse(&self.output.manifest_format).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "output.manifest_format must be \"json\" or \"jsonl\", got {:?}",
                self.output.manifest_format
            )));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.embedding.image_size == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.image_size must be > 0".into(),
            ));
        }
        Ok(())
    }

    fn validate_categories(&self) -> Result<(), ConfigError> {
        let labels = &self.categories.labels;
        if labels.is_empty() {
            return Err(ConfigError::ValidationError(
                "categories.labels must contain at least one category".into(),
            ));
        }
        if !self.categories.prompt_template.contains("{label}") {
            return Err(ConfigError::ValidationError(
                "categories.prompt_template must contain {label}".into(),
            ));
        }

        // Two labels that sanitize to the same folder would share a bucket.
        let mut folders: HashMap<String, &str> = HashMap::new();
        for label in labels {
            if label.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "categories.labels must not contain blank labels".into(),
                ));
            }
            let folder = sanitize_category_name(label);
            if let Some(previous) = folders.insert(folder.clone(), label) {
                let message = if previous == label {
                    format!("categories.labels contains {label:?} twice")
                } else {
                    format!(
                        "categories.labels {previous:?} and {label:?} both map to folder {folder:?}"
                    )
                };
                return Err(ConfigError::ValidationError(message));
            }
        }
        Ok(())
    }

    fn validate_slides(&self) -> Result<(), ConfigError> {
        let s = &self.slides;
        for (name, value) in [
            ("slides.width_in", s.width_in),
            ("slides.height_in", s.height_in),
            ("slides.max_image_width_in", s.max_image_width_in),
            ("slides.max_image_height_in", s.max_image_height_in),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be a positive number"
                )));
            }
        }
        if s.max_image_width_in > s.width_in {
            return Err(ConfigError::ValidationError(
                "slides.max_image_width_in must not exceed slides.width_in".into(),
            ));
        }
        if s.max_image_height_in > s.height_in {
            return Err(ConfigError::ValidationError(
                "slides.max_image_height_in must not exceed slides.height_in".into(),
            ));
        }
        Ok(())
    }
}
