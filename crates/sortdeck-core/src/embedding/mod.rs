//! Vision-language embeddings.
//!
//! Categorization only needs two capabilities: embed an image and embed a
//! piece of text, both into the same space. [`EmbeddingModel`] is that seam;
//! [`SigLipModel`] implements it with SigLIP encoders running locally via
//! ONNX Runtime.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sortdeck_core::{Config, EmbeddingModel, SigLipModel};
//!
//! let config = Config::default();
//! let model = SigLipModel::load(&config.embedding, &config.model_dir())?;
//! let vector = model.embed_image(&decoded_image)?;
//! ```

pub(crate) mod preprocess;
pub(crate) mod siglip;
pub(crate) mod text;

use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::config::EmbeddingConfig;
use crate::error::PipelineError;

use self::preprocess::preprocess;
use self::siglip::{model_error, SigLipSession};
use self::text::SigLipTextEncoder;

/// Vision encoder filename inside `{model_dir}/{model}/`.
pub const VISUAL_MODEL_FILENAME: &str = "visual.onnx";
/// Text encoder filename inside `{model_dir}/`.
pub const TEXT_MODEL_FILENAME: &str = "text_model.onnx";
/// Tokenizer filename inside `{model_dir}/`.
pub const TOKENIZER_FILENAME: &str = "tokenizer.json";

/// Anything that maps images and texts into one shared embedding space.
///
/// Implementations must return vectors of one fixed dimension and be
/// deterministic for identical input. Callers normalize before comparing. Errors are always fatal to the
/// run, so implementations should report them as [`PipelineError::Model`].
pub trait EmbeddingModel: Send + Sync {
    /// Identifier of the loaded model, used to key the label cache.
    fn model_id(&self) -> &str;

    /// Embed one decoded image.
    fn embed_image(&self, image: &DynamicImage) -> Result<Vec<f32>, PipelineError>;

    /// Embed a batch of texts, one vector per input in order.
    fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError>;

    /// Embed a single text.
    fn embed_text(&self, text: &str) -> Result<Vec<f32>, PipelineError> {
        self.embed_texts(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| model_error("Text encoder returned no embedding"))
    }
}

/// SigLIP vision + text encoders.
pub struct SigLipModel {
    model_id: String,
    vision: SigLipSession,
    text: SigLipTextEncoder,
    image_size: u32,
}

impl SigLipModel {
    /// Load both encoders from the model directory.
    ///
    /// Expects `{model_dir}/{model}/visual.onnx`, `{model_dir}/text_model.onnx`
    /// and `{model_dir}/tokenizer.json`.
    pub fn load(config: &EmbeddingConfig, model_dir: &Path) -> Result<Self, PipelineError> {
        let visual_path = Self::visual_path(config, model_dir);
        let text_path = model_dir.join(TEXT_MODEL_FILENAME);
        let tokenizer_path = model_dir.join(TOKENIZER_FILENAME);

        for path in [&visual_path, &text_path, &tokenizer_path] {
            if !path.exists() {
                return Err(model_error(format!(
                    "Model file not found at {:?}. Run `sortdeck models download` first.",
                    path
                )));
            }
        }

        tracing::info!("Loading SigLIP model {:?} from {:?}", config.model, model_dir);
        let vision = SigLipSession::load(&visual_path)?;
        let text = SigLipTextEncoder::load(&text_path, &tokenizer_path)?;
        tracing::info!("SigLIP model loaded");

        Ok(Self {
            model_id: config.model.clone(),
            vision,
            text,
            image_size: config.image_size,
        })
    }

    /// Whether every file needed by [`SigLipModel::load`] is on disk.
    pub fn model_exists(config: &EmbeddingConfig, model_dir: &Path) -> bool {
        Self::visual_path(config, model_dir).exists()
            && model_dir.join(TEXT_MODEL_FILENAME).exists()
            && model_dir.join(TOKENIZER_FILENAME).exists()
    }

    /// Expected vision encoder path for a model variant.
    pub fn visual_path(config: &EmbeddingConfig, model_dir: &Path) -> PathBuf {
        model_dir.join(&config.model).join(VISUAL_MODEL_FILENAME)
    }
}

impl EmbeddingModel for SigLipModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn embed_image(&self, image: &DynamicImage) -> Result<Vec<f32>, PipelineError> {
        let tensor = preprocess(image, self.image_size);
        self.vision.embed(&tensor)
    }

    fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        self.text.encode_batch(texts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_paths() {
        let config = EmbeddingConfig::default();
        let dir = Path::new("/models");
        assert_eq!(
            SigLipModel::visual_path(&config, dir),
            PathBuf::from("/models/siglip-base-patch16/visual.onnx")
        );
    }

    #[test]
    fn test_model_exists_false_for_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!SigLipModel::model_exists(
            &EmbeddingConfig::default(),
            dir.path()
        ));
    }

    #[test]
    fn test_load_missing_files_is_model_error() {
        let dir = tempfile::tempdir().unwrap();
        match SigLipModel::load(&EmbeddingConfig::default(), dir.path()) {
            Err(PipelineError::Model { message }) => {
                assert!(message.contains("sortdeck models download"));
            }
            Err(other) => panic!("expected Model error, got {other}"),
            Ok(_) => panic!("loading from an empty directory must fail"),
        }
    }

    struct Echo;

    impl EmbeddingModel for Echo {
        fn model_id(&self) -> &str {
            "echo"
        }

        fn embed_image(&self, _image: &DynamicImage) -> Result<Vec<f32>, PipelineError> {
            Ok(vec![1.0, 0.0])
        }

        fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
            Ok(texts.iter().map(|t| vec![t.len() as f32, 0.0]).collect())
        }
    }

    #[test]
    fn test_embed_text_default_takes_first() {
        assert_eq!(Echo.embed_text("abc").unwrap(), vec![3.0, 0.0]);
    }
}
