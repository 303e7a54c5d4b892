//! SigLIP text encoder for category labels.
//!
//! Encodes label prompts into vectors in the same space as the vision encoder.

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Value;

use crate::error::PipelineError;

use super::siglip::model_error;

/// SigLIP default sequence length; shorter prompts are zero-padded.
const MAX_LENGTH: usize = 64;

/// SigLIP text encoder wrapper.
///
/// Uses the same `Mutex<Session>` pattern as the vision encoder.
pub struct SigLipTextEncoder {
    session: Mutex<Session>,
    tokenizer: tokenizers::Tokenizer,
}

impl SigLipTextEncoder {
    /// Load the text encoder and tokenizer from explicit paths.
    pub fn load(model_path: &Path, tokenizer_path: &Path) -> Result<Self, PipelineError> {
        let session = Session::builder()
            .map_err(|e| model_error(format!("Failed to create ONNX session builder: {e}")))?
            .commit_from_file(model_path)
            .map_err(|e| model_error(format!("Failed to load text encoder model: {e}")))?;

        let tokenizer = tokenizers::Tokenizer::from_file(tokenizer_path)
            .map_err(|e| model_error(format!("Failed to load tokenizer: {e}")))?;

        tracing::debug!(
            "Loaded SigLIP text encoder (outputs: {:?})",
            session
                .outputs()
                .iter()
                .map(|o| o.name())
                .collect::<Vec<_>>()
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    /// Encode a batch of texts to unit-length embeddings, one per input.
    pub fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        let batch_size = texts.len();
        if batch_size == 0 {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| model_error(format!("Tokenization failed: {e}")))?;

        // SigLIP's text tower takes input_ids only (no attention_mask).
        let mut input_ids = vec![0i64; batch_size * MAX_LENGTH];
        for (i, encoding) in encodings.iter().enumerate() {
            for (j, &id) in encoding.get_ids().iter().take(MAX_LENGTH).enumerate() {
                input_ids[i * MAX_LENGTH + j] = id as i64;
            }
        }

        let input_ids_value =
            Value::from_array((vec![batch_size as i64, MAX_LENGTH as i64], input_ids))
                .map_err(|e| model_error(format!("Failed to create input tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| model_error(format!("Text encoder lock poisoned: {e}")))?;

        let outputs = session
            .run(ort::inputs!["input_ids" => input_ids_value])
            .map_err(|e| model_error(format!("Text encoder inference failed: {e}")))?;

        let pooler_output = outputs
            .iter()
            .find(|(name, _)| *name == "pooler_output")
            .ok_or_else(|| model_error("Text encoder did not produce pooler_output"))?;

        let (shape, data) = pooler_output
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e| model_error(format!("Failed to extract pooler_output: {e}")))?;

        if shape.len() != 2 || shape[0] as usize != batch_size {
            return Err(model_error(format!(
                "Unexpected text pooler_output shape {:?} for {} prompts",
                shape, batch_size
            )));
        }
        let dim = shape[1] as usize;

        Ok(data.chunks(dim).map(crate::math::l2_normalize).collect())
    }
}
