//! SigLIP vision encoder session.
//!
//! Loads a SigLIP visual encoder exported to ONNX and turns one preprocessed
//! image tensor into one unit-length embedding.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;

use crate::error::PipelineError;

/// Wraps an ONNX Runtime session for SigLIP visual embedding.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`.
pub struct SigLipSession {
    session: Mutex<Session>,
    /// Name of the input tensor (detected from model metadata).
    input_name: String,
}

impl SigLipSession {
    /// Load a SigLIP visual encoder from an ONNX file.
    pub fn load(model_path: &Path) -> Result<Self, PipelineError> {
        let session = Session::builder()
            .map_err(|e| model_error(format!("Failed to create ONNX session builder: {e}")))?
            .commit_from_file(model_path)
            .map_err(|e| {
                model_error(format!(
                    "Failed to load vision model {}: {e}",
                    model_path.display()
                ))
            })?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| "pixel_values".to_string());

        tracing::debug!(
            "Loaded SigLIP vision model from {:?} (input: {:?})",
            model_path,
            input_name
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
        })
    }

    /// Run inference on a preprocessed image tensor and return the embedding.
    ///
    /// Input shape: \[1, 3, image_size, image_size\] (NCHW, normalized to \[-1, 1\]).
    /// Output: L2-normalized `pooler_output` vector.
    pub fn embed(&self, preprocessed: &Array4<f32>) -> Result<Vec<f32>, PipelineError> {
        let shape: Vec<i64> = preprocessed.shape().iter().map(|&d| d as i64).collect();
        let flat_data: Vec<f32> = preprocessed.iter().copied().collect();

        let input_value = Value::from_array((shape, flat_data))
            .map_err(|e| model_error(format!("Failed to create input tensor: {e}")))?;

        let inputs = ort::inputs![self.input_name.as_str() => input_value];

        let mut session = self
            .session
            .lock()
            .map_err(|e| model_error(format!("Vision session lock poisoned: {e}")))?;

        let outputs = session
            .run(inputs)
            .map_err(|e| model_error(format!("Vision inference failed: {e}")))?;

        // pooler_output is the cross-modal projection; last_hidden_state is not
        // aligned with the text tower and must not be compared to labels.
        let pooler_output = outputs
            .iter()
            .find(|(name, _)| *name == "pooler_output")
            .ok_or_else(|| model_error("Vision model did not produce pooler_output"))?;

        let (shape, data) = pooler_output
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e| model_error(format!("Failed to extract pooler_output: {e}")))?;

        let mut raw = match shape.len() {
            1 => data.to_vec(),
            2 => {
                let dim = shape[1] as usize;
                data[..dim].to_vec()
            }
            _ => {
                return Err(model_error(format!(
                    "Unexpected pooler_output shape: {:?}",
                    shape
                )));
            }
        };

        crate::math::l2_normalize_in_place(&mut raw);
        Ok(raw)
    }
}

pub(crate) fn model_error(message: impl Into<String>) -> PipelineError {
    PipelineError::Model {
        message: message.into(),
    }
}
