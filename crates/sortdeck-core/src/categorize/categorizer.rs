//! Nearest-category matching of image embeddings.
//!
//! Image and label embeddings are both unit length, so the dot product is the
//! cosine similarity. The category with the highest similarity wins; on an
//! exact tie the earlier category in the configured list wins.

use std::path::Path;
use std::sync::Arc;

use image::DynamicImage;

use crate::embedding::EmbeddingModel;
use crate::error::PipelineError;
use crate::math;
use crate::types::CategoryAssignment;

use super::category::CategorySet;

/// Assigns each image to exactly one category.
pub struct Categorizer {
    model: Arc<dyn EmbeddingModel>,
    categories: CategorySet,
}

impl Categorizer {
    pub fn new(model: Arc<dyn EmbeddingModel>, categories: CategorySet) -> Self {
        Self { model, categories }
    }

    pub fn categories(&self) -> &CategorySet {
        &self.categories
    }

    /// Similarity of `embedding` to every category, in list order.
    pub fn scores(&self, embedding: &[f32]) -> Result<Vec<f32>, PipelineError> {
        if embedding.len() != self.categories.embedding_dim() {
            return Err(PipelineError::Model {
                message: format!(
                    "Image embedding has dimension {}, categories have {}",
                    embedding.len(),
                    self.categories.embedding_dim()
                ),
            });
        }
        Ok(self
            .categories
            .iter()
            .map(|c| math::dot(embedding, &c.embedding))
            .collect())
    }

    /// Index and similarity of the best category for `embedding`.
    ///
    /// NaN scores never win. If every score is NaN the embedding is unusable
    /// and the error is fatal.
    pub fn best_match(&self, embedding: &[f32]) -> Result<(usize, f32), PipelineError> {
        let scores = self.scores(embedding)?;
        let (index, score) = argmax_first(&scores).ok_or_else(|| PipelineError::Model {
            message: "Every category similarity is NaN".to_string(),
        })?;

        if tracing::enabled!(tracing::Level::DEBUG) {
            let runner_up = scores
                .iter()
                .enumerate()
                .filter(|(i, s)| *i != index && !s.is_nan())
                .map(|(_, s)| *s)
                .fold(f32::NEG_INFINITY, f32::max);
            if runner_up.is_finite() {
                tracing::debug!(
                    "Best category #{} ({:.4}), margin over runner-up {:.4}",
                    index,
                    score,
                    score - runner_up
                );
            }
        }

        Ok((index, score))
    }

    /// Embed a decoded image and pick its category.
    pub fn categorize(
        &self,
        image: &DynamicImage,
        source: &Path,
    ) -> Result<CategoryAssignment, PipelineError> {
        let embedding = math::l2_normalize(&self.model.embed_image(image)?);
        let (index, score) = self.best_match(&embedding)?;
        let category = self
            .categories
            .get(index)
            .ok_or_else(|| PipelineError::Model {
                message: format!("Category index {index} out of range"),
            })?;

        Ok(CategoryAssignment {
            source: source.to_path_buf(),
            category: category.name.clone(),
            category_index: index,
            bucket: category.bucket.clone(),
            score,
        })
    }
}

/// First index holding the maximum non-NaN value.
pub fn argmax_first(scores: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((i, score)),
        }
    }
    best
}
