//! The fixed category list and its pre-computed label embeddings.
//!
//! Labels are encoded once per run (or loaded from the on-disk cache) and
//! never change afterwards. The cache is a raw little-endian f32 matrix with a
//! `.meta` sidecar holding a blake3 key over everything that affects the
//! vectors: model id, prompt template and the label list.

use std::path::{Path, PathBuf};

use crate::config::CategoriesConfig;
use crate::embedding::EmbeddingModel;
use crate::error::PipelineError;
use crate::math;
use crate::storage::sanitize_category_name;

/// Cache file name inside the cache directory.
pub const CACHE_FILENAME: &str = "categories.bin";

/// One category: its display name, folder-safe name and label embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub name: String,
    pub bucket: String,
    pub embedding: Vec<f32>,
}

/// Ordered, immutable set of categories sharing one embedding dimension.
///
/// Order matters: it is the tie-break order during matching.
#[derive(Debug, Clone)]
pub struct CategorySet {
    categories: Vec<Category>,
    embedding_dim: usize,
}

impl CategorySet {
    /// Build a set from labels and their embeddings (normalized here).
    pub fn from_embeddings(
        labels: &[String],
        embeddings: Vec<Vec<f32>>,
    ) -> Result<Self, PipelineError> {
        if labels.is_empty() {
            return Err(invalid("category list is empty"));
        }
        if labels.len() != embeddings.len() {
            return Err(invalid(format!(
                "{} labels but {} embeddings",
                labels.len(),
                embeddings.len()
            )));
        }

        let embedding_dim = embeddings[0].len();
        if embedding_dim == 0 {
            return Err(invalid("label embeddings are empty"));
        }

        let mut categories: Vec<Category> = Vec::with_capacity(labels.len());
        for (label, embedding) in labels.iter().zip(embeddings) {
            if embedding.len() != embedding_dim {
                return Err(invalid(format!(
                    "embedding for {:?} has dimension {}, expected {}",
                    label,
                    embedding.len(),
                    embedding_dim
                )));
            }
            if categories.iter().any(|c| &c.name == label) {
                return Err(invalid(format!("label {:?} appears twice", label)));
            }
            categories.push(Category {
                name: label.clone(),
                bucket: sanitize_category_name(label),
                embedding: math::l2_normalize(&embedding),
            });
        }

        Ok(Self {
            categories,
            embedding_dim,
        })
    }

    /// Encode every label prompt with the model.
    pub fn encode(
        config: &CategoriesConfig,
        model: &dyn EmbeddingModel,
    ) -> Result<Self, PipelineError> {
        let prompts: Vec<String> = config.labels.iter().map(|l| config.prompt_for(l)).collect();
        tracing::info!("Encoding {} category labels", prompts.len());
        let embeddings = model.embed_texts(&prompts)?;
        Self::from_embeddings(&config.labels, embeddings)
    }

    /// Load from the cache when its key matches, otherwise encode and refresh it.
    ///
    /// Cache failures are never fatal; they only cost a re-encode.
    pub fn load_or_encode(
        config: &CategoriesConfig,
        model: &dyn EmbeddingModel,
        cache_dir: &Path,
    ) -> Result<Self, PipelineError> {
        if !config.cache {
            return Self::encode(config, model);
        }

        let path = cache_dir.join(CACHE_FILENAME);
        let key = Self::cache_key(model.model_id(), config);

        if Self::cache_valid(&path, &key) {
            match Self::load(&path, &config.labels) {
                Ok(set) => {
                    tracing::info!("Loaded {} category embeddings from cache", set.len());
                    return Ok(set);
                }
                Err(e) => tracing::warn!("Ignoring category cache: {e}"),
            }
        }

        let set = Self::encode(config, model)?;
        if let Err(e) = set.save(&path, &key) {
            tracing::warn!("Could not write category cache: {e}");
        }
        Ok(set)
    }

    /// blake3 hex digest of everything that shapes the label vectors.
    pub fn cache_key(model_id: &str, config: &CategoriesConfig) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(model_id.as_bytes());
        hasher.update(b"\n");
        hasher.update(config.prompt_template.as_bytes());
        hasher.update(b"\n");
        for label in &config.labels {
            hasher.update(label.as_bytes());
            hasher.update(b"\n");
        }
        hasher.finalize().to_hex().to_string()
    }

    /// Write the embedding matrix plus its `.meta` sidecar.
    pub fn save(&self, path: &Path, cache_key: &str) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let bytes: Vec<u8> = self
            .categories
            .iter()
            .flat_map(|c| c.embedding.iter())
            .flat_map(|f| f.to_le_bytes())
            .collect();
        std::fs::write(path, &bytes)?;

        let meta = format!(
            "cache_key={}\ncategory_count={}\nembedding_dim={}\n",
            cache_key,
            self.categories.len(),
            self.embedding_dim
        );
        std::fs::write(meta_path(path), meta)?;

        tracing::debug!("Saved category embeddings to {:?}", path);
        Ok(())
    }

    /// Read a cached matrix for `labels`, using the sidecar's dimension.
    pub fn load(path: &Path, labels: &[String]) -> Result<Self, PipelineError> {
        let meta = std::fs::read_to_string(meta_path(path)).map_err(|e| PipelineError::Model {
            message: format!("Failed to read category cache metadata: {e}"),
        })?;
        let embedding_dim: usize = meta_value(&meta, "embedding_dim")
            .and_then(|v| v.parse().ok())
            .filter(|&dim| dim > 0)
            .ok_or_else(|| invalid("category cache metadata has no embedding_dim"))?;

        let bytes = std::fs::read(path).map_err(|e| PipelineError::Model {
            message: format!("Failed to read category cache from {:?}: {e}", path),
        })?;

        let expected_len = labels.len() * embedding_dim * 4;
        if bytes.len() != expected_len {
            return Err(invalid(format!(
                "category cache size mismatch: expected {} bytes, got {}",
                expected_len,
                bytes.len()
            )));
        }

        let floats: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        let embeddings = floats.chunks(embedding_dim).map(<[f32]>::to_vec).collect();

        Self::from_embeddings(labels, embeddings)
    }

    /// Whether the cache sidecar at `path` was written for `cache_key`.
    pub fn cache_valid(path: &Path, cache_key: &str) -> bool {
        if !path.exists() {
            return false;
        }
        let Ok(content) = std::fs::read_to_string(meta_path(path)) else {
            return false;
        };
        meta_value(&content, "cache_key") == Some(cache_key)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    pub fn get(&self, index: usize) -> Option<&Category> {
        self.categories.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Category> {
        self.categories.iter()
    }
}

fn meta_path(path: &Path) -> PathBuf {
    path.with_extension("meta")
}

fn meta_value<'a>(content: &'a str, key: &str) -> Option<&'a str> {
    content
        .lines()
        .filter_map(|line| line.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

fn invalid(message: impl Into<String>) -> PipelineError {
    PipelineError::Model {
        message: format!("Invalid category set: {}", message.into()),
    }
}
