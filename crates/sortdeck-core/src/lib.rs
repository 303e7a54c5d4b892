//! sortdeck core - zero-shot image categorization and slide decks.
//!
//! sortdeck takes a folder of images, assigns each one to the closest of a
//! fixed list of categories using SigLIP image/text embeddings, copies it into
//! that category's folder, and then writes one `.pptx` deck per category with
//! every image scaled and centered on its own slide.
//!
//! # Architecture
//!
//! ```text
//! Discover → Decode → Embed (SigLIP) → Nearest category → Copy to bucket
//! Bucket → Measure → Layout → PPTX deck
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use sortdeck_core::{Config, Sortdeck};
//!
//! fn main() -> sortdeck_core::Result<()> {
//!     let sortdeck = Sortdeck::new(Config::load()?);
//!     let mut sorter = sortdeck.sorter()?;
//!     let files = sorter.discover(&sortdeck.config().input_dir());
//!     let report = sorter.sort_all(&files, |_| {})?;
//!     sortdeck.deck_builder().build_all(
//!         &sortdeck.category_names(),
//!         sorter.store(),
//!         &sortdeck.config().decks_dir(),
//!         |_| {},
//!     )?;
//!     Ok(())
//! }
//! ```

pub mod categorize;
pub mod config;
pub mod deck;
pub mod embedding;
pub mod error;
pub mod layout;
pub mod math;
pub mod output;
pub mod pipeline;
pub mod storage;
pub mod types;

use std::sync::Arc;

// Re-exports for convenient access
pub use categorize::{Categorizer, Category, CategorySet};
pub use config::Config;
pub use deck::{DeckBuilder, PptxWriter};
pub use embedding::{EmbeddingModel, SigLipModel};
pub use error::{
    ConfigError, DeckError, LayoutError, PipelineError, PipelineResult, Result, SortdeckError,
};
pub use layout::{compute_placement, BoundingBox, ImageDimensions, Placement, SlideSize};
pub use output::{OutputFormat, OutputWriter};
pub use pipeline::{FileDiscovery, ImageDecoder, ImageSorter};
pub use storage::{sanitize_category_name, CategoryStore};
pub use types::{
    CategoryAssignment, DeckReport, DeckSummary, ImageOutcome, ManifestRecord, SkippedImage,
    SortReport,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Entry point wiring configuration to the two phases.
pub struct Sortdeck {
    config: Config,
}

impl Sortdeck {
    pub fn new(config: Config) -> Self {
        tracing::debug!("Initializing sortdeck v{}", VERSION);
        Self { config }
    }

    /// Get a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Configured category names, in tie-break order.
    pub fn category_names(&self) -> Vec<String> {
        self.config.categories.labels.clone()
    }

    /// Load the SigLIP model from the configured model directory.
    pub fn load_model(&self) -> PipelineResult<SigLipModel> {
        SigLipModel::load(&self.config.embedding, &self.config.model_dir())
    }

    /// Build the categorizer around any embedding model.
    ///
    /// Label embeddings come from the cache when it matches, otherwise they
    /// are encoded once here.
    pub fn categorizer(&self, model: Arc<dyn EmbeddingModel>) -> PipelineResult<Categorizer> {
        let categories = CategorySet::load_or_encode(
            &self.config.categories,
            model.as_ref(),
            &self.config.cache_dir(),
        )?;
        Ok(Categorizer::new(model, categories))
    }

    /// Categorization phase backed by the SigLIP model.
    pub fn sorter(&self) -> PipelineResult<ImageSorter> {
        let model: Arc<dyn EmbeddingModel> = Arc::new(self.load_model()?);
        Ok(self.sorter_with(self.categorizer(model)?))
    }

    /// Categorization phase with an already built categorizer.
    pub fn sorter_with(&self, categorizer: Categorizer) -> ImageSorter {
        ImageSorter::new(&self.config, categorizer, self.store())
    }

    /// Category folders under the configured output root.
    pub fn store(&self) -> CategoryStore {
        CategoryStore::new(self.config.categorized_dir())
    }

    /// Deck phase builder using the configured slide geometry.
    pub fn deck_builder(&self) -> DeckBuilder {
        DeckBuilder::new(&self.config)
    }
}
