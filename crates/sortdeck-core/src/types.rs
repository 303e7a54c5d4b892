//! Core data types produced by the sortdeck pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The category chosen for one successfully embedded image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAssignment {
    /// Path of the source image
    pub source: PathBuf,

    /// Category display name
    pub category: String,

    /// Position of the category in the configured list
    pub category_index: usize,

    /// Folder-safe category name used for the bucket and deck file
    pub bucket: String,

    /// Cosine similarity between image and category embeddings
    pub score: f32,
}

/// An image the batch left out, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedImage {
    /// Path of the source image
    pub source: PathBuf,

    /// Short reason ("undecodable", "copy failed", ...)
    pub reason: String,

    /// Full error text
    pub detail: String,
}

/// Per-image result of the categorization phase.
///
/// Skips are ordinary outcomes, not errors: the batch keeps going.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageOutcome {
    /// Image was categorized and copied into its bucket.
    Assigned {
        assignment: CategoryAssignment,
        stored_at: PathBuf,
    },
    /// Image was left out of the run.
    Skipped(SkippedImage),
}

/// Tagged union written to the run manifest.
/// Internally tagged: `{"type":"assigned",...}` or `{"type":"skipped",...}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ManifestRecord {
    Assigned(CategoryAssignment),
    Skipped(SkippedImage),
}

impl From<&ImageOutcome> for ManifestRecord {
    fn from(outcome: &ImageOutcome) -> Self {
        match outcome {
            ImageOutcome::Assigned { assignment, .. } => Self::Assigned(assignment.clone()),
            ImageOutcome::Skipped(skipped) => Self::Skipped(skipped.clone()),
        }
    }
}

/// Aggregate of one categorization run.
#[derive(Debug, Clone, Default)]
pub struct SortReport {
    /// Every per-image outcome, in processing order
    pub outcomes: Vec<ImageOutcome>,

    /// Images assigned per category, indexed like the category list
    pub per_category: Vec<usize>,

    /// Categories whose folder could not be created
    pub unavailable_categories: Vec<String>,

    /// Wall-clock duration in seconds
    pub total_seconds: f64,
}

impl SortReport {
    /// Create an empty report for `category_count` categories.
    pub fn new(category_count: usize) -> Self {
        Self {
            per_category: vec![0; category_count],
            ..Default::default()
        }
    }

    /// Record one outcome.
    pub fn push(&mut self, outcome: ImageOutcome) {
        if let ImageOutcome::Assigned { assignment, .. } = &outcome {
            if let Some(count) = self.per_category.get_mut(assignment.category_index) {
                *count += 1;
            }
        }
        self.outcomes.push(outcome);
    }

    /// Number of images assigned to a category.
    pub fn assigned(&self) -> usize {
        self.per_category.iter().sum()
    }

    /// Number of images skipped.
    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ImageOutcome::Skipped(_)))
            .count()
    }

    /// Manifest records for every outcome.
    pub fn manifest(&self) -> Vec<ManifestRecord> {
        self.outcomes.iter().map(ManifestRecord::from).collect()
    }
}

/// One deck written by the deck phase.
#[derive(Debug, Clone, PartialEq)]
pub struct DeckSummary {
    /// Category display name (the deck title)
    pub category: String,

    /// Written `.pptx` path
    pub path: PathBuf,

    /// Picture slides in the deck (title slide excluded)
    pub image_slides: usize,

    /// Images in the bucket that could not be placed
    pub skipped: Vec<SkippedImage>,
}

/// Aggregate of one deck phase.
#[derive(Debug, Clone, Default)]
pub struct DeckReport {
    /// Decks written, in category order
    pub decks: Vec<DeckSummary>,

    /// Categories with no images, for which no deck was written
    pub empty_categories: Vec<String>,
}

impl DeckReport {
    /// Total picture slides across all decks.
    pub fn image_slides(&self) -> usize {
        self.decks.iter().map(|d| d.image_slides).sum()
    }

    /// Total bucket images left out of decks.
    pub fn skipped(&self) -> usize {
        self.decks.iter().map(|d| d.skipped.len()).sum()
    }
}
