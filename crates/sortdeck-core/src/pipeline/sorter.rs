//! Categorization phase: decode, categorize, and copy every input image.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::categorize::Categorizer;
use crate::config::Config;
use crate::error::PipelineError;
use crate::storage::CategoryStore;
use crate::types::{ImageOutcome, SkippedImage, SortReport};

use super::decode::ImageDecoder;
use super::discovery::{DiscoveredFile, FileDiscovery};

#[derive(Debug, Clone)]
enum Bucket {
    Pending,
    Ready(PathBuf),
    Unavailable,
}

/// Sorts images into per-category folders.
///
/// Category folders are created on first use. A folder that cannot be
/// created disables its category for the rest of the run; images assigned to
/// it are reported as skipped.
pub struct ImageSorter {
    decoder: ImageDecoder,
    discovery: FileDiscovery,
    categorizer: Categorizer,
    store: CategoryStore,
    buckets: Vec<Bucket>,
}

impl ImageSorter {
    pub fn new(config: &Config, categorizer: Categorizer, store: CategoryStore) -> Self {
        let buckets = vec![Bucket::Pending; categorizer.categories().len()];
        Self {
            decoder: ImageDecoder::new(config.limits.clone()),
            discovery: FileDiscovery::new(&config.input),
            categorizer,
            store,
            buckets,
        }
    }

    pub fn categorizer(&self) -> &Categorizer {
        &self.categorizer
    }

    pub fn store(&self) -> &CategoryStore {
        &self.store
    }

    /// Discover all image files at a path.
    pub fn discover(&self, path: &Path) -> Vec<DiscoveredFile> {
        self.discovery.discover(path)
    }

    /// Sort one image.
    ///
    /// Recoverable failures come back as [`ImageOutcome::Skipped`]; only
    /// fatal errors (model failures) are returned as `Err`.
    pub fn sort_file(&mut self, path: &Path) -> Result<ImageOutcome, PipelineError> {
        let start = Instant::now();
        tracing::debug!("Sorting: {:?}", path);

        let decoded = match self.decoder.decode(path) {
            Ok(decoded) => decoded,
            Err(e) if e.is_recoverable() => return Ok(skipped(path, &e)),
            Err(e) => return Err(e),
        };
        tracing::trace!(
            "  Decode: {:?} ({:?}, {} bytes)",
            start.elapsed(),
            decoded.format,
            decoded.file_size
        );

        let assignment = self.categorizer.categorize(&decoded.image, path)?;
        tracing::trace!("  Categorize: {:?}", start.elapsed());

        let bucket = match self.bucket_for(assignment.category_index, &assignment.category) {
            Ok(bucket) => bucket,
            Err(e) => return Ok(skipped(path, &e)),
        };

        let stored_at = match self.store.copy_into(&bucket, path) {
            Ok(dest) => dest,
            Err(e) if e.is_recoverable() => return Ok(skipped(path, &e)),
            Err(e) => return Err(e),
        };

        tracing::debug!(
            "Sorted {:?} into {:?} ({:.4}) in {:?}",
            path,
            assignment.category,
            assignment.score,
            start.elapsed()
        );

        Ok(ImageOutcome::Assigned {
            assignment,
            stored_at,
        })
    }

    /// Sort every file in order, reporting each outcome as it happens.
    ///
    /// Stops at the first fatal error.
    pub fn sort_all<F>(
        &mut self,
        files: &[DiscoveredFile],
        mut on_outcome: F,
    ) -> Result<SortReport, PipelineError>
    where
        F: FnMut(&ImageOutcome),
    {
        let start = Instant::now();
        let mut report = SortReport::new(self.categorizer.categories().len());

        for file in files {
            let outcome = self.sort_file(&file.path)?;
            on_outcome(&outcome);
            report.push(outcome);
        }

        report.unavailable_categories = self.unavailable_categories();
        report.total_seconds = start.elapsed().as_secs_f64();
        Ok(report)
    }

    /// Display names of categories whose folder could not be created.
    pub fn unavailable_categories(&self) -> Vec<String> {
        self.buckets
            .iter()
            .enumerate()
            .filter(|(_, b)| matches!(b, Bucket::Unavailable))
            .filter_map(|(i, _)| self.categorizer.categories().get(i))
            .map(|c| c.name.clone())
            .collect()
    }

    fn bucket_for(&mut self, index: usize, category: &str) -> Result<PathBuf, PipelineError> {
        match self.buckets.get(index) {
            Some(Bucket::Ready(path)) => return Ok(path.clone()),
            Some(Bucket::Pending) => {}
            Some(Bucket::Unavailable) | None => {
                return Err(PipelineError::BucketUnavailable {
                    category: category.to_string(),
                    path: self.store.bucket_path(category),
                    message: "category disabled for this run".to_string(),
                });
            }
        }

        match self.store.ensure_bucket(category) {
            Ok(path) => {
                self.buckets[index] = Bucket::Ready(path.clone());
                Ok(path)
            }
            Err(e) => {
                tracing::warn!("Disabling category {:?}: {}", category, e);
                self.buckets[index] = Bucket::Unavailable;
                Err(e)
            }
        }
    }
}

fn skipped(path: &Path, error: &PipelineError) -> ImageOutcome {
    tracing::debug!("Skipping {:?}: {}", path, error);
    ImageOutcome::Skipped(SkippedImage {
        source: path.to_path_buf(),
        reason: error.skip_reason().to_string(),
        detail: error.to_string(),
    })
}
