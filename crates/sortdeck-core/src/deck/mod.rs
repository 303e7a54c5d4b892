//! Deck phase: one `.pptx` per category bucket.
//!
//! Each deck opens with a title slide naming the category, followed by one
//! slide per image in the bucket (sorted by path), every image placed with
//! [`compute_placement`].

pub mod pptx;
mod xml;

use std::path::{Path, PathBuf};

use image::ImageFormat;

use crate::config::{Config, InputConfig};
use crate::error::{DeckError, PipelineError};
use crate::layout::{compute_placement, BoundingBox, SlideSize};
use crate::pipeline::{FileDiscovery, ImageDecoder};
use crate::storage::{sanitize_category_name, CategoryStore};
use crate::types::{DeckReport, DeckSummary, SkippedImage};

pub use pptx::{MediaFormat, PptxWriter};

/// Builds category decks from bucket folders.
pub struct DeckBuilder {
    decoder: ImageDecoder,
    discovery: FileDiscovery,
    slide: SlideSize,
    bbox: BoundingBox,
}

impl DeckBuilder {
    pub fn new(config: &Config) -> Self {
        let bucket_input = InputConfig {
            recursive: false,
            ..config.input.clone()
        };
        Self {
            decoder: ImageDecoder::new(config.limits.clone()),
            discovery: FileDiscovery::new(&bucket_input),
            slide: config.slides.slide_size(),
            bbox: config.slides.bounding_box(),
        }
    }

    /// Images in a bucket folder, sorted by path. A missing folder is empty.
    pub fn bucket_images(&self, bucket_dir: &Path) -> Vec<PathBuf> {
        if !bucket_dir.is_dir() {
            return vec![];
        }
        self.discovery
            .discover(bucket_dir)
            .into_iter()
            .map(|f| f.path)
            .collect()
    }

    /// Build the deck for one bucket into `dest`.
    ///
    /// Returns `Ok(None)` without touching `dest` when the bucket holds no
    /// images. Images that cannot be measured, laid out or embedded are left
    /// out and listed in the summary.
    pub fn build_category(
        &self,
        title: &str,
        bucket_dir: &Path,
        dest: &Path,
    ) -> Result<Option<DeckSummary>, DeckError> {
        let images = self.bucket_images(bucket_dir);
        if images.is_empty() {
            tracing::info!("No images for {:?}, skipping deck", title);
            return Ok(None);
        }

        let mut deck = PptxWriter::new(title, self.slide);
        let mut skipped = Vec::new();

        for path in &images {
            match self.add_image(&mut deck, path) {
                Ok(()) => {}
                Err(e) if e.is_per_image() => {
                    tracing::warn!("Leaving {:?} out of {:?}: {}", path, title, e);
                    skipped.push(SkippedImage {
                        source: path.clone(),
                        reason: skip_reason(&e).to_string(),
                        detail: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        deck.save(dest)?;
        tracing::info!(
            "Saved deck {:?} ({} picture slides)",
            dest,
            deck.picture_count()
        );

        Ok(Some(DeckSummary {
            category: title.to_string(),
            path: dest.to_path_buf(),
            image_slides: deck.picture_count(),
            skipped,
        }))
    }

    /// Build one deck per category, in list order.
    ///
    /// The output folder is created if missing; a deck write failure aborts.
    pub fn build_all<F>(
        &self,
        categories: &[String],
        store: &CategoryStore,
        decks_dir: &Path,
        mut on_deck: F,
    ) -> Result<DeckReport, DeckError>
    where
        F: FnMut(&DeckSummary),
    {
        std::fs::create_dir_all(decks_dir).map_err(|source| DeckError::Io {
            path: decks_dir.to_path_buf(),
            source,
        })?;

        let mut report = DeckReport::default();
        for category in categories {
            let dest = decks_dir.join(format!("{}.pptx", sanitize_category_name(category)));
            match self.build_category(category, &store.bucket_path(category), &dest)? {
                Some(summary) => {
                    on_deck(&summary);
                    report.decks.push(summary);
                }
                None => report.empty_categories.push(category.clone()),
            }
        }
        Ok(report)
    }

    fn add_image(&self, deck: &mut PptxWriter, path: &Path) -> Result<(), DeckError> {
        let dimensions = self
            .decoder
            .read_dimensions(path)
            .map_err(|e| image_error(path, &e))?;
        let placement =
            compute_placement(dimensions, self.bbox, self.slide).map_err(|source| {
                DeckError::Layout {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
        let (bytes, format) = embeddable_bytes(path)?;

        let description = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        deck.add_picture(bytes, format, description, &placement);
        Ok(())
    }
}

/// Image bytes in a format a deck can embed; other formats become PNG.
fn embeddable_bytes(path: &Path) -> Result<(Vec<u8>, MediaFormat), DeckError> {
    let bytes = std::fs::read(path).map_err(|e| DeckError::Image {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    match image::guess_format(&bytes) {
        Ok(ImageFormat::Png) => Ok((bytes, MediaFormat::Png)),
        Ok(ImageFormat::Jpeg) => Ok((bytes, MediaFormat::Jpeg)),
        _ => {
            let decoded = image::load_from_memory(&bytes).map_err(|e| DeckError::Image {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            let mut png = std::io::Cursor::new(Vec::new());
            decoded
                .write_to(&mut png, ImageFormat::Png)
                .map_err(|e| DeckError::Image {
                    path: path.to_path_buf(),
                    message: format!("PNG re-encode failed: {e}"),
                })?;
            Ok((png.into_inner(), MediaFormat::Png))
        }
    }
}

fn image_error(path: &Path, error: &PipelineError) -> DeckError {
    DeckError::Image {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}

fn skip_reason(error: &DeckError) -> &'static str {
    match error {
        DeckError::Layout { .. } => "invalid dimensions",
        _ => "undecodable",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::Read;

    fn write_image(path: &Path, w: u32, h: u32, format: ImageFormat) {
        RgbImage::from_pixel(w, h, Rgb([90, 120, 150]))
            .save_with_format(path, format)
            .unwrap();
    }

    fn slide_xml(deck: &Path, n: usize) -> String {
        let mut archive = zip::ZipArchive::new(std::fs::File::open(deck).unwrap()).unwrap();
        let mut part = archive
            .by_name(&format!("ppt/slides/slide{n}.xml"))
            .unwrap();
        let mut body = String::new();
        part.read_to_string(&mut body).unwrap();
        body
    }

    #[test]
    fn test_empty_bucket_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = dir.path().join("Habits");
        std::fs::create_dir_all(&bucket).unwrap();
        let dest = dir.path().join("Habits.pptx");

        let builder = DeckBuilder::new(&Config::default());
        assert!(builder.build_category("Habits", &bucket, &dest).unwrap().is_none());
        assert!(builder
            .build_category("Habits", &dir.path().join("missing"), &dest)
            .unwrap()
            .is_none());
        assert!(!dest.exists());
    }

    #[test]
    fn test_deck_orders_slides_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = dir.path().join("bucket");
        std::fs::create_dir_all(&bucket).unwrap();
        write_image(&bucket.join("b_tall.png"), 1080, 1920, ImageFormat::Png);
        write_image(&bucket.join("a_wide.jpg"), 1920, 1080, ImageFormat::Jpeg);
        let dest = dir.path().join("deck.pptx");

        let summary = DeckBuilder::new(&Config::default())
            .build_category("Success & Hard Work", &bucket, &dest)
            .unwrap()
            .unwrap();

        assert_eq!(summary.image_slides, 2);
        assert!(summary.skipped.is_empty());

        // 1920x1080: 9in x 5.0625in at (0.5in, 1.21875in)
        let first = slide_xml(&dest, 2);
        assert!(first.contains(r#"<a:off x="457200" y="1114425"/>"#));
        assert!(first.contains(r#"<a:ext cx="8229600" cy="4629150"/>"#));
        assert!(first.contains("a_wide.jpg"));

        // 1080x1920: 6.5in tall, centered horizontally
        let second = slide_xml(&dest, 3);
        assert!(second.contains(r#"cy="5943600""#));
        assert!(second.contains("b_tall.png"));
    }

    #[test]
    fn test_unreadable_image_is_left_out() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = dir.path().join("bucket");
        std::fs::create_dir_all(&bucket).unwrap();
        write_image(&bucket.join("ok.png"), 40, 40, ImageFormat::Png);
        std::fs::write(bucket.join("broken.png"), b"not a png").unwrap();
        let dest = dir.path().join("deck.pptx");

        let summary = DeckBuilder::new(&Config::default())
            .build_category("X", &bucket, &dest)
            .unwrap()
            .unwrap();

        assert_eq!(summary.image_slides, 1);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].reason, "undecodable");
        assert!(dest.exists());
    }

    #[test]
    fn test_build_all_names_decks_and_reports_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CategoryStore::new(dir.path().join("Final_images"));
        let bucket = store.ensure_bucket("Life Lessons / General Motivation").unwrap();
        write_image(&bucket.join("q.png"), 30, 20, ImageFormat::Png);
        store.ensure_bucket("Habits & Discipline").unwrap();

        let categories = vec![
            "Habits & Discipline".to_string(),
            "Life Lessons / General Motivation".to_string(),
            "Time & Productivity".to_string(),
        ];
        let decks_dir = dir.path().join("presentations");
        let mut written = Vec::new();
        let report = DeckBuilder::new(&Config::default())
            .build_all(&categories, &store, &decks_dir, |d| {
                written.push(d.category.clone())
            })
            .unwrap();

        assert_eq!(written, vec!["Life Lessons / General Motivation".to_string()]);
        assert_eq!(report.decks.len(), 1);
        assert_eq!(
            report.decks[0].path,
            decks_dir.join("Life Lessons _ General Motivation.pptx")
        );
        assert!(report.decks[0].path.exists());
        assert_eq!(
            report.empty_categories,
            vec![
                "Habits & Discipline".to_string(),
                "Time & Productivity".to_string()
            ]
        );
    }

    #[test]
    fn test_deck_write_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = dir.path().join("bucket");
        std::fs::create_dir_all(&bucket).unwrap();
        write_image(&bucket.join("ok.png"), 10, 10, ImageFormat::Png);

        // Destination is a directory, so the file cannot be created.
        let dest = dir.path().join("deck.pptx");
        std::fs::create_dir_all(&dest).unwrap();

        let err = DeckBuilder::new(&Config::default())
            .build_category("X", &bucket, &dest)
            .unwrap_err();
        assert!(matches!(err, DeckError::Io { .. }));
        assert!(!err.is_per_image());
    }
}
