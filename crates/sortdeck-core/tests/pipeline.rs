//! End-to-end runs of both phases with an in-memory embedding model.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use sortdeck_core::{
    Config, EmbeddingModel, ImageOutcome, ManifestRecord, OutputFormat, OutputWriter,
    PipelineError, Sortdeck,
};

/// Embeds images by their dominant color channel and labels by keyword.
///
/// Red images match "Success", green "Habits", blue "Time".
struct ColorModel;

impl EmbeddingModel for ColorModel {
    fn model_id(&self) -> &str {
        "color-test"
    }

    fn embed_image(&self, image: &DynamicImage) -> Result<Vec<f32>, PipelineError> {
        let rgb = image.to_rgb8();
        let (w, h) = image.dimensions();
        let p = rgb.get_pixel(w / 2, h / 2);
        let v = [p[0] as f32, p[1] as f32, p[2] as f32];
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        Ok(v.iter().map(|x| x / norm).collect())
    }

    fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        Ok(texts
            .iter()
            .map(|t| {
                if t.contains("Success") {
                    vec![1.0, 0.0, 0.0]
                } else if t.contains("Habits") {
                    vec![0.0, 1.0, 0.0]
                } else if t.contains("Time") {
                    vec![0.0, 0.0, 1.0]
                } else {
                    vec![0.577, 0.577, 0.577]
                }
            })
            .collect())
    }
}

fn write_image(path: &Path, w: u32, h: u32, color: [u8; 3], format: ImageFormat) {
    RgbImage::from_pixel(w, h, Rgb(color))
        .save_with_format(path, format)
        .unwrap();
}

fn config_in(root: &Path) -> Config {
    let mut config = Config::default();
    config.general.model_dir = root.join("models");
    config.input.dir = root.join("motivational_images");
    config.output.categorized_dir = root.join("Final_images");
    config.output.decks_dir = root.join("presentations");
    config
}

fn slide_count(deck: &Path) -> usize {
    let archive = zip::ZipArchive::new(std::fs::File::open(deck).unwrap()).unwrap();
    archive
        .file_names()
        .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
        .count()
}

fn read_part(deck: &Path, name: &str) -> String {
    let mut archive = zip::ZipArchive::new(std::fs::File::open(deck).unwrap()).unwrap();
    let mut part = archive.by_name(name).unwrap();
    let mut body = String::new();
    part.read_to_string(&mut body).unwrap();
    body
}

#[test]
fn test_full_run_sorts_and_builds_decks() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let input = config.input_dir();
    std::fs::create_dir_all(&input).unwrap();

    write_image(&input.join("red_wide.png"), 1920, 1080, [250, 10, 10], ImageFormat::Png);
    write_image(&input.join("red_square.jpg"), 500, 500, [240, 20, 20], ImageFormat::Jpeg);
    write_image(&input.join("green_tall.png"), 1080, 1920, [10, 250, 10], ImageFormat::Png);
    std::fs::write(input.join("corrupt.jpg"), b"\xff\xd8 truncated").unwrap();
    std::fs::write(input.join("readme.txt"), b"ignored").unwrap();

    let sortdeck = Sortdeck::new(config);
    let categorizer = sortdeck.categorizer(Arc::new(ColorModel)).unwrap();
    let mut sorter = sortdeck.sorter_with(categorizer);

    let files = sorter.discover(&input);
    assert_eq!(files.len(), 4, "txt files are not discovered");

    let mut lines = Vec::new();
    let report = sorter
        .sort_all(&files, |outcome| lines.push(outcome.clone()))
        .unwrap();

    // Undecodable input is skipped and the batch continues.
    assert_eq!(report.assigned(), 3);
    assert_eq!(report.skipped(), 1);
    assert_eq!(lines.len(), 4);
    let skipped: Vec<_> = report
        .outcomes
        .iter()
        .filter_map(|o| match o {
            ImageOutcome::Skipped(s) => Some(s),
            _ => None,
        })
        .collect();
    assert!(skipped[0].source.ends_with("corrupt.jpg"));
    assert_eq!(skipped[0].reason, "undecodable");

    assert_eq!(report.per_category, vec![2, 1, 0, 0, 0, 0]);
    let sorted = sortdeck.config().categorized_dir();
    assert!(sorted.join("Success & Hard Work").join("red_wide.png").exists());
    assert!(sorted.join("Habits & Discipline").join("green_tall.png").exists());
    assert!(input.join("red_wide.png").exists(), "sources are copied, not moved");

    let decks = sortdeck
        .deck_builder()
        .build_all(
            &sortdeck.category_names(),
            sorter.store(),
            &sortdeck.config().decks_dir(),
            |_| {},
        )
        .unwrap();

    // Categories with zero images get no deck.
    assert_eq!(decks.decks.len(), 2);
    assert_eq!(decks.empty_categories.len(), 4);
    let decks_dir = sortdeck.config().decks_dir();
    assert!(!decks_dir.join("Time & Productivity.pptx").exists());
    assert!(!decks_dir
        .join("Life Lessons _ General Motivation.pptx")
        .exists());

    let success = decks_dir.join("Success & Hard Work.pptx");
    assert_eq!(slide_count(&success), 3);
    assert!(read_part(&success, "ppt/slides/slide1.xml").contains("Success &amp; Hard Work"));

    // Slides follow path order: red_square.jpg before red_wide.png.
    let square = read_part(&success, "ppt/slides/slide2.xml");
    assert!(square.contains("red_square.jpg"));
    assert!(square.contains(r#"<a:ext cx="5943600" cy="5943600"/>"#));
    let wide = read_part(&success, "ppt/slides/slide3.xml");
    assert!(wide.contains(r#"<a:off x="457200" y="1114425"/>"#));

    assert_eq!(slide_count(&decks_dir.join("Habits & Discipline.pptx")), 2);
}

#[test]
fn test_manifest_lists_every_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let input = config.input_dir();
    std::fs::create_dir_all(&input).unwrap();
    write_image(&input.join("blue.png"), 64, 48, [5, 5, 250], ImageFormat::Png);
    std::fs::write(input.join("bad.png"), b"nope").unwrap();

    let sortdeck = Sortdeck::new(config);
    let mut sorter = sortdeck.sorter_with(sortdeck.categorizer(Arc::new(ColorModel)).unwrap());
    let files = sorter.discover(&input);
    let report = sorter.sort_all(&files, |_| {}).unwrap();

    let mut buf = Vec::new();
    let mut writer = OutputWriter::new(&mut buf, OutputFormat::JsonLines, false);
    writer.write_all(&report.manifest()).unwrap();
    writer.flush().unwrap();
    drop(writer);

    let records: Vec<ManifestRecord> = String::from_utf8(buf)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(records.len(), 2);
    assert!(records.iter().any(|r| matches!(
        r,
        ManifestRecord::Assigned(a) if a.category == "Time & Productivity"
    )));
    assert!(records
        .iter()
        .any(|r| matches!(r, ManifestRecord::Skipped(s) if s.reason == "undecodable")));
}

#[test]
fn test_second_run_reuses_category_cache() {
    let dir = tempfile::tempdir().unwrap();
    let sortdeck = Sortdeck::new(config_in(dir.path()));

    sortdeck.categorizer(Arc::new(ColorModel)).unwrap();
    let cache = sortdeck.config().cache_dir().join("categories.bin");
    assert!(cache.exists());

    let again = sortdeck.categorizer(Arc::new(ColorModel)).unwrap();
    assert_eq!(again.categories().len(), 6);
}
