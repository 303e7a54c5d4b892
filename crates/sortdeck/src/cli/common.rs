//! Shared command plumbing: path overrides, phase runners, progress and summaries.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, ValueEnum};
use sortdeck_core::{
    Config, DeckReport, FileDiscovery, ImageOutcome, OutputFormat as CoreOutputFormat,
    OutputWriter, SigLipModel, SortReport, Sortdeck,
};

/// Manifest formats accepted on the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ManifestFormat {
    /// Single JSON array
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
}

impl From<ManifestFormat> for CoreOutputFormat {
    fn from(format: ManifestFormat) -> Self {
        match format {
            ManifestFormat::Json => CoreOutputFormat::Json,
            ManifestFormat::Jsonl => CoreOutputFormat::JsonLines,
        }
    }
}

/// Quality preset for SigLIP vision model resolution.
#[derive(Clone, Copy, Debug, ValueEnum, Default)]
pub enum Quality {
    /// Model from the config file (base 224 unless changed)
    #[default]
    Fast,
    /// Higher detail with base 384 model (~3-4x slower)
    High,
}

/// Where the per-category image folders live. Shared by both phases.
#[derive(Args, Debug, Default, Clone)]
pub struct BucketArgs {
    /// Root of the per-category folders (overrides output.categorized_dir)
    #[arg(long, value_name = "DIR")]
    pub categorized: Option<PathBuf>,
}

impl BucketArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.categorized {
            config.output.categorized_dir = dir.clone();
        }
    }
}

/// Options for the categorization phase.
#[derive(Args, Debug, Default, Clone)]
pub struct SortArgs {
    /// Folder of source images (overrides input.dir)
    #[arg(short, long, value_name = "DIR")]
    pub input: Option<PathBuf>,

    /// Also pick up images in subfolders of the input folder
    #[arg(short, long)]
    pub recursive: bool,

    /// Quality preset: fast (224 model) or high (384 model)
    #[arg(long, value_enum, default_value = "fast")]
    pub quality: Quality,

    /// Write every assignment and skip to this file
    #[arg(short, long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Manifest format (defaults to output.manifest_format)
    #[arg(short, long, value_enum)]
    pub format: Option<ManifestFormat>,
}

impl SortArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.input {
            config.input.dir = dir.clone();
        }
        if self.recursive {
            config.input.recursive = true;
        }

        if let Quality::High = self.quality {
            let high = sortdeck_core::config::EmbeddingConfig {
                model: "siglip-base-patch16-384".to_string(),
                image_size: 384,
            };
            if SigLipModel::model_exists(&high, &config.model_dir()) {
                config.embedding = high;
            } else {
                tracing::warn!(
                    "Base 384 model not found. Falling back to {}. \
                     Run `sortdeck models download --variant high` to install it.",
                    config.embedding.model
                );
            }
        }
    }

    /// Manifest destination and format, if one was requested.
    pub fn manifest_target(&self, config: &Config) -> Option<(PathBuf, CoreOutputFormat)> {
        let format = self
            .format
            .map(CoreOutputFormat::from)
            .unwrap_or_else(|| config.output.manifest_format());
        self.manifest.clone().map(|path| (path, format))
    }
}

/// Options for the deck phase.
#[derive(Args, Debug, Default, Clone)]
pub struct DeckArgs {
    /// Folder for the generated decks (overrides output.decks_dir)
    #[arg(short, long, value_name = "DIR")]
    pub decks: Option<PathBuf>,
}

impl DeckArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.decks {
            config.output.decks_dir = dir.clone();
        }
    }
}

/// Run the categorization phase: embed, match and copy every input image.
pub fn sort_phase(
    sortdeck: &Sortdeck,
    manifest: Option<(PathBuf, CoreOutputFormat)>,
) -> anyhow::Result<SortReport> {
    let config = sortdeck.config();
    let input = config.input_dir();
    if !input.is_dir() {
        anyhow::bail!(
            "Input folder does not exist: {:?}\n\n  \
             Hint: pass --input or set input.dir in the config file.",
            input
        );
    }

    let mut sorter = sortdeck.sorter()?;
    tracing::info!(
        "Matching against {} categories",
        sorter.categorizer().categories().len()
    );

    let files = sorter.discover(&input);
    if files.is_empty() {
        tracing::warn!("No supported images found in {:?}", input);
    } else {
        tracing::info!(
            "Found {} images ({:.1} MB) in {:?}",
            files.len(),
            FileDiscovery::total_size(&files) as f64 / (1024.0 * 1024.0),
            input
        );
    }

    let progress = create_progress_bar(files.len() as u64);
    let report = sorter.sort_all(&files, |outcome| {
        match outcome {
            ImageOutcome::Assigned { assignment, .. } => {
                let name = file_name(&assignment.source);
                progress.set_message(name.clone());
                progress.println(format!(
                    "  ok    {} -> {} ({:.3})",
                    name, assignment.category, assignment.score
                ));
            }
            ImageOutcome::Skipped(skipped) => {
                progress.println(format!(
                    "  skip  {} ({})",
                    file_name(&skipped.source),
                    skipped.reason
                ));
            }
        }
        progress.inc(1);
    })?;
    progress.finish_with_message("done");

    if let Some((path, format)) = manifest {
        let file = File::create(&path)?;
        let mut writer = OutputWriter::new(BufWriter::new(file), format, true);
        writer.write_all(&report.manifest())?;
        writer.flush()?;
        tracing::info!("Manifest written to {:?}", path);
    }

    print_sort_summary(&report, &sortdeck.category_names());
    Ok(report)
}

/// Run the deck phase: one `.pptx` per non-empty category folder.
pub fn deck_phase(sortdeck: &Sortdeck) -> anyhow::Result<DeckReport> {
    let config = sortdeck.config();
    let decks_dir = config.decks_dir();
    let start = Instant::now();

    let report = sortdeck.deck_builder().build_all(
        &sortdeck.category_names(),
        &sortdeck.store(),
        &decks_dir,
        |deck| {
            eprintln!(
                "  ok    {} -> {} ({} slides)",
                deck.category,
                file_name(&deck.path),
                deck.image_slides
            );
            for skipped in &deck.skipped {
                eprintln!(
                    "  skip  {} ({})",
                    file_name(&skipped.source),
                    skipped.reason
                );
            }
        },
    )?;

    print_deck_summary(&report, start.elapsed());
    if report.decks.is_empty() {
        tracing::warn!(
            "No category folder under {:?} held any images; no decks were written",
            config.categorized_dir()
        );
    } else {
        eprintln!("All decks written to {}", decks_dir.display());
    }
    Ok(report)
}

/// Resolve configuration for a command, failing on an unreadable config file.
pub fn load_config(apply: impl FnOnce(&mut Config)) -> anyhow::Result<Config> {
    let mut config = Config::load()?;
    apply(&mut config);
    Ok(config)
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
    ) {
        pb.set_style(style.progress_chars("##-"));
    }
    pb.set_message("starting...");
    pb
}

fn print_sort_summary(report: &SortReport, categories: &[String]) {
    let rate = if report.total_seconds > 0.0 {
        report.outcomes.len() as f64 / report.total_seconds
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("          Categorization Summary");
    eprintln!("  ====================================");
    for (name, count) in categories.iter().zip(&report.per_category) {
        eprintln!("    {:<34} {:>5}", name, count);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Assigned:     {:>8}", report.assigned());
    if report.skipped() > 0 {
        eprintln!("    Skipped:      {:>8}", report.skipped());
    }
    for category in &report.unavailable_categories {
        eprintln!("    Unavailable:  {}", category);
    }
    eprintln!("    Duration:     {:>7.1}s", report.total_seconds);
    eprintln!("    Rate:         {:>7.1} img/sec", rate);
    eprintln!("  ====================================");
}

fn print_deck_summary(report: &DeckReport, elapsed: std::time::Duration) {
    eprintln!();
    eprintln!("  ====================================");
    eprintln!("              Deck Summary");
    eprintln!("  ====================================");
    eprintln!("    Decks:        {:>8}", report.decks.len());
    eprintln!("    Slides:       {:>8}", report.image_slides());
    if report.skipped() > 0 {
        eprintln!("    Skipped:      {:>8}", report.skipped());
    }
    if !report.empty_categories.is_empty() {
        eprintln!("    Empty:        {:>8}", report.empty_categories.len());
    }
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    eprintln!("  ====================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_overrides_apply() {
        let mut config = Config::default();
        BucketArgs {
            categorized: Some(PathBuf::from("/tmp/sorted")),
        }
        .apply(&mut config);
        SortArgs {
            input: Some(PathBuf::from("/tmp/in")),
            recursive: true,
            ..Default::default()
        }
        .apply(&mut config);
        DeckArgs {
            decks: Some(PathBuf::from("/tmp/decks")),
        }
        .apply(&mut config);

        assert_eq!(config.input_dir(), PathBuf::from("/tmp/in"));
        assert!(config.input.recursive);
        assert_eq!(config.categorized_dir(), PathBuf::from("/tmp/sorted"));
        assert_eq!(config.decks_dir(), PathBuf::from("/tmp/decks"));
    }

    #[test]
    fn test_high_quality_falls_back_without_model() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.general.model_dir = dir.path().to_path_buf();

        SortArgs {
            quality: Quality::High,
            ..Default::default()
        }
        .apply(&mut config);
        assert_eq!(config.embedding.model, "siglip-base-patch16");
        assert_eq!(config.embedding.image_size, 224);
    }

    #[test]
    fn test_manifest_format_resolution() {
        let config = Config::default();
        let none = SortArgs::default();
        assert!(none.manifest_target(&config).is_none());

        let from_config = SortArgs {
            manifest: Some(PathBuf::from("out.json")),
            ..Default::default()
        };
        let (_, format) = from_config.manifest_target(&config).unwrap();
        assert_eq!(format, CoreOutputFormat::Json);

        let explicit = SortArgs {
            manifest: Some(PathBuf::from("out.jsonl")),
            format: Some(ManifestFormat::Jsonl),
            ..Default::default()
        };
        let (path, format) = explicit.manifest_target(&config).unwrap();
        assert_eq!(path, PathBuf::from("out.jsonl"));
        assert_eq!(format, CoreOutputFormat::JsonLines);
    }

    #[test]
    fn test_sort_phase_requires_input_folder() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.input.dir = dir.path().join("missing");

        let err = sort_phase(&Sortdeck::new(config), None).unwrap_err();
        assert!(err.to_string().contains("Input folder does not exist"));
    }

    #[test]
    fn test_deck_phase_with_no_images_writes_no_decks() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.output.categorized_dir = dir.path().join("Final_images");
        config.output.decks_dir = dir.path().join("presentations");

        let report = deck_phase(&Sortdeck::new(config)).unwrap();
        assert!(report.decks.is_empty());
        assert_eq!(report.empty_categories.len(), 6);
    }
}
