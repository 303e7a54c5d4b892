//! The `sortdeck models` command for managing the SigLIP model files.

use clap::{Args, Subcommand, ValueEnum};
use sortdeck_core::embedding::{TEXT_MODEL_FILENAME, TOKENIZER_FILENAME, VISUAL_MODEL_FILENAME};
use sortdeck_core::storage::content_hash;
use sortdeck_core::Config;
use std::path::Path;

/// Arguments for the `models` command.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Subcommands for model management.
#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// Download required models (SigLIP vision + text encoder + tokenizer)
    Download {
        /// Vision encoder variant(s) to fetch
        #[arg(long, value_enum, default_value = "base")]
        variant: VariantChoice,
    },

    /// List installed models
    List,

    /// Show model directory path
    Path,
}

/// Which vision encoder(s) to download.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum VariantChoice {
    /// Base (224), ~350MB, fast
    Base,
    /// Base (384), ~350MB, higher detail and 3-4x slower
    High,
    /// Both variants, switch per run with --quality
    Both,
}

impl VariantChoice {
    fn indices(self) -> &'static [usize] {
        match self {
            VariantChoice::Base => &[0],
            VariantChoice::High => &[1],
            VariantChoice::Both => &[0, 1],
        }
    }
}

/// Available SigLIP vision model variants.
struct ModelVariant {
    name: &'static str,
    label: &'static str,
    repo: &'static str,
    remote_path: &'static str,
    blake3: &'static str,
}

const VISION_VARIANTS: &[ModelVariant] = &[
    ModelVariant {
        name: "siglip-base-patch16",
        label: "Base (224)",
        repo: "Xenova/siglip-base-patch16-224",
        remote_path: "onnx/vision_model.onnx",
        blake3: "05cd313b67db70acd8e800cd4c16105c3ebc4c385fe6002108d24ea806a248be",
    },
    ModelVariant {
        name: "siglip-base-patch16-384",
        label: "Base (384)",
        repo: "Xenova/siglip-base-patch16-384",
        remote_path: "onnx/vision_model.onnx",
        blake3: "9a4dcfd0c21b8e4d143652d1e566da52222605b564979723383f6012b53dd0df",
    },
];

/// The text encoder and tokenizer are shared by both vision variants.
const TEXT_ENCODER_REPO: &str = "Xenova/siglip-base-patch16-224";
const TEXT_ENCODER_REMOTE: &str = "onnx/text_model.onnx";
const TOKENIZER_REMOTE: &str = "tokenizer.json";

const TEXT_ENCODER_BLAKE3: &str =
    "fe62b4096a9e5c3ce735b771472c9e3faac6ddeceebab5794a0a5ce17ee171dd";
const TOKENIZER_BLAKE3: &str = "cf171f3552992f467891b9d59be5bde1256ffe1344c62030d4bf0f87df583906";

fn hf_url(repo: &str, remote_path: &str) -> String {
    format!("https://huggingface.co/{repo}/resolve/main/{remote_path}")
}

fn status(path: &Path) -> &'static str {
    if path.exists() {
        "ready"
    } else {
        "not installed"
    }
}

/// Execute the models command.
pub async fn execute(args: ModelsArgs) -> anyhow::Result<()> {
    let config = Config::load()?;

    match args.command {
        ModelsCommand::Download { variant } => {
            let client = reqwest::Client::new();

            download_vision(variant.indices(), &config, &client).await?;
            download_shared(&config, &client).await?;

            tracing::info!("All downloads complete.");
            println!("Models ready in {}", config.model_dir().display());
        }

        ModelsCommand::List => {
            let model_dir = config.model_dir();

            if !model_dir.exists() {
                println!("No models installed.");
                println!("Run `sortdeck models download` to download required models.");
                return Ok(());
            }

            println!("Installed models:");
            println!("  Directory: {}\n", model_dir.display());

            println!("  Vision encoders:");
            for variant in VISION_VARIANTS {
                let visual_path = model_dir.join(variant.name).join(VISUAL_MODEL_FILENAME);
                let default_marker = if variant.name == config.embedding.model {
                    "  (default)"
                } else {
                    ""
                };
                println!(
                    "    - {:30} {:14}{}",
                    variant.name,
                    status(&visual_path),
                    default_marker
                );
            }

            println!("\n  Shared:");
            for name in [TEXT_MODEL_FILENAME, TOKENIZER_FILENAME] {
                println!("    - {:30} {}", name, status(&model_dir.join(name)));
            }
        }

        ModelsCommand::Path => {
            println!("{}", config.model_dir().display());
        }
    }

    Ok(())
}

/// Download vision model variant(s) by index (0 = Base 224, 1 = Base 384).
///
/// Skips already-downloaded files.
async fn download_vision(
    variant_indices: &[usize],
    config: &Config,
    client: &reqwest::Client,
) -> anyhow::Result<()> {
    let model_dir = config.model_dir();

    for variant in variant_indices.iter().filter_map(|&i| VISION_VARIANTS.get(i)) {
        let variant_dir = model_dir.join(variant.name);
        let dest = variant_dir.join(VISUAL_MODEL_FILENAME);

        if dest.exists() {
            tracing::info!("{} already exists at {:?}", variant.label, dest);
            continue;
        }

        std::fs::create_dir_all(&variant_dir)?;
        tracing::info!("Downloading {} vision encoder...", variant.label);
        download_file(
            client,
            &hf_url(variant.repo, variant.remote_path),
            &dest,
            Some(variant.blake3),
        )
        .await?;
        log_size(variant.label, &dest)?;
    }

    Ok(())
}

/// Download the shared text encoder and tokenizer. Skips files already present.
async fn download_shared(config: &Config, client: &reqwest::Client) -> anyhow::Result<()> {
    let model_dir = config.model_dir();
    std::fs::create_dir_all(&model_dir)?;

    let shared = [
        ("Text encoder", TEXT_ENCODER_REMOTE, TEXT_MODEL_FILENAME, TEXT_ENCODER_BLAKE3),
        ("Tokenizer", TOKENIZER_REMOTE, TOKENIZER_FILENAME, TOKENIZER_BLAKE3),
    ];

    for (label, remote, local, blake3) in shared {
        let dest = model_dir.join(local);
        if dest.exists() {
            tracing::info!("{} already exists at {:?}", label, dest);
            continue;
        }

        tracing::info!("Downloading {}...", label.to_lowercase());
        download_file(client, &hf_url(TEXT_ENCODER_REPO, remote), &dest, Some(blake3)).await?;
        log_size(label, &dest)?;
    }

    Ok(())
}

fn log_size(label: &str, path: &Path) -> anyhow::Result<()> {
    let file_size = std::fs::metadata(path)?.len();
    tracing::info!(
        "  {} complete ({:.1} MB)",
        label,
        file_size as f64 / (1024.0 * 1024.0)
    );
    Ok(())
}

/// Stream `url` into `dest`, showing a byte progress bar.
///
/// With `expected_blake3`, the written file is checked afterwards and removed
/// on mismatch.
async fn download_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    expected_blake3: Option<&str>,
) -> anyhow::Result<()> {
    use futures_util::StreamExt;
    use tokio::io::AsyncWriteExt;

    tracing::debug!("Fetching {} into {:?}", url, dest);

    let response = client
        .get(url)
        .send()
        .await?
        .error_for_status()
        .map_err(|e| anyhow::anyhow!("Download failed for {url}: {e}"))?;

    let progress = download_bar(response.content_length());
    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        progress.inc(chunk.len() as u64);
    }

    file.flush().await?;
    progress.finish_and_clear();

    if let Some(expected) = expected_blake3 {
        verify_blake3(dest, expected)?;
    }

    Ok(())
}

fn download_bar(total: Option<u64>) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let Some(total) = total else {
        return ProgressBar::new_spinner();
    };
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("  [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
    {
        pb.set_style(style.progress_chars("##-"));
    }
    pb
}

/// Verify a downloaded file's BLAKE3 checksum.
///
/// On mismatch, removes the corrupt file so the next run re-downloads.
fn verify_blake3(path: &Path, expected: &str) -> anyhow::Result<()> {
    let actual = content_hash(path)
        .map_err(|e| anyhow::anyhow!("Checksum computation failed for {}: {e}", path.display()))?;

    if actual != expected {
        let _ = std::fs::remove_file(path);
        anyhow::bail!(
            "Checksum mismatch for {}:\n  expected: {}\n  actual:   {}\n\
             Corrupt file removed, try downloading again.",
            path.display(),
            expected,
            actual
        );
    }

    tracing::debug!("  Checksum verified: {}", &actual[..16]);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_file(dir: &Path, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn verify_blake3_correct_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_file(dir.path(), "verify_ok", b"hello sortdeck");
        let expected = content_hash(&path).unwrap();

        assert!(verify_blake3(&path, &expected).is_ok());
        assert!(
            path.exists(),
            "file should still exist after successful verify"
        );
    }

    #[test]
    fn verify_blake3_wrong_hash_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_file(dir.path(), "verify_bad", b"hello sortdeck");
        let wrong_hash = "0000000000000000000000000000000000000000000000000000000000000000";

        let err_msg = verify_blake3(&path, wrong_hash).unwrap_err().to_string();
        assert!(
            err_msg.contains("Checksum mismatch"),
            "error should mention mismatch: {err_msg}"
        );
        assert!(
            err_msg.contains("Corrupt file removed"),
            "error should mention removal: {err_msg}"
        );
        assert!(!path.exists(), "corrupt file should be deleted");
    }

    #[test]
    fn verify_blake3_missing_file() {
        let result = verify_blake3(
            Path::new("/nonexistent/file.onnx"),
            "0000000000000000000000000000000000000000000000000000000000000000",
        );
        assert!(result.is_err());
    }

    #[test]
    fn variant_choice_indices_cover_known_variants() {
        assert_eq!(VariantChoice::Base.indices(), &[0]);
        assert_eq!(VariantChoice::Both.indices(), &[0, 1]);
        for choice in [VariantChoice::Base, VariantChoice::High, VariantChoice::Both] {
            assert!(choice.indices().iter().all(|&i| i < VISION_VARIANTS.len()));
        }
    }

    #[test]
    fn variant_names_match_embedding_config() {
        let default = sortdeck_core::config::EmbeddingConfig::default();
        assert_eq!(VISION_VARIANTS[0].name, default.model);
        assert_eq!(
            sortdeck_core::config::EmbeddingConfig::image_size_for_model(VISION_VARIANTS[1].name),
            384
        );
    }
}
