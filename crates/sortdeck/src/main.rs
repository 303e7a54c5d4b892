//! sortdeck CLI - sort a folder of images into themed categories and build
//! one slide deck per category.
//!
//! Each image is embedded with SigLIP, matched to the closest category label,
//! and copied into that category's folder. The deck phase then writes one
//! `.pptx` per category with every image scaled to fit its own slide.
//!
//! # Usage
//!
//! ```bash
//! # Download the SigLIP model files (once)
//! sortdeck models download
//!
//! # Categorize and build decks
//! sortdeck run --input ./motivational_images
//!
//! # Only one phase
//! sortdeck categorize --manifest assignments.json
//! sortdeck decks --decks ./presentations
//!
//! # View configuration
//! sortdeck config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// sortdeck - categorize images by theme and build one slide deck per category.
#[derive(Parser, Debug)]
#[command(name = "sortdeck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Categorize every image, then build the decks
    Run(cli::run::RunArgs),

    /// Copy images into per-category folders
    Categorize(cli::categorize::CategorizeArgs),

    /// Build one deck per category folder
    Decks(cli::decks::DecksArgs),

    /// Manage SigLIP models (download, list, etc.)
    Models(cli::models::ModelsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match sortdeck_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `sortdeck config path`."
            );
            sortdeck_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("sortdeck v{}", sortdeck_core::VERSION);

    match cli.command {
        Commands::Run(args) => cli::run::execute(args).await,
        Commands::Categorize(args) => cli::categorize::execute(args).await,
        Commands::Decks(args) => cli::decks::execute(args).await,
        Commands::Models(args) => cli::models::execute(args).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
