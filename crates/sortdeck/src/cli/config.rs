//! The `sortdeck config` command for configuration management.

use clap::{Args, Subcommand};
use sortdeck_core::{sanitize_category_name, Config};

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display current configuration, including the category list
    Show,

    /// Show config file path
    Path,

    /// List categories with their folder names and encoding prompts
    Categories,

    /// Write a config file with the default categories and folders
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Execute the config command.
pub async fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let config = Config::load()?;
            println!("{}", config.to_toml()?);
        }

        ConfigCommand::Path => {
            let path = Config::default_path();
            println!("{}", path.display());
        }

        ConfigCommand::Categories => {
            let config = Config::load()?;
            for line in category_lines(&config) {
                println!("{line}");
            }
        }

        ConfigCommand::Init { force } => {
            let path = Config::default_path();

            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at: {}\nUse --force to overwrite.",
                    path.display()
                );
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            std::fs::write(&path, Config::default().to_toml()?)?;

            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

/// One line per category, in tie-break order.
fn category_lines(config: &Config) -> Vec<String> {
    config
        .categories
        .labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            format!(
                "{:>2}. {:<36} folder: {:<36} prompt: {:?}",
                i + 1,
                label,
                sanitize_category_name(label),
                config.categories.prompt_for(label)
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_lines_show_folder_names() {
        let lines = category_lines(&Config::default());
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with(" 1. Success & Hard Work"));
        assert!(lines[5].contains("folder: Life Lessons _ General Motivation"));
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let toml = Config::default().to_toml().unwrap();
        assert!(toml.contains("[categories]"));
        assert!(toml.contains("Success & Hard Work"));

        let parsed = Config::from_toml(&toml).unwrap();
        assert_eq!(parsed.categories.labels, Config::default().categories.labels);
        assert_eq!(parsed.slides.slide_size(), Config::default().slides.slide_size());
    }
}
