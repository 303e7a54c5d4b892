//! Logging initialization.
//!
//! Library code logs through `tracing`; this installs the subscriber with a
//! human-readable or JSON formatter. Everything goes to stderr, alongside the
//! progress bar and the phase summaries.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Subscriber settings resolved from config and command-line flags.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LogSettings {
    level: &'static str,
    json: bool,
}

impl LogSettings {
    /// `--verbose` raises the level to at least debug; `--json-logs` forces JSON.
    fn resolve(config: &sortdeck_core::Config, verbose: bool, json_logs: bool) -> Self {
        let level = match config.logging.level.as_str() {
            "trace" => "trace",
            "debug" => "debug",
            _ if verbose => "debug",
            "warn" => "warn",
            "error" => "error",
            _ => "info",
        };
        Self {
            level,
            json: json_logs || config.logging.format == "json",
        }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the resolved level.
pub fn init_from_config(config: &sortdeck_core::Config, verbose: bool, json_logs: bool) {
    let settings = LogSettings::resolve(config, verbose, json_logs);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(settings.level));

    if settings.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sortdeck_core::Config;

    #[test]
    fn test_default_is_info_pretty() {
        let settings = LogSettings::resolve(&Config::default(), false, false);
        assert_eq!(
            settings,
            LogSettings {
                level: "info",
                json: false
            }
        );
    }

    #[test]
    fn test_verbose_flag_never_lowers_trace() {
        let mut config = Config::default();
        assert_eq!(LogSettings::resolve(&config, true, false).level, "debug");

        config.logging.level = "trace".to_string();
        assert_eq!(LogSettings::resolve(&config, true, false).level, "trace");

        config.logging.level = "warn".to_string();
        assert_eq!(LogSettings::resolve(&config, false, false).level, "warn");
        assert_eq!(LogSettings::resolve(&config, true, false).level, "debug");
    }

    #[test]
    fn test_json_from_flag_or_config() {
        let mut config = Config::default();
        assert!(LogSettings::resolve(&config, false, true).json);

        config.logging.format = "json".to_string();
        assert!(LogSettings::resolve(&config, false, false).json);
    }
}
