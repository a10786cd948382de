use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Global CLI arguments
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    #[arg(long, global = true, help = "Configuration file path")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(
        short,
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Only log errors"
    )]
    pub quiet: bool,
}

/// Subcommands that only deal with configuration
#[derive(Subcommand, Debug, Clone)]
pub enum CommonCommands {
    /// Show the effective configuration and exit
    Config {
        #[arg(long, help = "Show configuration in JSON format")]
        json: bool,
    },
}

/// Utility functions for CLI operations
pub mod utils {
    use super::*;
    use crate::config::{CONFIG, Configuration};
    use anyhow::{Context, Result};
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::filter::LevelFilter;

    /// The log level selected by the flags, falling back to the configuration
    pub fn log_level<'a>(args: &CommonArgs, config: &'a Configuration) -> &'a str {
        if args.quiet {
            "error"
        } else if args.verbose {
            "debug"
        } else {
            config.logging.level.as_str()
        }
    }

    /// Install the stderr subscriber; `RUST_LOG` wins over everything else
    pub fn init_logging(args: &CommonArgs, config: &Configuration) {
        let level = log_level(args, config);
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    /// Load configuration with optional override from CLI
    pub fn load_config(config_path: Option<&PathBuf>) -> Result<Configuration> {
        match config_path {
            Some(path) => {
                if !path.is_file() {
                    anyhow::bail!("Configuration file not found: {}", path.display());
                }
                Configuration::load_from_path(path).context("Failed to load configuration")
            }
            None => Configuration::load().context("Failed to load configuration"),
        }
    }

    /// Publish the configuration for the rest of the process
    pub fn install_config(config: Configuration) -> &'static Configuration {
        CONFIG.get_or_init(|| config)
    }

    /// Display configuration as TOML, or as JSON with `json`
    pub fn display_config(config: &Configuration, json: bool) -> Result<()> {
        let rendered = if json {
            serde_json::to_string_pretty(config)
                .context("Failed to serialize configuration to JSON")?
        } else {
            toml::to_string_pretty(config).context("Failed to serialize configuration to TOML")?
        };
        println!("{rendered}");
        Ok(())
    }

    /// Validate configuration and report any issues
    pub fn validate_config(config: &Configuration) -> Result<()> {
        log::debug!("Validating configuration...");

        config
            .logging
            .level
            .parse::<LevelFilter>()
            .with_context(|| format!("Invalid log level '{}'", config.logging.level))?;

        log::debug!("Configuration validation passed");
        Ok(())
    }

    /// Handle the configuration subcommands
    pub fn handle_common_command(command: &CommonCommands, config: &Configuration) -> Result<()> {
        match command {
            CommonCommands::Config { json } => display_config(config, *json),
        }
    }
}
