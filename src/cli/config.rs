//! Configuration layering for CLI arguments
//!
//! Defaults, then the JSON config file, then command-line flags.

use crate::cli::main_impl::Cli;
use crate::config::StudioConfig;
use anyhow::{Context, Result};
use std::path::Path;

/// Convert CLI arguments to a validated [`StudioConfig`]
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    pub(crate) fn from_cli(cli: &Cli) -> Result<StudioConfig> {
        let base = match &cli.config {
            Some(path) => Self::load_file(path)?,
            None => match StudioConfig::default_path() {
                Some(path) if path.is_file() => Self::load_file(&path)?,
                _ => StudioConfig::default(),
            },
        };
        Self::apply_overrides(base, cli)
    }

    fn load_file(path: &Path) -> Result<StudioConfig> {
        StudioConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))
    }

    fn apply_overrides(mut config: StudioConfig, cli: &Cli) -> Result<StudioConfig> {
        if let Some(format) = cli.format {
            config.output_format = format.into();
        }
        if let Some(quality) = cli.jpeg_quality {
            config.jpeg_quality = quality;
        }
        if cli.verbose >= 2 {
            config.debug = true;
        }
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}
