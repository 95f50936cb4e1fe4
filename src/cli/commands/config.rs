//! Configuration command implementations
//!
//! Commands for inspecting and bootstrapping shredscan configuration.

use super::CommandStatus;
use crate::cli::Output;
use crate::config::ShredscanConfig;
use crate::scanner::CompiledMatcher;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write the effective configuration to a project file
    Init {
        /// Target file
        #[arg(long, default_value = "shredscan.json")]
        output: PathBuf,
        /// Overwrite an existing file without asking
        #[arg(short, long)]
        force: bool,
    },
    /// Check the configuration and report dropped entries
    Validate,
    /// Print the merged configuration as JSON
    Show,
}

/// Execute config commands
pub async fn execute(
    args: ConfigArgs,
    config_path: Option<&Path>,
    output: &Output,
) -> Result<CommandStatus> {
    let config = ShredscanConfig::load_with_custom_config(config_path)
        .context("Failed to load configuration")?;

    match args.command {
        ConfigCommands::Init { output: path, force } => init(&config, &path, force, output),
        ConfigCommands::Validate => validate(&config, output),
        ConfigCommands::Show => show(&config),
    }
}

fn init(config: &ShredscanConfig, path: &Path, force: bool, output: &Output) -> Result<CommandStatus> {
    if path.exists() && !force {
        output.warning(&format!("{} already exists", path.display()));
        if !output.confirm("Do you want to overwrite it?", false)? {
            output.info("Configuration initialization cancelled");
            return Ok(CommandStatus::Success);
        }
    }

    let json = serde_json::to_string_pretty(&config.to_config_file())?;
    fs::write(path, json + "\n")
        .with_context(|| format!("Failed to write {}", path.display()))?;

    output.success(&format!("Configuration written to {}", path.display()));
    Ok(CommandStatus::Success)
}

fn validate(config: &ShredscanConfig, output: &Output) -> Result<CommandStatus> {
    output.header("Validating Configuration");

    // Entries that survived loading are compiled together, as a scan would
    let matcher = CompiledMatcher::compile(&config.patterns)
        .context("Configured patterns do not compile together")?;

    for warning in &config.warnings {
        output.warning(warning);
    }

    output.category("Configuration Summary");
    output.summary_stats("File types:", config.file_types.len());
    output.summary_stats("Scan patterns:", matcher.len());
    output.summary_stats("Dropped entries:", config.warnings.len());
    output.summary_stats("Chunk size:", config.settings.chunk_size);
    output.summary_stats("Max matches per file:", config.settings.max_matches);

    if matcher.is_empty() {
        output.warning("No scan patterns configured; every readable file will be reported clean");
    }

    if config.warnings.is_empty() {
        output.success("Configuration is valid");
        Ok(CommandStatus::Success)
    } else {
        output.warning("Configuration loaded with dropped entries");
        Ok(CommandStatus::NeedsAttention)
    }
}

fn show(config: &ShredscanConfig) -> Result<CommandStatus> {
    let json = serde_json::to_string_pretty(&config.to_config_file())?;
    println!("{json}");
    Ok(CommandStatus::Success)
}
