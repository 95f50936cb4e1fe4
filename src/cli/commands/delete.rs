//! Delete command: overwrite files with random bytes, then remove them

use super::CommandStatus;
use crate::cli::Output;
use crate::config::ShredscanConfig;
use crate::shred;
use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Files to shred
    #[arg(value_name = "FILE", required = true)]
    pub paths: Vec<PathBuf>,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

pub async fn execute(
    args: DeleteArgs,
    config_path: Option<&Path>,
    output: &Output,
) -> Result<CommandStatus> {
    let config = ShredscanConfig::load_with_custom_config(config_path)
        .context("Failed to load configuration")?;

    for path in &args.paths {
        output.list_item(&path.display().to_string());
    }
    let prompt = format!(
        "Overwrite and permanently delete {} files?",
        args.paths.len()
    );
    if !output.confirm(&prompt, args.yes)? {
        output.info("Nothing was deleted");
        return Ok(CommandStatus::Success);
    }

    let report = shred::delete_files(&args.paths, config.settings.block_size);
    for path in &report.deleted {
        output.verbose(&format!("Shredded {}", path.display()));
    }
    for (path, reason) in &report.failed {
        output.error(&format!("Could not shred {}: {}", path.display(), reason));
    }
    output.success(&format!(
        "Shredded {} of {} files ({} bytes overwritten)",
        report.deleted.len(),
        args.paths.len(),
        report.bytes_overwritten
    ));

    Ok(if report.is_complete() {
        CommandStatus::Success
    } else {
        CommandStatus::NeedsAttention
    })
}
