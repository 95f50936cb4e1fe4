//! Scan command
//!
//! Expands the given paths, runs a scan job on a blocking thread while a
//! Ctrl-C handler stands by to cancel it, prints the report and optionally
//! shreds the flagged files.

use super::CommandStatus;
use crate::cli::Output;
use crate::config::ShredscanConfig;
use crate::scanner::{
    FileTypeFilter, JobState, ScanCoordinator, ScanJob, ScanPattern, ScanProgress, ScanReport,
    ScanResult, collect_targets,
};
use crate::shred;
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Files or directories to scan
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Pattern as REGEX or REGEX=DESCRIPTION; replaces the configured patterns
    #[arg(short, long = "pattern", value_name = "REGEX[=DESC]")]
    pub patterns: Vec<String>,

    /// File extension to scan; replaces the configured file types
    #[arg(short = 't', long = "file-type", value_name = "EXT")]
    pub file_types: Vec<String>,

    /// Worker threads (0 = one per CPU core)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Bytes carried over between chunks so matches across chunk borders are found
    #[arg(long, value_name = "BYTES")]
    pub chunk_overlap: Option<usize>,

    /// Directory levels below each path that are traversed
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Show the text around each match (prints sensitive data)
    #[arg(long)]
    pub show_snippets: bool,

    /// Shred flagged files after the scan
    #[arg(long)]
    pub delete: bool,

    /// Do not ask for confirmation before shredding
    #[arg(short, long, requires = "delete")]
    pub yes: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable report
    Text,
    /// JSON report for machine processing
    Json,
}

/// Parse `REGEX` or `REGEX=DESCRIPTION`; the description follows the last `=`
pub fn parse_pattern(spec: &str) -> ScanPattern {
    match spec.rsplit_once('=') {
        Some((pattern, description)) if !pattern.is_empty() && !description.trim().is_empty() => {
            ScanPattern::new(pattern, description.trim())
        }
        _ => ScanPattern::new(spec, spec),
    }
}

/// Main execution function for the scan command
pub async fn execute(
    args: ScanArgs,
    config_path: Option<&Path>,
    output: &Output,
) -> Result<CommandStatus> {
    let config = ShredscanConfig::load_with_custom_config(config_path)
        .context("Failed to load configuration")?;
    let text = args.format == OutputFormat::Text;

    let mut settings = config.settings.clone();
    if let Some(workers) = args.workers {
        settings.workers = workers;
    }
    if let Some(overlap) = args.chunk_overlap {
        settings.chunk_overlap = overlap;
    }
    if let Some(max_depth) = args.max_depth {
        settings.max_depth = max_depth;
    }

    let patterns = if args.patterns.is_empty() {
        config.patterns.clone()
    } else {
        args.patterns.iter().map(|p| parse_pattern(p)).collect()
    };
    let file_types = if args.file_types.is_empty() {
        config.file_types.clone()
    } else {
        args.file_types
            .iter()
            .map(|ext| FileTypeFilter::new(ext, format!("{ext} file")))
            .collect()
    };

    let targets = collect_targets(&args.paths, settings.max_depth);
    let job = ScanJob::new(targets.files, patterns, file_types).with_too_deep(targets.too_deep);
    let total = job.total();
    if text {
        output.info(&format!(
            "Scanning {} files for {} patterns",
            total,
            job.patterns.len()
        ));
    }

    let block_size = settings.block_size;
    let coordinator = Arc::new(ScanCoordinator::new(settings));

    let cancel = coordinator.cancel_handle();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing files in progress");
            cancel.cancel();
        }
    });

    let progress_bar = output.progress_bar(total as u64, "Scanning");
    if !text {
        progress_bar.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }
    let pb = progress_bar.clone();
    let report = tokio::task::spawn_blocking(move || {
        coordinator.run(
            job,
            Some(move |progress: ScanProgress| pb.set_position(progress.processed as u64)),
        )
    })
    .await
    .context("Scan task failed")??;
    ctrl_c.abort();
    progress_bar.finish_and_clear();

    match args.format {
        OutputFormat::Json => print_json(&report, args.show_snippets)?,
        OutputFormat::Text => print_text(&report, total, args.show_snippets, output),
    }

    if args.delete {
        shred_flagged(&report, block_size, args.yes, output)?;
    }

    Ok(if report.has_findings() {
        CommandStatus::NeedsAttention
    } else {
        CommandStatus::Success
    })
}

fn print_json(report: &ScanReport, show_snippets: bool) -> Result<()> {
    let json = if show_snippets {
        serde_json::to_string_pretty(report)?
    } else {
        let mut redacted = report.clone();
        for outcome in redacted.outcomes.values_mut() {
            for found in &mut outcome.matches {
                found.snippet.clear();
            }
        }
        serde_json::to_string_pretty(&redacted)?
    };
    println!("{json}");
    Ok(())
}

fn print_text(report: &ScanReport, total: usize, show_snippets: bool, output: &Output) {
    if report.state == JobState::Cancelled {
        output.warning(&cancelled_message(report.outcomes.len(), total));
    }

    let flagged: Vec<_> = report
        .outcomes
        .iter()
        .filter(|(_, outcome)| outcome.is_flagged())
        .collect();

    if flagged.is_empty() {
        output.success("No sensitive data found");
    } else {
        output.category(&format!("Sensitive data found in {} files", flagged.len()));
        for (path, outcome) in &flagged {
            output.flagged_file(
                &path.display().to_string(),
                outcome.result.label(),
                outcome.matches.len(),
            );
            for found in &outcome.matches {
                let location = match &found.entry {
                    Some(entry) => format!("{entry}@{}..{}", found.start_offset, found.end_offset),
                    None => format!("@{}..{}", found.start_offset, found.end_offset),
                };
                let snippet = show_snippets.then_some(found.snippet.as_str());
                output.match_detail(&location, &found.pattern.description, snippet);
            }
        }
    }

    if output.is_verbose() {
        for (path, outcome) in &report.outcomes {
            if matches!(
                outcome.result,
                ScanResult::Unreadable | ScanResult::DirectoryTooDeep
            ) {
                output.verbose(&format!("{}: {}", outcome.result, path.display()));
            }
        }
    }

    let stats = &report.stats;
    output.category("Summary");
    output.summary_stats("Files:", stats.files_total);
    output.summary_stats("Clean:", stats.clean);
    output.summary_stats("Flagged:", stats.flagged);
    output.summary_stats("Flagged (read-only):", stats.flagged_but_unwritable);
    output.summary_stats("Unsupported:", stats.unsupported);
    output.summary_stats("Unreadable:", stats.unreadable);
    output.summary_stats("Too deep:", stats.too_deep);
    output.summary_stats("Matches:", stats.total_matches);
    output.verbose(&format!(
        "{} workers, {}ms",
        stats.workers, stats.scan_duration_ms
    ));
}

/// `total` is the size of the job, not of the partial report
fn cancelled_message(scanned: usize, total: usize) -> String {
    format!("Scan cancelled: {scanned} of {total} files were scanned; the rest were not examined")
}

fn shred_flagged(report: &ScanReport, block_size: usize, yes: bool, output: &Output) -> Result<()> {
    let unwritable: Vec<_> = report
        .outcomes
        .iter()
        .filter(|(_, outcome)| outcome.result == ScanResult::FlaggedButUnwritable)
        .map(|(path, _)| path)
        .collect();
    if !unwritable.is_empty() {
        output.warning(&format!(
            "{} flagged files are read-only and will not be shredded:",
            unwritable.len()
        ));
        for path in unwritable {
            output.list_item(&path.display().to_string());
        }
    }

    let deletable = report.deletable_paths();
    if deletable.is_empty() {
        output.info("Nothing to shred");
        return Ok(());
    }

    let prompt = format!(
        "Overwrite and permanently delete {} flagged files?",
        deletable.len()
    );
    if !output.confirm(&prompt, yes)? {
        output.info("Shredding skipped");
        return Ok(());
    }

    let deletion = shred::delete_files(&deletable, block_size);
    for path in &deletion.deleted {
        output.verbose(&format!("Shredded {}", path.display()));
    }
    for (path, reason) in &deletion.failed {
        output.error(&format!("Could not shred {}: {}", path.display(), reason));
    }
    output.success(&format!("Shredded {} files", deletion.deleted.len()));
    Ok(())
}
