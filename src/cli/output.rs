//! Terminal output for shredscan
//!
//! Consistent styled messages, progress bars and confirmation prompts.
//! Errors go to stderr and are shown even in quiet mode.

use anyhow::{Context, Result};
use console::{Term, style};
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Output handler for consistent CLI formatting
pub struct Output {
    verbose: bool,
    quiet: bool,
}

impl Output {
    /// Create a new output handler
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("✔").green(), message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✖").red(), message);
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("⚠").yellow(), message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("ℹ").blue(), message);
        }
    }

    /// Print a verbose message (only if verbose mode is enabled)
    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            println!("{} {}", style("ℹ").dim(), style(message).dim());
        }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Print a header/title
    pub fn header(&self, title: &str) {
        if !self.quiet {
            println!("\n{}", style(title).bold().underlined());
        }
    }

    /// Print a category header
    pub fn category(&self, category: &str) {
        if !self.quiet {
            println!("\n{}", style(category).bold().cyan());
        }
    }

    /// Print a flagged file with its classification
    pub fn flagged_file(&self, path: &str, label: &str, matches: usize) {
        println!(
            "  {} {} {} {}",
            style("•").red(),
            style(path).underlined(),
            style(label).red().bold(),
            style(format!("({matches} matches)")).dim()
        );
    }

    /// Print one match below a flagged file
    pub fn match_detail(&self, location: &str, description: &str, snippet: Option<&str>) {
        match snippet {
            Some(snippet) => println!(
                "      {} {} {}",
                style(location).yellow(),
                style(description).bold(),
                style(format!("…{snippet}…")).dim()
            ),
            None => println!("      {} {}", style(location).yellow(), style(description).bold()),
        }
    }

    /// Print a list item
    pub fn list_item(&self, item: &str) {
        if !self.quiet {
            println!("  • {item}");
        }
    }

    /// Print summary statistics
    pub fn summary_stats(&self, label: &str, value: usize) {
        if !self.quiet {
            println!("  {:<24} {}", style(label).dim(), style(value.to_string()).bold());
        }
    }

    /// Print a key-value pair
    pub fn key_value(&self, key: &str, value: &str, highlight: bool) {
        if !self.quiet {
            let styled_value = if highlight {
                style(value).green().bold()
            } else {
                style(value).white()
            };
            println!("  {} {}", style(key).dim(), styled_value);
        }
    }

    /// Print blank line
    pub fn blank_line(&self) {
        if !self.quiet {
            println!();
        }
    }

    /// Progress bar drawn on stderr; hidden in quiet mode and when not a terminal
    pub fn progress_bar(&self, len: u64, message: &str) -> ProgressBar {
        let pb = ProgressBar::new(len);
        if self.quiet {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        }
        if let Ok(progress_style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(progress_style.progress_chars("#>-"));
        }
        pb.set_message(message.to_string());
        pb
    }

    /// Ask for confirmation; `assume_yes` skips the prompt
    ///
    /// Without a terminal to ask on, the answer is an error rather than a
    /// silent "yes".
    pub fn confirm(&self, message: &str, assume_yes: bool) -> Result<bool> {
        if assume_yes {
            return Ok(true);
        }
        if !Term::stderr().is_term() {
            anyhow::bail!("Cannot ask for confirmation without a terminal; pass --yes to proceed");
        }
        Confirm::new()
            .with_prompt(message)
            .default(false)
            .interact()
            .context("Failed to read confirmation")
    }
}
