//! Command-line interface for shredscan
//!
//! Argument parsing with clap, logging setup and dispatch to the command
//! implementations. Exit codes: `0` nothing found, `1` sensitive data found
//! (or some files could not be shredded), `2` fatal error.

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;
mod output;

pub use commands::CommandStatus;
pub use output::Output;

/// Exit code for fatal errors
pub const EXIT_FAILURE: i32 = 2;

#[derive(Parser)]
#[command(
    name = "shredscan",
    version = env!("CARGO_PKG_VERSION"),
    about = "Find sensitive data in files and shred what was found",
    long_about = "shredscan extracts the text of plain text, PDF, ZIP-style archive and XML files, \
                  scans it for configurable regular expressions (card numbers, ID numbers, ...) \
                  and can overwrite flagged files with random bytes before deleting them."
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use custom configuration file instead of the user and project files
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan files or directories for sensitive data
    Scan(commands::scan::ScanArgs),
    /// Overwrite files with random bytes, then delete them
    Delete(commands::delete::DeleteArgs),
    /// Configuration management
    Config(commands::config::ConfigArgs),
    /// Show version information
    Version,
}

impl Cli {
    /// Execute the command and return the process exit code
    pub async fn run(self) -> i32 {
        setup_logging(self.verbose, self.quiet);
        let output = Output::new(self.verbose > 0, self.quiet);
        let config_path = self.config.as_deref();

        let result = match self.command {
            Some(Commands::Scan(args)) => commands::scan::execute(args, config_path, &output).await,
            Some(Commands::Delete(args)) => {
                commands::delete::execute(args, config_path, &output).await
            }
            Some(Commands::Config(args)) => {
                commands::config::execute(args, config_path, &output).await
            }
            Some(Commands::Version) => commands::version::execute(&output).await,
            None => {
                let mut cmd = Cli::command();
                cmd.print_help()
                    .map(|_| CommandStatus::Success)
                    .map_err(anyhow::Error::from)
            }
        };

        match result {
            Ok(status) => status.code(),
            Err(e) => {
                output.error(&format!("{e:#}"));
                EXIT_FAILURE
            }
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn,lopdf=error"),
            1 => tracing_subscriber::EnvFilter::new("info,ignore=warn,lopdf=error"),
            2 => tracing_subscriber::EnvFilter::new("debug,ignore=warn,globset=warn,lopdf=warn"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    // Logs go to stderr so stdout stays clean for --format json
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
