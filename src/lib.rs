//! # shredscan - find and destroy sensitive data at rest
//!
//! shredscan walks arbitrarily large collections of files, pulls their textual
//! content out chunk by chunk (plain text, PDF, ZIP-style archives, XML) and
//! runs a compiled set of regular expressions over every chunk. Files that
//! contain sensitive data (card numbers, national ID numbers, ...) are flagged
//! and can then be scrambled with random bytes and unlinked.
//!
//! ## Quick Start
//!
//! ```bash
//! # Scan a folder for 16 digit card numbers in text files
//! shredscan scan ~/Documents --pattern '\d{16}=card number' --file-type txt
//!
//! # Scan, then shred whatever was flagged (asks for confirmation)
//! shredscan scan ~/Documents --delete
//! ```
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use shredscan::scanner::{ScanCoordinator, ScanJob, ScanPattern, FileTypeFilter, ScanSettings};
//!
//! let job = ScanJob::new(
//!     vec!["notes.txt".into()],
//!     vec![ScanPattern::new(r"\d{16}", "card number")],
//!     vec![FileTypeFilter::new("txt", "Text file")],
//! );
//! let coordinator = ScanCoordinator::new(ScanSettings::default());
//! let report = coordinator.run(job, None::<fn(shredscan::scanner::ScanProgress)>)?;
//!
//! for (path, outcome) in &report.outcomes {
//!     println!("{}: {:?} ({} matches)", path.display(), outcome.result, outcome.matches.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod config;
pub mod extract;
pub mod parallel;
pub mod scanner;
pub mod shred;

pub use cli::Output;
pub use config::ShredscanConfig;

/// Result type alias for application-level operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
