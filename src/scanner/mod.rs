//! Scan engine: data model, pattern matching and job coordination
//!
//! ```text
//! ScanJob ──▶ ScanCoordinator ──compile──▶ CompiledMatcher (shared, read-only)
//!                   │
//!                   ├──▶ WorkQueue ──pop──▶ worker 0..N ──▶ FileScanner::scan_file
//!                   │                                        │ ExtractorFactory
//!                   │                                        │ chunk → matcher → MatchInfo
//!                   ◀──────────── result map (mutex) ◀───────┘
//!                   ▼
//!               ScanReport
//! ```

pub mod core;
pub mod discovery;
pub mod patterns;
pub mod types;

pub use core::{CancelHandle, FileScanner, ScanCoordinator, ScanError};
pub use discovery::{Targets, collect_targets};
pub use patterns::{CompiledMatcher, MatchEvent, PatternError, Scratch};
pub use types::{
    FileTypeFilter, JobState, MatchInfo, ScanJob, ScanOutcome, ScanPattern, ScanProgress,
    ScanReport, ScanResult, ScanSettings, ScanStats,
};
