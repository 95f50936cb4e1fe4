//! Scanner data model
//!
//! NOTE: All scanner-related types should be defined here, not in core.rs.
//! This keeps the type definitions modular and the implementation focused.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

/// Bytes of extracted content pulled from a file per read
pub const DEFAULT_CHUNK_SIZE: usize = 4096;
/// Upper bound on recorded matches per file
pub const DEFAULT_MAX_MATCHES: usize = 100;
/// Bytes of context kept on each side of a match end
pub const DEFAULT_SNIPPET_WINDOW: usize = 32;
/// Largest archive entry materialised in memory
pub const DEFAULT_MAX_ARCHIVE_ENTRY_BYTES: u64 = 64 * 1024 * 1024;
/// How many archives deep nested archives are followed
pub const DEFAULT_MAX_ARCHIVE_DEPTH: usize = 4;
/// Directory levels below a scan root that are still traversed
pub const DEFAULT_MAX_DEPTH: usize = 10;
/// Scramble block size
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// A regular expression plus the human-readable name of what it detects
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanPattern {
    pub pattern: String,
    pub description: String,
}

impl ScanPattern {
    pub fn new(pattern: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            description: description.into(),
        }
    }
}

/// Inclusion predicate on file extensions
///
/// The extension is stored normalised (no leading dot, lower case) so that
/// `".TXT"`, `"txt"` and `".txt"` all describe the same filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileTypeFilter {
    pub extension: String,
    pub description: String,
}

impl FileTypeFilter {
    pub fn new(extension: impl AsRef<str>, description: impl Into<String>) -> Self {
        Self {
            extension: normalize_extension(extension.as_ref()),
            description: description.into(),
        }
    }

    /// Whether `path` carries this filter's extension
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| normalize_extension(&ext.to_string_lossy()) == self.extension)
            .unwrap_or(false)
    }
}

pub(crate) fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_lowercase()
}

/// A single sensitive-data hit inside a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchInfo {
    /// Pattern that produced the hit
    pub pattern: ScanPattern,
    /// Position of the pattern in the job's pattern list
    pub pattern_id: usize,
    /// Bounded context around the match end
    pub snippet: String,
    /// Byte offset into the extracted content stream
    pub start_offset: u64,
    pub end_offset: u64,
    /// Archive entry the stream belongs to, if the file is an archive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
}

/// Terminal classification of one file
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanResult {
    #[default]
    Undefined,
    Clean,
    Flagged,
    FlaggedButUnwritable,
    UnsupportedType,
    Unreadable,
    DirectoryTooDeep,
}

impl ScanResult {
    /// Sensitive data was found, whether or not it can be remediated
    pub fn is_flagged(self) -> bool {
        matches!(self, ScanResult::Flagged | ScanResult::FlaggedButUnwritable)
    }

    pub fn is_terminal(self) -> bool {
        self != ScanResult::Undefined
    }

    pub fn label(self) -> &'static str {
        match self {
            ScanResult::Undefined => "UNDEFINED",
            ScanResult::Clean => "CLEAN",
            ScanResult::Flagged => "FLAGGED",
            ScanResult::FlaggedButUnwritable => "FLAGGED_BUT_UNWRITABLE",
            ScanResult::UnsupportedType => "UNSUPPORTED_TYPE",
            ScanResult::Unreadable => "UNREADABLE",
            ScanResult::DirectoryTooDeep => "DIRECTORY_TOO_DEEP",
        }
    }
}

impl fmt::Display for ScanResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classification plus the (bounded) list of matches for one file
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ScanOutcome {
    pub result: ScanResult,
    pub matches: Vec<MatchInfo>,
}

impl ScanOutcome {
    /// Outcome with no matches, used for every non-flagged classification
    pub fn of(result: ScanResult) -> Self {
        Self {
            result,
            matches: Vec::new(),
        }
    }

    pub fn clean() -> Self {
        Self::of(ScanResult::Clean)
    }

    pub fn is_flagged(&self) -> bool {
        self.result.is_flagged()
    }
}

/// Input contract of one scan
#[derive(Debug, Clone, Default)]
pub struct ScanJob {
    /// Files to scan, deduplicated
    pub file_paths: BTreeSet<PathBuf>,
    /// Ordered patterns; a pattern's id is its index here
    pub patterns: Vec<ScanPattern>,
    pub file_types: Vec<FileTypeFilter>,
    /// Paths the caller already classified as `DIRECTORY_TOO_DEEP`
    pub too_deep: BTreeSet<PathBuf>,
}

impl ScanJob {
    pub fn new(
        file_paths: impl IntoIterator<Item = PathBuf>,
        patterns: Vec<ScanPattern>,
        file_types: Vec<FileTypeFilter>,
    ) -> Self {
        let mut unique_types: Vec<FileTypeFilter> = Vec::with_capacity(file_types.len());
        for file_type in file_types {
            if !unique_types.iter().any(|t| t.extension == file_type.extension) {
                unique_types.push(file_type);
            }
        }

        Self {
            file_paths: file_paths.into_iter().collect(),
            patterns,
            file_types: unique_types,
            too_deep: BTreeSet::new(),
        }
    }

    /// Record paths that were cut off by the traversal depth limit
    pub fn with_too_deep(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        for path in paths {
            self.file_paths.remove(&path);
            self.too_deep.insert(path);
        }
        self
    }

    /// Whether the file's extension is in the active file-type set
    pub fn accepts_extension(&self, path: &Path) -> bool {
        self.file_types.iter().any(|t| t.matches(path))
    }

    /// Number of entries the result map will hold once the job completes
    pub fn total(&self) -> usize {
        self.file_paths.len() + self.too_deep.len()
    }
}

/// Tunables of the scanning engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    pub chunk_size: usize,
    pub max_matches: usize,
    pub snippet_window: usize,
    /// Trailing bytes of a chunk rescanned with the next one (0 = none)
    pub chunk_overlap: usize,
    /// Worker threads (0 = hardware parallelism)
    pub workers: usize,
    pub max_archive_entry_bytes: u64,
    pub max_archive_depth: usize,
    pub max_depth: usize,
    pub block_size: usize,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_matches: DEFAULT_MAX_MATCHES,
            snippet_window: DEFAULT_SNIPPET_WINDOW,
            chunk_overlap: 0,
            workers: 0,
            max_archive_entry_bytes: DEFAULT_MAX_ARCHIVE_ENTRY_BYTES,
            max_archive_depth: DEFAULT_MAX_ARCHIVE_DEPTH,
            max_depth: DEFAULT_MAX_DEPTH,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl ScanSettings {
    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk size must be greater than zero".to_string());
        }
        if self.max_matches == 0 {
            return Err("max matches must be greater than zero".to_string());
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(format!(
                "chunk overlap ({}) must be smaller than the chunk size ({})",
                self.chunk_overlap, self.chunk_size
            ));
        }
        if self.block_size == 0 {
            return Err("block size must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Lifecycle of a scan job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    #[default]
    Idle,
    Compiling,
    Running,
    Completed,
    Cancelled,
    Failed,
}

/// Files finished so far out of the job total
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanProgress {
    pub processed: usize,
    pub total: usize,
}

impl ScanProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.processed as f64 / self.total as f64
        }
    }
}

/// Statistics from a scanning operation
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub files_total: usize,
    pub clean: usize,
    pub flagged: usize,
    pub flagged_but_unwritable: usize,
    pub unsupported: usize,
    pub unreadable: usize,
    pub too_deep: usize,
    pub total_matches: usize,
    pub workers: usize,
    pub scan_duration_ms: u64,
}

impl ScanStats {
    pub fn record(&mut self, outcome: &ScanOutcome) {
        self.files_total += 1;
        self.total_matches += outcome.matches.len();
        match outcome.result {
            ScanResult::Clean => self.clean += 1,
            ScanResult::Flagged => self.flagged += 1,
            ScanResult::FlaggedButUnwritable => self.flagged_but_unwritable += 1,
            ScanResult::UnsupportedType => self.unsupported += 1,
            ScanResult::Unreadable => self.unreadable += 1,
            ScanResult::DirectoryTooDeep => self.too_deep += 1,
            ScanResult::Undefined => {}
        }
    }
}

/// Output of a scan job
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub state: JobState,
    pub outcomes: BTreeMap<PathBuf, ScanOutcome>,
    pub stats: ScanStats,
}

impl ScanReport {
    /// Files that contain sensitive data and can be shredded
    pub fn deletable_paths(&self) -> Vec<PathBuf> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.result == ScanResult::Flagged)
            .map(|(path, _)| path.clone())
            .collect()
    }

    pub fn has_findings(&self) -> bool {
        self.outcomes.values().any(ScanOutcome::is_flagged)
    }
}
