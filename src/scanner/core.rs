use super::patterns::{CompiledMatcher, PatternError, Scratch, snippet};
use super::types::{
    JobState, MatchInfo, ScanJob, ScanOutcome, ScanProgress, ScanReport, ScanResult,
    ScanSettings, ScanStats,
};
use crate::extract::{Chunk, ContentExtractor, ExtractError, ExtractorFactory};
use crate::parallel::{ExecutionStrategy, QueueClosed, WorkQueue, WorkerPanic};
use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use thiserror::Error;
use uuid::Uuid;

/// Failures that abort a whole job before any file is touched
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error("invalid scan settings: {0}")]
    Settings(String),
    #[error(transparent)]
    Queue(#[from] QueueClosed),
    #[error(transparent)]
    Worker(#[from] WorkerPanic),
}

/// Cooperative cancellation flag shared with a running job
///
/// Workers check it between files; a file already being scanned always
/// completes and is recorded. A request made before the job starts cancels
/// it before the first file; the flag is cleared when the job ends.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Runs scan jobs end to end
pub struct ScanCoordinator {
    settings: ScanSettings,
    cancel: CancelHandle,
    state: Mutex<JobState>,
}

impl ScanCoordinator {
    pub fn new(settings: ScanSettings) -> Self {
        Self {
            settings,
            cancel: CancelHandle::default(),
            state: Mutex::new(JobState::Idle),
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn state(&self) -> JobState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, state: JobState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    /// Run `job` to completion or cancellation
    ///
    /// `progress` is called after every finished file. Only invalid settings,
    /// pattern compilation failures and worker panics are errors; every
    /// per-file problem ends up as a [`ScanResult`] in the report.
    pub fn run<P>(&self, job: ScanJob, progress: Option<P>) -> Result<ScanReport, ScanError>
    where
        P: Fn(ScanProgress) + Send + Sync,
    {
        let job_id = Uuid::new_v4();
        let span = tracing::info_span!("scan_job", id = %job_id);
        let _enter = span.enter();
        let start_time = Instant::now();

        if let Err(message) = self.settings.validate() {
            self.set_state(JobState::Failed);
            tracing::error!("Refusing to start scan: {}", message);
            return Err(ScanError::Settings(message));
        }

        self.set_state(JobState::Compiling);
        let matcher = match CompiledMatcher::compile(&job.patterns) {
            Ok(matcher) => matcher,
            Err(e) => {
                self.set_state(JobState::Failed);
                tracing::error!("Pattern compilation failed: {}", e);
                return Err(e.into());
            }
        };

        self.set_state(JobState::Running);
        let total = job.total();
        let mut outcomes = BTreeMap::new();
        for path in &job.too_deep {
            outcomes.insert(path.clone(), ScanOutcome::of(ScanResult::DirectoryTooDeep));
        }
        let processed = AtomicUsize::new(outcomes.len());

        let queue = WorkQueue::new();
        for path in &job.file_paths {
            queue.push(path.clone())?;
        }
        queue.mark_done();

        let strategy = ExecutionStrategy::for_workload(self.settings.workers, job.file_paths.len());
        tracing::info!(
            "Scanning {} files with {} patterns using {} workers",
            job.file_paths.len(),
            matcher.len(),
            strategy.workers()
        );

        let scanner = FileScanner::new(&matcher, &self.settings, &job);
        let results = Mutex::new(outcomes);

        let run_result = strategy.run(|worker_id| {
            let mut scratch = Scratch::new(&matcher);
            let mut buf = vec![0u8; self.settings.chunk_size];

            loop {
                if self.cancel.is_cancelled() {
                    tracing::debug!("Worker {} stopping: scan cancelled", worker_id);
                    break;
                }
                let Some(path) = queue.pop() else {
                    break;
                };

                let outcome = scanner.scan_file(&path, &mut scratch, &mut buf);
                tracing::debug!(
                    "[worker-{}] {} -> {} ({} matches)",
                    worker_id,
                    path.display(),
                    outcome.result,
                    outcome.matches.len()
                );
                results
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .insert(path, outcome);

                let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(report) = &progress {
                    report(ScanProgress {
                        processed: done,
                        total,
                    });
                }
            }
        });
        // Workers are joined; a cancel request only ever applies to the job it interrupted
        self.cancel.reset();
        if let Err(e) = run_result {
            self.set_state(JobState::Failed);
            tracing::error!("Scan aborted: {}", e);
            return Err(e.into());
        }

        let outcomes = results.into_inner().unwrap_or_else(|e| e.into_inner());
        let state = if outcomes.len() < total {
            JobState::Cancelled
        } else {
            JobState::Completed
        };
        self.set_state(state);

        let mut stats = ScanStats::default();
        for outcome in outcomes.values() {
            stats.record(outcome);
        }
        stats.workers = strategy.workers();
        stats.scan_duration_ms = start_time.elapsed().as_millis() as u64;

        tracing::info!(
            "Scan {:?}: {}/{} files, {} flagged, {} matches in {}ms",
            state,
            outcomes.len(),
            total,
            stats.flagged + stats.flagged_but_unwritable,
            stats.total_matches,
            stats.scan_duration_ms
        );

        Ok(ScanReport {
            state,
            outcomes,
            stats,
        })
    }
}

/// Per-file scanning logic shared by all workers of one job
pub struct FileScanner<'a> {
    matcher: &'a CompiledMatcher,
    settings: &'a ScanSettings,
    job: &'a ScanJob,
    factory: ExtractorFactory,
}

impl<'a> FileScanner<'a> {
    pub fn new(matcher: &'a CompiledMatcher, settings: &'a ScanSettings, job: &'a ScanJob) -> Self {
        Self {
            matcher,
            settings,
            job,
            factory: ExtractorFactory::from_settings(settings),
        }
    }

    /// Classify one file; never fails
    ///
    /// `buf` is the worker's chunk buffer and must hold `chunk_size` bytes.
    pub fn scan_file(&self, path: &Path, scratch: &mut Scratch, buf: &mut [u8]) -> ScanOutcome {
        if !self.job.accepts_extension(path) {
            return ScanOutcome::of(ScanResult::UnsupportedType);
        }

        let mut extractor = match self.factory.open(path) {
            Ok(Some(extractor)) => extractor,
            Ok(None) => {
                tracing::debug!("Unsupported content type: {}", path.display());
                return ScanOutcome::of(ScanResult::UnsupportedType);
            }
            Err(e) => {
                tracing::debug!("Cannot open {}: {}", path.display(), e);
                return ScanOutcome::of(ScanResult::Unreadable);
            }
        };

        let mut matches = Vec::new();
        if let Err(e) = self.scan_stream(&mut extractor, scratch, buf, &mut matches) {
            if matches.is_empty() {
                tracing::warn!("Failed reading {}: {}", path.display(), e);
                return ScanOutcome::of(ScanResult::Unreadable);
            }
            tracing::warn!(
                "Failed reading {} after {} matches, keeping it flagged: {}",
                path.display(),
                matches.len(),
                e
            );
        }

        if matches.is_empty() {
            return ScanOutcome::clean();
        }
        let result = if is_writable(path) {
            ScanResult::Flagged
        } else {
            ScanResult::FlaggedButUnwritable
        };
        ScanOutcome { result, matches }
    }

    /// Pull every chunk of the extractor through the matcher
    ///
    /// With a chunk overlap of `k`, the last `k` bytes of each chunk are kept
    /// at the front of the buffer and rescanned with the next read; only
    /// matches ending in the freshly read bytes are recorded. A match that
    /// starts inside the previously recorded match of the same pattern
    /// extends that match instead of adding a second one.
    fn scan_stream(
        &self,
        extractor: &mut ContentExtractor,
        scratch: &mut Scratch,
        buf: &mut [u8],
        matches: &mut Vec<MatchInfo>,
    ) -> Result<(), ExtractError> {
        let max_matches = self.settings.max_matches;
        let overlap = self.settings.chunk_overlap;
        let window = self.settings.snippet_window;

        let mut entry: Option<String> = None;
        // Stream offset of buf[0]
        let mut base: u64 = 0;
        let mut carry = 0usize;
        // Per pattern: index into `matches` of the last match recorded in this stream
        let mut last_recorded: Vec<Option<usize>> = vec![None; self.matcher.len()];

        loop {
            let filled = match extractor.read_chunk(&mut buf[carry..])? {
                Chunk::Filled(n) => n,
                Chunk::NextEntry => {
                    entry = extractor.current_entry();
                    base = 0;
                    carry = 0;
                    last_recorded.fill(None);
                    continue;
                }
                Chunk::Exhausted => return Ok(()),
            };
            let len = carry + filled;
            let chunk = &buf[..len];

            let flow = self.matcher.scan(chunk, scratch, |event| {
                if event.end <= carry {
                    return ControlFlow::Continue(());
                }
                let Some(pattern) = self.matcher.pattern(event.pattern_id) else {
                    return ControlFlow::Continue(());
                };
                let start_offset = base + event.start as u64;
                let end_offset = base + event.end as u64;
                if let Some(index) = last_recorded[event.pattern_id] {
                    let previous = &mut matches[index];
                    if start_offset < previous.end_offset {
                        // Same match seen again with more input behind it
                        if start_offset == previous.start_offset && end_offset > previous.end_offset {
                            previous.end_offset = end_offset;
                            previous.snippet = snippet(chunk, event.end, window);
                        }
                        return ControlFlow::Continue(());
                    }
                }
                last_recorded[event.pattern_id] = Some(matches.len());
                matches.push(MatchInfo {
                    pattern: pattern.clone(),
                    pattern_id: event.pattern_id,
                    snippet: snippet(chunk, event.end, window),
                    start_offset,
                    end_offset,
                    entry: entry.clone(),
                });
                if matches.len() >= max_matches {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            });
            if flow.is_break() {
                return Ok(());
            }

            let keep = overlap.min(len);
            buf.copy_within(len - keep..len, 0);
            base += (len - keep) as u64;
            carry = keep;
        }
    }
}

/// Whether this process may write the file, asked of the OS without opening it
///
/// Checks the effective user and groups, so ownership and root count the
/// same way they would for the eventual overwrite.
#[cfg(unix)]
fn is_writable(path: &Path) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    let result =
        unsafe { libc::faccessat(libc::AT_FDCWD, c_path.as_ptr(), libc::W_OK, libc::AT_EACCESS) };
    result == 0
}

#[cfg(not(unix))]
fn is_writable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|metadata| !metadata.permissions().readonly())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::test_support::{pdf_bytes, zip_bytes};
    use crate::scanner::types::{FileTypeFilter, ScanPattern};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn card_patterns() -> Vec<ScanPattern> {
        vec![ScanPattern::new(r"\d{16}", "card number")]
    }

    fn file_types(extensions: &[&str]) -> Vec<FileTypeFilter> {
        extensions
            .iter()
            .map(|ext| FileTypeFilter::new(ext, format!("{ext} file")))
            .collect()
    }

    fn settings(workers: usize) -> ScanSettings {
        ScanSettings {
            workers,
            ..ScanSettings::default()
        }
    }

    fn run(job: ScanJob, settings: ScanSettings) -> ScanReport {
        ScanCoordinator::new(settings)
            .run(job, None::<fn(ScanProgress)>)
            .unwrap()
    }

    fn write(dir: &Path, name: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// Whether permission bits are enforced for this process (not root)
    fn permissions_enforced(dir: &Path) -> bool {
        use std::os::unix::fs::PermissionsExt;
        let probe = write(dir, "probe", "x");
        fs::set_permissions(&probe, fs::Permissions::from_mode(0o000)).unwrap();
        let enforced = fs::File::open(&probe).is_err();
        fs::set_permissions(&probe, fs::Permissions::from_mode(0o644)).unwrap();
        enforced
    }

    #[test]
    fn test_card_number_is_flagged() {
        let temp_dir = TempDir::new().unwrap();
        let path = write(temp_dir.path(), "note.txt", "card: 4111111111111111 end");

        let job = ScanJob::new(vec![path.clone()], card_patterns(), file_types(&[".txt"]));
        let report = run(job, settings(0));

        assert_eq!(report.state, JobState::Completed);
        let outcome = &report.outcomes[&path];
        assert_eq!(outcome.result, ScanResult::Flagged);
        assert_eq!(outcome.matches.len(), 1);
        let found = &outcome.matches[0];
        assert!(found.snippet.contains("4111111111111111"));
        assert_eq!((found.start_offset, found.end_offset), (6, 22));
        assert_eq!(found.pattern.description, "card number");
        assert_eq!(found.entry, None);
    }

    #[test]
    fn test_unsupported_extension_is_never_opened() {
        let temp_dir = TempDir::new().unwrap();
        // Does not exist: opening it would make it UNREADABLE
        let path = temp_dir.path().join("dump.bin");

        let job = ScanJob::new(vec![path.clone()], card_patterns(), file_types(&["txt"]));
        let report = run(job, settings(0));

        assert_eq!(report.outcomes[&path].result, ScanResult::UnsupportedType);
        assert!(report.outcomes[&path].matches.is_empty());
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gone.txt");

        let job = ScanJob::new(vec![path.clone()], card_patterns(), file_types(&["txt"]));
        let report = run(job, settings(0));
        assert_eq!(report.outcomes[&path].result, ScanResult::Unreadable);
    }

    #[test]
    fn test_unreadable_file() {
        use std::os::unix::fs::PermissionsExt;
        let temp_dir = TempDir::new().unwrap();
        if !permissions_enforced(temp_dir.path()) {
            eprintln!("skipping: permission bits are not enforced for this user");
            return;
        }
        let path = write(temp_dir.path(), "locked.txt", "4111111111111111");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o000)).unwrap();

        let job = ScanJob::new(vec![path.clone()], card_patterns(), file_types(&["txt"]));
        let report = run(job, settings(0));
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        assert_eq!(report.outcomes[&path].result, ScanResult::Unreadable);
    }

    #[test]
    fn test_read_only_match_is_flagged_but_unwritable() {
        let temp_dir = TempDir::new().unwrap();
        if !permissions_enforced(temp_dir.path()) {
            eprintln!("skipping: permission bits are not enforced for this user");
            return;
        }
        let path = write(temp_dir.path(), "ro.txt", "4111111111111111");
        let mut permissions = fs::metadata(&path).unwrap().permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&path, permissions).unwrap();

        let job = ScanJob::new(vec![path.clone()], card_patterns(), file_types(&["txt"]));
        let report = run(job, settings(0));

        let outcome = &report.outcomes[&path];
        assert_eq!(outcome.result, ScanResult::FlaggedButUnwritable);
        assert_eq!(outcome.matches.len(), 1);
        assert!(report.deletable_paths().is_empty());
    }

    #[test]
    fn test_read_only_bit_does_not_stop_privileged_user() {
        let temp_dir = TempDir::new().unwrap();
        if permissions_enforced(temp_dir.path()) {
            eprintln!("skipping: needs a user that bypasses permission bits");
            return;
        }
        let path = write(temp_dir.path(), "ro.txt", "4111111111111111");
        let mut permissions = fs::metadata(&path).unwrap().permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&path, permissions).unwrap();

        let job = ScanJob::new(vec![path.clone()], card_patterns(), file_types(&["txt"]));
        let report = run(job, settings(0));

        assert_eq!(report.outcomes[&path].result, ScanResult::Flagged);
        assert_eq!(report.deletable_paths(), vec![path]);
    }

    #[test]
    fn test_writability_follows_file_ownership() {
        let temp_dir = TempDir::new().unwrap();
        let own = write(temp_dir.path(), "own.txt", "x");
        assert!(is_writable(&own));
        assert!(!is_writable(&temp_dir.path().join("missing.txt")));

        // World-readable but owned by root with mode 0644
        let foreign = Path::new("/etc/passwd");
        if !permissions_enforced(temp_dir.path()) || !foreign.exists() {
            eprintln!("skipping foreign-owner check: needs a non-root user and /etc/passwd");
            return;
        }
        assert!(fs::File::open(foreign).is_ok());
        assert!(!is_writable(foreign));
    }

    #[test]
    fn test_archive_offsets_are_entry_relative() {
        let temp_dir = TempDir::new().unwrap();
        let zip = zip_bytes(&[
            ("readme.txt", b"nothing to see here, move along please"),
            ("cards.txt", b"id 4111111111111111"),
        ]);
        let path = write(temp_dir.path(), "bundle.zip", zip);

        let job = ScanJob::new(vec![path.clone()], card_patterns(), file_types(&["zip"]));
        let report = run(job, settings(0));

        let outcome = &report.outcomes[&path];
        assert_eq!(outcome.result, ScanResult::Flagged);
        assert_eq!(outcome.matches.len(), 1);
        let found = &outcome.matches[0];
        assert_eq!(found.entry.as_deref(), Some("cards.txt"));
        assert_eq!((found.start_offset, found.end_offset), (3, 19));
    }

    #[test]
    fn test_pdf_content_is_scanned() {
        let temp_dir = TempDir::new().unwrap();
        let path = write(
            temp_dir.path(),
            "statement.pdf",
            pdf_bytes(&["cover page", "card 4111111111111111"]),
        );

        let job = ScanJob::new(vec![path.clone()], card_patterns(), file_types(&["pdf"]));
        let report = run(job, settings(0));
        assert_eq!(report.outcomes[&path].result, ScanResult::Flagged);
    }

    #[test]
    fn test_binary_content_is_unsupported() {
        let temp_dir = TempDir::new().unwrap();
        let path = write(temp_dir.path(), "image.txt", [0u8, 1, 2, 3, 0, 0, 255, 0]);

        let job = ScanJob::new(vec![path.clone()], card_patterns(), file_types(&["txt"]));
        let report = run(job, settings(0));
        assert_eq!(report.outcomes[&path].result, ScanResult::UnsupportedType);
    }

    #[test]
    fn test_matches_are_capped() {
        let temp_dir = TempDir::new().unwrap();
        let content = "4111111111111111\n".repeat(500);
        let path = write(temp_dir.path(), "many.txt", content);

        let job = ScanJob::new(vec![path.clone()], card_patterns(), file_types(&["txt"]));
        let report = run(
            job,
            ScanSettings {
                max_matches: 7,
                ..ScanSettings::default()
            },
        );

        let outcome = &report.outcomes[&path];
        assert_eq!(outcome.result, ScanResult::Flagged);
        assert_eq!(outcome.matches.len(), 7);
        assert!(
            outcome
                .matches
                .windows(2)
                .all(|w| w[0].start_offset < w[1].start_offset)
        );
    }

    #[test]
    fn test_offsets_span_chunks() {
        let temp_dir = TempDir::new().unwrap();
        let mut content = vec![b'.'; 100];
        content.extend_from_slice(b"4111111111111111");
        let path = write(temp_dir.path(), "far.txt", content);

        let job = ScanJob::new(vec![path.clone()], card_patterns(), file_types(&["txt"]));
        let report = run(
            job,
            ScanSettings {
                chunk_size: 32,
                ..ScanSettings::default()
            },
        );

        // 100 = 3 * 32 + 4, so the number sits inside the fourth chunk
        let found = &report.outcomes[&path].matches[0];
        assert_eq!((found.start_offset, found.end_offset), (100, 116));
    }

    #[test]
    fn test_chunk_boundary_overlap() {
        let temp_dir = TempDir::new().unwrap();
        let mut content = vec![b'.'; 24];
        content.extend_from_slice(b"4111111111111111");
        content.extend_from_slice(&[b'.'; 24]);
        let path = write(temp_dir.path(), "straddle.txt", content);
        let job = ScanJob::new(vec![path.clone()], card_patterns(), file_types(&["txt"]));

        // Without overlap the number is split across the first two chunks
        let report = run(
            job.clone(),
            ScanSettings {
                chunk_size: 32,
                ..ScanSettings::default()
            },
        );
        assert_eq!(report.outcomes[&path].result, ScanResult::Clean);

        let report = run(
            job,
            ScanSettings {
                chunk_size: 32,
                chunk_overlap: 16,
                ..ScanSettings::default()
            },
        );
        let outcome = &report.outcomes[&path];
        assert_eq!(outcome.result, ScanResult::Flagged);
        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(
            (outcome.matches[0].start_offset, outcome.matches[0].end_offset),
            (24, 40)
        );
    }

    #[test]
    fn test_overlap_reports_growing_match_once() {
        let temp_dir = TempDir::new().unwrap();
        let mut content = vec![b'.'; 20];
        content.extend_from_slice(&[b'7'; 20]);
        content.extend_from_slice(&[b'.'; 20]);
        let path = write(temp_dir.path(), "digits.txt", content);
        let job = ScanJob::new(
            vec![path.clone()],
            vec![ScanPattern::new(r"\d+", "digit run")],
            file_types(&["txt"]),
        );

        let report = run(
            job,
            ScanSettings {
                chunk_size: 32,
                chunk_overlap: 16,
                ..ScanSettings::default()
            },
        );

        let spans: Vec<_> = report.outcomes[&path]
            .matches
            .iter()
            .map(|m| (m.start_offset, m.end_offset))
            .collect();
        assert_eq!(spans, vec![(20, 40)]);
    }

    #[test]
    fn test_overlap_keeps_separate_matches_of_one_pattern() {
        let temp_dir = TempDir::new().unwrap();
        // Runs at 10..14 and 30..34 land in overlapping windows
        let mut content = vec![b'.'; 48];
        content[10..14].copy_from_slice(b"1234");
        content[30..34].copy_from_slice(b"5678");
        let path = write(temp_dir.path(), "runs.txt", content);
        let job = ScanJob::new(
            vec![path.clone()],
            vec![ScanPattern::new(r"\d+", "digit run")],
            file_types(&["txt"]),
        );

        let report = run(
            job,
            ScanSettings {
                chunk_size: 32,
                chunk_overlap: 16,
                ..ScanSettings::default()
            },
        );

        let spans: Vec<_> = report.outcomes[&path]
            .matches
            .iter()
            .map(|m| (m.start_offset, m.end_offset))
            .collect();
        assert_eq!(spans, vec![(10, 14), (30, 34)]);
    }

    #[test]
    fn test_worker_count_does_not_change_results() {
        let temp_dir = TempDir::new().unwrap();
        let mut paths = Vec::new();
        for i in 0..40 {
            let content = if i % 3 == 0 {
                format!("file {i} card 41111111111111{i:02}")
            } else {
                format!("file {i} is clean")
            };
            let name = if i % 7 == 0 {
                format!("f{i}.bin")
            } else {
                format!("f{i}.txt")
            };
            paths.push(write(temp_dir.path(), &name, content));
        }
        paths.push(write(
            temp_dir.path(),
            "bundle.zip",
            zip_bytes(&[("a.txt", b"4111111111111111"), ("b.txt", b"ok")]),
        ));

        let job = ScanJob::new(paths.clone(), card_patterns(), file_types(&["txt", "zip"]));
        let sequential = run(job.clone(), settings(1));
        let parallel = run(job, settings(8));

        assert_eq!(sequential.outcomes, parallel.outcomes);
        assert_eq!(sequential.outcomes.len(), paths.len());
        assert_eq!(sequential.stats.workers, 1);
        assert_eq!(parallel.stats.workers, 8);
    }

    #[test]
    fn test_invalid_pattern_fails_before_any_io() {
        let coordinator = ScanCoordinator::new(ScanSettings::default());
        let job = ScanJob::new(
            vec![PathBuf::from("/definitely/not/here.txt")],
            vec![ScanPattern::new("([", "broken")],
            file_types(&["txt"]),
        );

        let result = coordinator.run(job, None::<fn(ScanProgress)>);
        assert!(matches!(result, Err(ScanError::Pattern(_))));
        assert_eq!(coordinator.state(), JobState::Failed);
    }

    #[test]
    fn test_invalid_settings_fail_the_job() {
        let coordinator = ScanCoordinator::new(ScanSettings {
            chunk_overlap: 4096,
            ..ScanSettings::default()
        });
        let result = coordinator.run(ScanJob::default(), None::<fn(ScanProgress)>);
        assert!(matches!(result, Err(ScanError::Settings(_))));
    }

    #[test]
    fn test_empty_pattern_list_marks_files_clean() {
        let temp_dir = TempDir::new().unwrap();
        let path = write(temp_dir.path(), "a.txt", "4111111111111111");
        let job = ScanJob::new(vec![path.clone()], Vec::new(), file_types(&["txt"]));
        let report = run(job, settings(0));
        assert_eq!(report.outcomes[&path].result, ScanResult::Clean);
    }

    #[test]
    fn test_too_deep_paths_are_recorded() {
        let temp_dir = TempDir::new().unwrap();
        let path = write(temp_dir.path(), "a.txt", "clean");
        let deep = temp_dir.path().join("deep");

        let job = ScanJob::new(vec![path.clone()], card_patterns(), file_types(&["txt"]))
            .with_too_deep(vec![deep.clone()]);
        let report = run(job, settings(0));

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[&deep].result, ScanResult::DirectoryTooDeep);
        assert_eq!(report.stats.too_deep, 1);
    }

    #[test]
    fn test_progress_reaches_total() {
        let temp_dir = TempDir::new().unwrap();
        let paths: Vec<_> = (0..10)
            .map(|i| write(temp_dir.path(), &format!("{i}.txt"), "text"))
            .collect();
        let job = ScanJob::new(paths, card_patterns(), file_types(&["txt"]));

        let seen = Mutex::new(Vec::new());
        let report = ScanCoordinator::new(settings(4))
            .run(
                job,
                Some(|progress: ScanProgress| seen.lock().unwrap().push(progress)),
            )
            .unwrap();

        let seen = seen.into_inner().unwrap();
        assert_eq!(report.state, JobState::Completed);
        assert_eq!(seen.len(), 10);
        assert!(seen.iter().all(|p| p.total == 10));
        assert_eq!(seen.iter().map(|p| p.processed).max(), Some(10));
    }

    #[test]
    fn test_cancellation_keeps_finished_files_only() {
        let temp_dir = TempDir::new().unwrap();
        let paths: Vec<_> = (0..20)
            .map(|i| write(temp_dir.path(), &format!("{i}.txt"), "text"))
            .collect();
        let job = ScanJob::new(paths, card_patterns(), file_types(&["txt"]));

        let coordinator = ScanCoordinator::new(settings(1));
        let cancel = coordinator.cancel_handle();
        let report = coordinator
            .run(
                job,
                Some(move |progress: ScanProgress| {
                    if progress.processed == 5 {
                        cancel.cancel();
                    }
                }),
            )
            .unwrap();

        assert_eq!(report.state, JobState::Cancelled);
        assert_eq!(report.outcomes.len(), 5);
        assert!(report.outcomes.values().all(|o| o.result == ScanResult::Clean));
        assert_eq!(coordinator.state(), JobState::Cancelled);
    }

    #[test]
    fn test_cancel_before_start_is_honoured_once() {
        let temp_dir = TempDir::new().unwrap();
        let paths: Vec<_> = (0..3)
            .map(|i| write(temp_dir.path(), &format!("{i}.txt"), "text"))
            .collect();
        let job = ScanJob::new(paths, card_patterns(), file_types(&["txt"]));

        let coordinator = ScanCoordinator::new(settings(1));
        coordinator.cancel_handle().cancel();
        let report = coordinator.run(job.clone(), None::<fn(ScanProgress)>).unwrap();
        assert_eq!(report.state, JobState::Cancelled);
        assert!(report.outcomes.is_empty());
        assert!(!coordinator.cancel_handle().is_cancelled());

        let report = coordinator.run(job, None::<fn(ScanProgress)>).unwrap();
        assert_eq!(report.state, JobState::Completed);
        assert_eq!(report.outcomes.len(), 3);
    }
}
