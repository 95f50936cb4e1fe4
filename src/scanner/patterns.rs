//! Multi-pattern matcher
//!
//! All scan patterns of a job are compiled once into a [`CompiledMatcher`]:
//! a `RegexSet` that tells which patterns hit a chunk, plus one located regex
//! per pattern to find where. The matcher is immutable and shared by every
//! worker; each worker owns a [`Scratch`] for the per-chunk event buffer.

use super::types::ScanPattern;
use regex::bytes::{Regex, RegexBuilder, RegexSet, RegexSetBuilder};
use std::ops::ControlFlow;
use thiserror::Error;

/// Pattern compilation failure; fatal to the whole job
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid scan pattern #{index} `{pattern}` ({description}): {source}")]
    Invalid {
        index: usize,
        pattern: String,
        description: String,
        #[source]
        source: regex::Error,
    },
    #[error("failed to build the multi-pattern matcher: {0}")]
    Set(#[source] regex::Error),
}

/// One hit reported by [`CompiledMatcher::scan`], in chunk-relative bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MatchEvent {
    pub start: usize,
    pub end: usize,
    pub pattern_id: usize,
}

/// Compiled, read-only form of a job's pattern list
#[derive(Debug)]
pub struct CompiledMatcher {
    set: RegexSet,
    regexes: Vec<Regex>,
    patterns: Vec<ScanPattern>,
}

impl CompiledMatcher {
    /// Compile the ordered pattern list; a pattern's id is its index
    pub fn compile(patterns: &[ScanPattern]) -> Result<Self, PatternError> {
        let start_time = std::time::Instant::now();

        // Individual compilation first so an error can name the offending pattern
        let mut regexes = Vec::with_capacity(patterns.len());
        for (index, pattern) in patterns.iter().enumerate() {
            let regex = RegexBuilder::new(&pattern.pattern)
                .unicode(true)
                .build()
                .map_err(|source| PatternError::Invalid {
                    index,
                    pattern: pattern.pattern.clone(),
                    description: pattern.description.clone(),
                    source,
                })?;
            regexes.push(regex);
        }

        let set = RegexSetBuilder::new(patterns.iter().map(|p| p.pattern.as_str()))
            .unicode(true)
            .build()
            .map_err(PatternError::Set)?;

        if patterns.is_empty() {
            tracing::warn!("No scan patterns configured - every readable file will be CLEAN");
        }
        tracing::debug!(
            "Compiled {} scan patterns in {:?}",
            patterns.len(),
            start_time.elapsed()
        );

        Ok(Self {
            set,
            regexes,
            patterns: patterns.to_vec(),
        })
    }

    pub fn len(&self) -> usize {
        self.regexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regexes.is_empty()
    }

    /// Pattern registered under `id`
    pub fn pattern(&self, id: usize) -> Option<&ScanPattern> {
        self.patterns.get(id)
    }

    /// Run the matcher over exactly one chunk
    ///
    /// Events are delivered in `(start, end, pattern_id)` order. Each pattern
    /// reports non-overlapping matches, so a position is reported at most once
    /// per pattern; empty matches are never reported. Returning
    /// `ControlFlow::Break` from `on_match` drops the rest of the chunk's
    /// events and is passed back to the caller.
    pub fn scan<F>(&self, chunk: &[u8], scratch: &mut Scratch, mut on_match: F) -> ControlFlow<()>
    where
        F: FnMut(MatchEvent) -> ControlFlow<()>,
    {
        scratch.events.clear();
        if self.regexes.is_empty() || chunk.is_empty() {
            return ControlFlow::Continue(());
        }

        let hits = self.set.matches(chunk);
        if !hits.matched_any() {
            return ControlFlow::Continue(());
        }

        for pattern_id in hits.iter() {
            for found in self.regexes[pattern_id].find_iter(chunk) {
                if found.start() == found.end() {
                    continue;
                }
                scratch.events.push(MatchEvent {
                    start: found.start(),
                    end: found.end(),
                    pattern_id,
                });
            }
        }
        scratch.events.sort_unstable();

        for event in scratch.events.drain(..) {
            on_match(event)?;
        }
        ControlFlow::Continue(())
    }
}

/// Per-worker scratch space for [`CompiledMatcher::scan`]
///
/// Allocated once per worker thread and reused for every chunk of every
/// file that worker processes. Never shared between threads.
#[derive(Debug, Default)]
pub struct Scratch {
    events: Vec<MatchEvent>,
}

impl Scratch {
    pub fn new(matcher: &CompiledMatcher) -> Self {
        Self {
            events: Vec::with_capacity(matcher.len().max(1) * 8),
        }
    }
}

/// Context around a match end, clipped to the chunk
///
/// Takes up to `window` bytes before and after `end`. Control characters
/// (newlines, tabs) are flattened to spaces so the snippet stays on one line.
pub fn snippet(chunk: &[u8], end: usize, window: usize) -> String {
    let end = end.min(chunk.len());
    let from = end.saturating_sub(window);
    let to = end.saturating_add(window).min(chunk.len());

    String::from_utf8_lossy(&chunk[from..to])
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card_patterns() -> Vec<ScanPattern> {
        vec![
            ScanPattern::new(r"\d{16}", "card number"),
            ScanPattern::new(r"[A-Z]{2}\d{6}", "passport"),
        ]
    }

    fn collect(matcher: &CompiledMatcher, chunk: &[u8]) -> Vec<MatchEvent> {
        let mut scratch = Scratch::new(matcher);
        let mut events = Vec::new();
        let _ = matcher.scan(chunk, &mut scratch, |event| {
            events.push(event);
            ControlFlow::Continue(())
        });
        events
    }

    #[test]
    fn test_compile_reports_offending_pattern() {
        let patterns = vec![
            ScanPattern::new(r"\d{16}", "card number"),
            ScanPattern::new(r"([a-z", "broken"),
        ];
        let err = CompiledMatcher::compile(&patterns).unwrap_err();
        match err {
            PatternError::Invalid { index, ref pattern, .. } => {
                assert_eq!(index, 1);
                assert_eq!(pattern, "([a-z");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_events_are_ordered_by_position() {
        let matcher = CompiledMatcher::compile(&card_patterns()).unwrap();
        let chunk = b"id AB123456 then card 4111111111111111 and XY654321";
        let events = collect(&matcher, chunk);

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].pattern_id, 1);
        assert_eq!(events[1].pattern_id, 0);
        assert_eq!(events[2].pattern_id, 1);
        assert!(events.windows(2).all(|w| w[0].start <= w[1].start));
        assert_eq!(&chunk[events[1].start..events[1].end], b"4111111111111111");
    }

    #[test]
    fn test_break_stops_the_chunk() {
        let matcher = CompiledMatcher::compile(&card_patterns()).unwrap();
        let mut scratch = Scratch::new(&matcher);
        let mut seen = 0;
        let flow = matcher.scan(b"AB123456 CD123456 EF123456", &mut scratch, |_| {
            seen += 1;
            if seen == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert!(flow.is_break());
        assert_eq!(seen, 2);
    }

    #[test]
    fn test_scratch_is_reusable_across_chunks() {
        let matcher = CompiledMatcher::compile(&card_patterns()).unwrap();
        let mut scratch = Scratch::new(&matcher);
        for chunk in [&b"AB123456"[..], b"nothing here", b"4111111111111111"] {
            let mut count = 0;
            let _ = matcher.scan(chunk, &mut scratch, |_| {
                count += 1;
                ControlFlow::Continue(())
            });
            assert!(count <= 1);
        }
    }

    #[test]
    fn test_empty_pattern_list_never_matches() {
        let matcher = CompiledMatcher::compile(&[]).unwrap();
        assert!(matcher.is_empty());
        assert!(collect(&matcher, b"4111111111111111").is_empty());
    }

    #[test]
    fn test_empty_matches_are_ignored() {
        let matcher = CompiledMatcher::compile(&[ScanPattern::new(r"x*", "maybe x")]).unwrap();
        let events = collect(&matcher, b"abc xx def");
        assert_eq!(events.len(), 1);
        assert_eq!((events[0].start, events[0].end), (4, 6));
    }

    #[test]
    fn test_unicode_patterns_match_utf8_text() {
        let matcher =
            CompiledMatcher::compile(&[ScanPattern::new(r"Straße \d+", "street")]).unwrap();
        let events = collect(&matcher, "Adresse: Hauptstraße 12".as_bytes());
        assert!(events.is_empty());
        let events = collect(&matcher, "Adresse: Straße 12".as_bytes());
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_snippet_is_clipped_to_chunk() {
        let chunk = b"card: 4111111111111111 end";
        let end = 22;
        assert_eq!(snippet(chunk, end, 100), "card: 4111111111111111 end");
        assert_eq!(snippet(chunk, end, 4), "1111 end");
        assert_eq!(snippet(b"a\nb", 1, 5), "a b");
    }
}
