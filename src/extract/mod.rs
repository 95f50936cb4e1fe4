//! Format-agnostic content extraction
//!
//! A [`ContentExtractor`] pulls successive bounded chunks of *textual content*
//! out of one file, whatever its format. The closed set of formats is:
//!
//! ```text
//! ┌──────────────┬──────────────────────────────────────────────────────┐
//! │ PlainText    │ raw bytes, chunked straight from the byte cursor     │
//! │ Paginated    │ PDF page text, one or more whole pages per chunk     │
//! │ Archive      │ ZIP entries, each handed to a nested extractor       │
//! │ Markup       │ XML text/CDATA nodes in depth-first document order   │
//! └──────────────┴──────────────────────────────────────────────────────┘
//! ```
//!
//! The [`ExtractorFactory`] sniffs content (not the file name) to pick the
//! variant, so the same factory also classifies archive entries held in memory.

mod archive;
mod markup;
mod paginated;
mod plain;
pub mod sniff;

pub use archive::Archive;
pub use markup::Markup;
pub use paginated::Paginated;
pub use plain::PlainText;
pub use sniff::ContentKind;

use crate::scanner::types::ScanSettings;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek};
use std::path::Path;
use thiserror::Error;

/// Anything an extractor can pull bytes from
pub trait Source: Read + Seek + Send {}

impl<T: Read + Seek + Send> Source for T {}

pub(crate) type BoxedSource = Box<dyn Source>;

/// Failure to build or drive an extractor
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("corrupt PDF document: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("PDF document is encrypted")]
    Encrypted,
    #[error("corrupt archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("malformed XML: {0}")]
    Markup(#[from] quick_xml::Error),
}

/// Result of one [`ContentExtractor::read_chunk`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunk {
    /// `n >= 1` bytes were written to the front of the buffer
    Filled(usize),
    /// A new archive entry starts; keep reading, offsets restart at zero
    NextEntry,
    /// No more content
    Exhausted,
}

/// One file's content stream
pub enum ContentExtractor {
    PlainText(PlainText),
    Paginated(Paginated),
    Archive(Box<Archive>),
    Markup(Markup),
}

impl ContentExtractor {
    /// Fill `buf` with the next chunk of extracted content
    ///
    /// At most `buf.len()` bytes are produced; `buf` must not be empty.
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> Result<Chunk, ExtractError> {
        if buf.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty chunk buffer").into());
        }
        match self {
            ContentExtractor::PlainText(extractor) => extractor.read_chunk(buf),
            ContentExtractor::Paginated(extractor) => extractor.read_chunk(buf),
            ContentExtractor::Archive(extractor) => extractor.read_chunk(buf),
            ContentExtractor::Markup(extractor) => extractor.read_chunk(buf),
        }
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            ContentExtractor::PlainText(_) => ContentKind::PlainText,
            ContentExtractor::Paginated(_) => ContentKind::Paginated,
            ContentExtractor::Archive(_) => ContentKind::Archive,
            ContentExtractor::Markup(_) => ContentKind::Markup,
        }
    }

    /// Name of the archive entry currently being read (`outer/inner` when nested)
    pub fn current_entry(&self) -> Option<String> {
        match self {
            ContentExtractor::Archive(extractor) => extractor.current_entry(),
            _ => None,
        }
    }
}

/// Picks and builds the right [`ContentExtractor`] for a file or buffer
#[derive(Debug, Clone, Copy)]
pub struct ExtractorFactory {
    max_entry_bytes: u64,
    max_archive_depth: usize,
}

impl ExtractorFactory {
    pub fn new(max_entry_bytes: u64, max_archive_depth: usize) -> Self {
        Self {
            max_entry_bytes,
            max_archive_depth,
        }
    }

    pub fn from_settings(settings: &ScanSettings) -> Self {
        Self::new(settings.max_archive_entry_bytes, settings.max_archive_depth)
    }

    /// Open `path` and build an extractor for its sniffed content type
    ///
    /// `Ok(None)` means the content type is not supported.
    pub fn open(&self, path: &Path) -> Result<Option<ContentExtractor>, ExtractError> {
        let file = File::open(path)?;
        self.from_source(Box::new(file), 0)
    }

    /// Build an extractor over bytes already in memory (archive entries)
    pub fn from_bytes(
        &self,
        bytes: Vec<u8>,
        depth: usize,
    ) -> Result<Option<ContentExtractor>, ExtractError> {
        self.from_source(Box::new(Cursor::new(bytes)), depth)
    }

    fn from_source(
        &self,
        mut source: BoxedSource,
        depth: usize,
    ) -> Result<Option<ContentExtractor>, ExtractError> {
        let kind = sniff::detect(&mut source)?;
        tracing::trace!("Sniffed content type {:?} at archive depth {}", kind, depth);

        let extractor = match kind {
            ContentKind::PlainText => ContentExtractor::PlainText(PlainText::new(source)),
            ContentKind::Paginated => ContentExtractor::Paginated(Paginated::new(source)?),
            ContentKind::Markup => ContentExtractor::Markup(Markup::new(source)),
            ContentKind::Archive => {
                if depth >= self.max_archive_depth {
                    tracing::warn!(
                        "Archive nested deeper than {} levels, not descending",
                        self.max_archive_depth
                    );
                    return Ok(None);
                }
                ContentExtractor::Archive(Box::new(Archive::new(source, *self, depth + 1)?))
            }
            ContentKind::Unsupported => return Ok(None),
        };
        Ok(Some(extractor))
    }

    pub(crate) fn max_entry_bytes(&self) -> u64 {
        self.max_entry_bytes
    }
}

/// Bytes of a unit that did not fit in one whole chunk
#[derive(Debug, Default)]
struct Spill {
    data: Vec<u8>,
    pos: usize,
}

impl Spill {
    fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn set(&mut self, data: Vec<u8>) {
        self.data = data;
        self.pos = 0;
    }

    fn drain_into(&mut self, buf: &mut [u8]) -> usize {
        let n = (self.data.len() - self.pos.min(self.data.len())).min(buf.len());
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        n
    }
}

/// Packs atomic text units (pages, XML nodes) into chunks
///
/// A unit is never split across chunks unless it is larger than a whole
/// chunk on its own, in which case it is spilled over consecutive chunks.
#[derive(Debug, Default)]
struct UnitPacker {
    held: Option<Vec<u8>>,
    spill: Spill,
}

impl UnitPacker {
    fn fill<F>(&mut self, buf: &mut [u8], mut next_unit: F) -> Result<Chunk, ExtractError>
    where
        F: FnMut() -> Result<Option<Vec<u8>>, ExtractError>,
    {
        let mut filled = self.spill.drain_into(buf);
        if !self.spill.is_empty() {
            return Ok(Chunk::Filled(filled));
        }

        loop {
            let unit = match self.held.take() {
                Some(unit) => unit,
                None => match next_unit()? {
                    Some(unit) => unit,
                    None => break,
                },
            };
            if unit.is_empty() {
                continue;
            }

            if filled + unit.len() <= buf.len() {
                buf[filled..filled + unit.len()].copy_from_slice(&unit);
                filled += unit.len();
                continue;
            }

            if filled == 0 {
                self.spill.set(unit);
                filled = self.spill.drain_into(buf);
            } else {
                self.held = Some(unit);
            }
            break;
        }

        Ok(if filled == 0 {
            Chunk::Exhausted
        } else {
            Chunk::Filled(filled)
        })
    }
}

/// Drain an extractor into one string per stream (test helper)
#[cfg(test)]
pub(crate) fn read_all(extractor: &mut ContentExtractor, chunk_size: usize) -> Vec<(Option<String>, Vec<u8>)> {
    let mut buf = vec![0u8; chunk_size];
    let mut streams: Vec<(Option<String>, Vec<u8>)> = vec![(None, Vec::new())];
    loop {
        match extractor.read_chunk(&mut buf).unwrap() {
            Chunk::Filled(n) => {
                assert!(n >= 1 && n <= chunk_size);
                if let Some(last) = streams.last_mut() {
                    last.1.extend_from_slice(&buf[..n]);
                }
            }
            Chunk::NextEntry => streams.push((extractor.current_entry(), Vec::new())),
            Chunk::Exhausted => break,
        }
    }
    streams.retain(|(name, data)| name.is_some() || !data.is_empty());
    streams
}
