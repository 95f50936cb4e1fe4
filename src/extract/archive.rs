use super::{BoxedSource, Chunk, ContentExtractor, ContentKind, ExtractError, ExtractorFactory};
use std::io::Read;
use zip::ZipArchive;

/// ZIP-style container
///
/// Each file entry is sniffed and handed to its own extractor. Entries are
/// separate streams: a [`Chunk::NextEntry`] marks the start of each one so
/// the caller can restart offsets. Directories, unsupported entries and
/// entries larger than the configured cap are skipped.
pub struct Archive {
    zip: ZipArchive<BoxedSource>,
    factory: ExtractorFactory,
    depth: usize,
    next_index: usize,
    current: Option<(String, ContentExtractor)>,
}

impl Archive {
    pub(crate) fn new(
        source: BoxedSource,
        factory: ExtractorFactory,
        depth: usize,
    ) -> Result<Self, ExtractError> {
        let zip = ZipArchive::new(source)?;
        tracing::trace!("Opened archive with {} entries at depth {}", zip.len(), depth);
        Ok(Self {
            zip,
            factory,
            depth,
            next_index: 0,
            current: None,
        })
    }

    pub fn current_entry(&self) -> Option<String> {
        let (name, extractor) = self.current.as_ref()?;
        match extractor.current_entry() {
            Some(inner) => Some(format!("{name}/{inner}")),
            None => Some(name.clone()),
        }
    }

    pub(crate) fn read_chunk(&mut self, buf: &mut [u8]) -> Result<Chunk, ExtractError> {
        loop {
            if let Some((name, extractor)) = self.current.as_mut() {
                match extractor.read_chunk(buf) {
                    Ok(Chunk::Exhausted) => self.current = None,
                    Ok(chunk) => return Ok(chunk),
                    Err(e) => {
                        tracing::warn!("Abandoning archive entry '{}': {}", name, e);
                        self.current = None;
                    }
                }
            }

            let Some((name, extractor)) = self.open_next_entry() else {
                return Ok(Chunk::Exhausted);
            };
            let nested = extractor.kind() == ContentKind::Archive;
            self.current = Some((name, extractor));
            // A nested archive announces its own entries
            if !nested {
                return Ok(Chunk::NextEntry);
            }
        }
    }

    fn open_next_entry(&mut self) -> Option<(String, ContentExtractor)> {
        let factory = self.factory;
        let limit = factory.max_entry_bytes();

        while self.next_index < self.zip.len() {
            let index = self.next_index;
            self.next_index += 1;

            let mut entry = match self.zip.by_index(index) {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable archive entry #{}: {}", index, e);
                    continue;
                }
            };
            if entry.is_dir() {
                continue;
            }

            let name = entry.name().to_string();
            if entry.size() > limit {
                tracing::warn!(
                    "Skipping archive entry '{}': {} bytes exceeds the {} byte limit",
                    name,
                    entry.size(),
                    limit
                );
                continue;
            }

            let mut bytes = Vec::with_capacity(entry.size() as usize);
            if let Err(e) = entry.by_ref().take(limit + 1).read_to_end(&mut bytes) {
                tracing::warn!("Skipping archive entry '{}': {}", name, e);
                continue;
            }
            if bytes.len() as u64 > limit {
                tracing::warn!("Skipping archive entry '{}': expands past the size limit", name);
                continue;
            }
            drop(entry);

            match factory.from_bytes(bytes, self.depth) {
                Ok(Some(extractor)) => return Some((name, extractor)),
                Ok(None) => tracing::debug!("Skipping unsupported archive entry '{}'", name),
                Err(e) => tracing::warn!("Skipping archive entry '{}': {}", name, e),
            }
        }
        None
    }
}
