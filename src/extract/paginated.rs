use super::{BoxedSource, Chunk, ExtractError, UnitPacker};
use lopdf::Document;

/// PDF text, page by page
///
/// Chunks end on page boundaries; a page whose text alone exceeds the chunk
/// size is spilled over consecutive chunks instead of being dropped.
pub struct Paginated {
    pages: PageStream,
    packer: UnitPacker,
}

struct PageStream {
    document: Document,
    page_numbers: Vec<u32>,
    next: usize,
}

impl PageStream {
    fn next_page(&mut self) -> Result<Option<Vec<u8>>, ExtractError> {
        let Some(&page_number) = self.page_numbers.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;

        let mut text = match self.document.extract_text(&[page_number]) {
            Ok(text) => text.into_bytes(),
            Err(e) => {
                tracing::warn!("Skipping PDF page {}: {}", page_number, e);
                Vec::new()
            }
        };
        // Keep text of adjacent pages from running together
        if !text.is_empty() && !text.ends_with(b"\n") {
            text.push(b'\n');
        }
        Ok(Some(text))
    }
}

impl Paginated {
    pub(crate) fn new(source: BoxedSource) -> Result<Self, ExtractError> {
        let document = Document::load_from(source)?;
        if document.is_encrypted() {
            return Err(ExtractError::Encrypted);
        }
        let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
        tracing::trace!("Loaded PDF with {} pages", page_numbers.len());

        Ok(Self {
            pages: PageStream {
                document,
                page_numbers,
                next: 0,
            },
            packer: UnitPacker::default(),
        })
    }

    pub fn page_count(&self) -> usize {
        self.pages.page_numbers.len()
    }

    pub(crate) fn read_chunk(&mut self, buf: &mut [u8]) -> Result<Chunk, ExtractError> {
        self.packer.fill(buf, || self.pages.next_page())
    }
}
