use super::{BoxedSource, Chunk, ExtractError};
use std::io::{ErrorKind, Read};

/// Raw byte stream, chunked directly from the read cursor
pub struct PlainText {
    source: BoxedSource,
    position: u64,
}

impl PlainText {
    pub(crate) fn new(source: BoxedSource) -> Self {
        Self {
            source,
            position: 0,
        }
    }

    /// Bytes handed out so far
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Fill as much of `buf` as the source allows before EOF
    pub(crate) fn read_chunk(&mut self, buf: &mut [u8]) -> Result<Chunk, ExtractError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.source.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        self.position += filled as u64;
        Ok(if filled == 0 {
            Chunk::Exhausted
        } else {
            Chunk::Filled(filled)
        })
    }
}
