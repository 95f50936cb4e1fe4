use super::{BoxedSource, Chunk, ExtractError, UnitPacker};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::io::BufReader;

/// XML text and CDATA nodes in document order
///
/// Markup itself (tags, attributes, comments, processing instructions) is not
/// scanned. Each node's text is a unit and ends with a newline.
pub struct Markup {
    nodes: NodeStream,
    packer: UnitPacker,
}

struct NodeStream {
    reader: Reader<BufReader<BoxedSource>>,
    buf: Vec<u8>,
    finished: bool,
}

impl NodeStream {
    fn next_text(&mut self) -> Result<Option<Vec<u8>>, ExtractError> {
        while !self.finished {
            self.buf.clear();
            let text = match self.reader.read_event_into(&mut self.buf)? {
                Event::Text(text) => text
                    .unescape()
                    .map_err(quick_xml::Error::from)?
                    .trim()
                    .as_bytes()
                    .to_vec(),
                Event::CData(data) => data.into_inner().trim_ascii().to_vec(),
                Event::Eof => {
                    self.finished = true;
                    break;
                }
                _ => continue,
            };
            if text.is_empty() {
                continue;
            }

            let mut unit = text;
            unit.push(b'\n');
            return Ok(Some(unit));
        }
        Ok(None)
    }
}

impl Markup {
    pub(crate) fn new(source: BoxedSource) -> Self {
        let mut reader = Reader::from_reader(BufReader::new(source));
        reader.config_mut().check_end_names = false;

        Self {
            nodes: NodeStream {
                reader,
                buf: Vec::new(),
                finished: false,
            },
            packer: UnitPacker::default(),
        }
    }

    pub(crate) fn read_chunk(&mut self, buf: &mut [u8]) -> Result<Chunk, ExtractError> {
        self.packer.fill(buf, || self.nodes.next_text())
    }
}
