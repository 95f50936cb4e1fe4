//! Content-type sniffing from leading bytes

use serde::Serialize;
use std::io::{self, Read, Seek, SeekFrom};

/// Bytes inspected to classify a stream
pub const SNIFF_LEN: usize = 8192;

const PDF_MAGIC: &[u8] = b"%PDF-";
const ZIP_LOCAL_HEADER: &[u8] = b"PK\x03\x04";
const ZIP_EMPTY_ARCHIVE: &[u8] = b"PK\x05\x06";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    PlainText,
    Paginated,
    Archive,
    Markup,
    Unsupported,
}

/// Classify `source` and rewind it to the start
pub fn detect<R: Read + Seek>(source: &mut R) -> io::Result<ContentKind> {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    source.by_ref().take(SNIFF_LEN as u64).read_to_end(&mut head)?;
    source.seek(SeekFrom::Start(0))?;
    Ok(classify(&head))
}

/// Classify a stream from its first bytes
pub fn classify(head: &[u8]) -> ContentKind {
    if head.starts_with(PDF_MAGIC) {
        return ContentKind::Paginated;
    }
    if head.starts_with(ZIP_LOCAL_HEADER) || head.starts_with(ZIP_EMPTY_ARCHIVE) {
        return ContentKind::Archive;
    }

    let content_type = content_inspector::inspect(head);
    if content_type.is_binary() {
        ContentKind::Unsupported
    } else if looks_like_xml(head) {
        ContentKind::Markup
    } else {
        ContentKind::PlainText
    }
}

/// Only an explicit `<?xml` declaration counts; HTML stays plain text
fn looks_like_xml(head: &[u8]) -> bool {
    let body = head.strip_prefix(UTF8_BOM).unwrap_or(head);
    let start = body
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(body.len());
    body[start..].starts_with(b"<?xml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_magic_numbers() {
        assert_eq!(classify(b"%PDF-1.7\n..."), ContentKind::Paginated);
        assert_eq!(classify(b"PK\x03\x04\x14\x00"), ContentKind::Archive);
        assert_eq!(classify(b"PK\x05\x06\x00\x00"), ContentKind::Archive);
    }

    #[test]
    fn test_text_and_markup() {
        assert_eq!(classify(b"hello world\n"), ContentKind::PlainText);
        assert_eq!(classify(b""), ContentKind::PlainText);
        assert_eq!(classify(b"<?xml version=\"1.0\"?><a/>"), ContentKind::Markup);
        assert_eq!(classify(b"\xEF\xBB\xBF  \n<?xml version=\"1.0\"?>"), ContentKind::Markup);
        assert_eq!(classify(b"<html><body>hi</body></html>"), ContentKind::PlainText);
    }

    #[test]
    fn test_binary_is_unsupported() {
        assert_eq!(classify(&[0x7f, b'E', b'L', b'F', 0, 0, 0, 0]), ContentKind::Unsupported);
    }

    #[test]
    fn test_detect_rewinds() {
        let mut cursor = Cursor::new(b"plain text".to_vec());
        assert_eq!(detect(&mut cursor).unwrap(), ContentKind::PlainText);
        let mut rest = String::new();
        cursor.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "plain text");
    }
}
