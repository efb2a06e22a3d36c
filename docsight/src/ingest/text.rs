use super::{DocumentMetadata, DocumentParser, ExtractedText};
use crate::error::Result;

/// Decodes `text/*` uploads as UTF-8.
///
/// Invalid sequences become U+FFFD rather than failing the upload; a leading
/// byte order mark is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextParser;

impl DocumentParser for PlainTextParser {
    fn extract_text(&self, bytes: &[u8]) -> Result<ExtractedText> {
        let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
        let text = String::from_utf8_lossy(bytes).into_owned();

        Ok(ExtractedText {
            text,
            metadata: DocumentMetadata {
                encoding: Some("utf-8".to_string()),
                ..DocumentMetadata::default()
            },
        })
    }

    fn name(&self) -> &str {
        "text"
    }
}
