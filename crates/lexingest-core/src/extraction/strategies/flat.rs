//! Single-adapter extraction for flat formats: DOCX, plain text, JSON.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ExtractionError;
use crate::extraction::{ExtractionStrategy, StrategyContext};
use crate::models::document::{Document, MimeClass, StrategyKind};

#[derive(Debug, Default, Clone, Copy)]
pub struct FlatTextStrategy;

impl FlatTextStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl ExtractionStrategy for FlatTextStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::FlatText
    }

    fn try_extract(&self, document: &Document, _ctx: &StrategyContext) -> Result<String, ExtractionError> {
        let text = match document.mime_class() {
            MimeClass::WordProcessor => docx_text(document.bytes())?,
            MimeClass::PlainText => String::from_utf8_lossy(document.bytes()).into_owned(),
            MimeClass::Json => json_text(document.bytes()),
            _ => {
                return Err(ExtractionError::UnsupportedMime(
                    document.mime_type().to_string(),
                ));
            }
        };
        Ok(text.trim().to_string())
    }
}

/// Pretty-print valid JSON; pass anything else through as text.
fn json_text(bytes: &[u8]) -> String {
    match serde_json::from_slice::<serde_json::Value>(bytes) {
        Ok(value) => serde_json::to_string_pretty(&value)
            .unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned()),
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Text of `word/document.xml` inside a DOCX container, one line per paragraph.
pub fn docx_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractionError::from_message(format!("not a DOCX container: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractionError::from_message(format!("missing document body: {}", e)))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractionError::from_message(e.to_string()))?;

    let mut reader = Reader::from_str(&xml);
    let mut out = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_text = true,
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => out.push('\t'),
                b"w:br" | b"w:cr" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| ExtractionError::from_message(format!("bad DOCX text: {}", e)))?;
                out.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ExtractionError::from_message(format!(
                    "malformed DOCX XML at {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
        }
    }

    Ok(out)
}
