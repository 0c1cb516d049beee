//! Native text-layer extraction for PDFs.

use tracing::{debug, warn};

use crate::error::ExtractionError;
use crate::extraction::{ExtractionStrategy, StrategyContext};
use crate::models::document::{Document, StrategyKind};
use crate::pdf::{PdfExtractor, PdfProcessor, TextLayerParser};

/// Reads the embedded text layer with a primary parser, falling back to the
/// secondary parser only when the primary one fails outright.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeTextStrategy;

impl NativeTextStrategy {
    pub fn new() -> Self {
        Self
    }

    fn read<P: PdfProcessor>(pdf: &P) -> Result<String, ExtractionError> {
        match pdf.extract_text_with(TextLayerParser::Primary) {
            Ok(text) => Ok(text),
            Err(primary) => {
                warn!("Primary text-layer parser failed: {}; trying secondary", primary);
                let text = pdf.extract_text_with(TextLayerParser::Secondary)?;
                debug!("Secondary parser read {} chars", text.len());
                Ok(text)
            }
        }
    }
}

impl ExtractionStrategy for NativeTextStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::NativeText
    }

    fn try_extract(&self, document: &Document, _ctx: &StrategyContext) -> Result<String, ExtractionError> {
        let pdf = PdfExtractor::from_bytes(document.bytes())?;
        Ok(Self::read(&pdf)?.trim().to_string())
    }
}
