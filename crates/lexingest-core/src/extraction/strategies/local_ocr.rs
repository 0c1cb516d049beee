//! Local OCR: rasterize pages, then run bilingual recognition.

use std::sync::Arc;

use image::DynamicImage;
use tracing::{debug, warn};

use crate::error::{ExtractionError, OcrError};
use crate::extraction::{ExtractionStrategy, StrategyContext};
use crate::models::document::{Document, MimeClass, StrategyKind};
use crate::ocr::{single_block_text, RecognitionMode, TextRecognizer};
use crate::pdf::{PdfExtractor, PdfProcessor};

pub struct LocalOcrStrategy {
    recognizer: Option<Arc<dyn TextRecognizer>>,
    zoom: f32,
}

impl LocalOcrStrategy {
    pub fn new(recognizer: Arc<dyn TextRecognizer>, zoom: f32) -> Self {
        Self {
            recognizer: Some(recognizer),
            zoom,
        }
    }

    /// A slot with no recognizer; every call fails as unavailable.
    pub fn unavailable() -> Self {
        Self {
            recognizer: None,
            zoom: 1.0,
        }
    }

    fn pages(&self, document: &Document, max_pages: usize) -> Result<Vec<DynamicImage>, ExtractionError> {
        match document.mime_class() {
            MimeClass::Image => {
                let image = image::load_from_memory(document.bytes())
                    .map_err(|e| ExtractionError::from(OcrError::InvalidImage(e.to_string())))?;
                Ok(vec![image])
            }
            MimeClass::Pdf => {
                let pdf = PdfExtractor::from_bytes(document.bytes())?;
                render_pages(&pdf, max_pages, self.zoom)
            }
            _ => Err(ExtractionError::UnsupportedMime(document.mime_type().to_string())),
        }
    }
}

/// Render up to `max_pages` pages; pages that fail to render are skipped.
fn render_pages<P: PdfProcessor>(
    pdf: &P,
    max_pages: usize,
    zoom: f32,
) -> Result<Vec<DynamicImage>, ExtractionError> {
    let last = (pdf.page_count() as usize).min(max_pages) as u32;
    let mut images = Vec::new();
    let mut last_error = None;

    for page in 1..=last {
        match pdf.render_page(page, zoom) {
            Ok(image) => images.push(image),
            Err(e) => {
                debug!("Skipping page {}: {}", page, e);
                last_error = Some(e);
            }
        }
    }

    match (images.is_empty(), last_error) {
        (true, Some(e)) => Err(e.into()),
        _ => Ok(images),
    }
}

/// Bilingual pass first; a Latin-only pass only if the bilingual one fails.
fn recognize_page(recognizer: &dyn TextRecognizer, image: &DynamicImage) -> Result<String, OcrError> {
    match recognizer.recognize(image, RecognitionMode::Bilingual) {
        Ok(boxes) => Ok(single_block_text(&boxes, RecognitionMode::Bilingual)),
        Err(e) => {
            warn!("Bilingual recognition failed: {}; retrying Latin-only", e);
            let boxes = recognizer.recognize(image, RecognitionMode::Monolingual)?;
            Ok(single_block_text(&boxes, RecognitionMode::Monolingual))
        }
    }
}

impl ExtractionStrategy for LocalOcrStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::LocalOcr
    }

    fn try_extract(&self, document: &Document, ctx: &StrategyContext) -> Result<String, ExtractionError> {
        let recognizer = self.recognizer.as_deref().ok_or(OcrError::Unavailable)?;
        if ctx.max_ocr_pages == 0 {
            debug!("Page limit is 0; local OCR scans nothing");
            return Ok(String::new());
        }
        let pages = self.pages(document, ctx.max_ocr_pages)?;

        let mut texts = Vec::with_capacity(pages.len());
        let mut last_error = None;
        for (i, page) in pages.iter().enumerate() {
            match recognize_page(recognizer, page) {
                Ok(text) if !text.is_empty() => texts.push(text),
                Ok(_) => debug!("No text recognized on page {}", i + 1),
                Err(e) => {
                    warn!("Recognition failed on page {}: {}", i + 1, e);
                    last_error = Some(e);
                }
            }
        }

        match (texts.is_empty(), last_error) {
            (true, Some(e)) => Err(e.into()),
            _ => Ok(texts.join("\n\n").trim().to_string()),
        }
    }
}
