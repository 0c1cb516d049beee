//! PDF processing module.

mod extractor;
#[cfg(feature = "native")]
mod render;

pub use extractor::{PdfExtractor, TextLayerParser};
#[cfg(feature = "native")]
pub use render::ENV_PDFIUM_LIB_PATH;

use crate::error::PdfError;
use image::DynamicImage;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract the text layer with the given parser.
    fn extract_text_with(&self, parser: TextLayerParser) -> Result<String>;

    /// Rasterize a page; `zoom` 1.0 maps one PDF point to one pixel.
    fn render_page(&self, page: u32, zoom: f32) -> Result<DynamicImage>;

    /// Extract embedded images from a page.
    fn extract_images(&self, page: u32) -> Result<Vec<DynamicImage>>;
}
