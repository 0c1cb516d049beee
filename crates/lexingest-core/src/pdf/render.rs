//! Page rasterization through PDFium.
//!
//! `Pdfium` is `!Send`, so a fresh binding is made for every render. The
//! dynamic loader caches the library, which keeps repeat loads cheap.

use image::{DynamicImage, RgbaImage};
use pdfium_render::prelude::*;
use tracing::{debug, warn};

use super::Result;
use crate::error::PdfError;

/// Explicit path to the PDFium shared library.
pub const ENV_PDFIUM_LIB_PATH: &str = "PDFIUM_DYNAMIC_LIB_PATH";

/// Upper bound for either side of a rendered page.
const MAX_DIMENSION_PX: u32 = 4096;

fn load_pdfium() -> Result<Pdfium> {
    if let Ok(path) = std::env::var(ENV_PDFIUM_LIB_PATH) {
        debug!("Loading PDFium from {}", path);
        let bindings = Pdfium::bind_to_library(&path).map_err(|e| {
            PdfError::Render(format!("failed to load PDFium from {}: {}", path, e))
        })?;
        return Ok(Pdfium::new(bindings));
    }

    let bindings = Pdfium::bind_to_system_library().map_err(|e| {
        PdfError::Render(format!(
            "PDFium library not found; set {} or install PDFium: {}",
            ENV_PDFIUM_LIB_PATH, e
        ))
    })?;
    Ok(Pdfium::new(bindings))
}

/// Pixel size of a page of `width` x `height` points at `zoom`, capped so
/// the longer side stays within `MAX_DIMENSION_PX`.
pub(crate) fn target_dimensions(width: f32, height: f32, zoom: f32) -> (u32, u32) {
    let zoom = if zoom > 0.0 { zoom } else { 1.0 };
    let raw_w = (width * zoom).max(1.0);
    let raw_h = (height * zoom).max(1.0);

    let longest = raw_w.max(raw_h);
    if longest > MAX_DIMENSION_PX as f32 {
        let ratio = MAX_DIMENSION_PX as f32 / longest;
        (
            ((raw_w * ratio) as u32).clamp(1, MAX_DIMENSION_PX),
            ((raw_h * ratio) as u32).clamp(1, MAX_DIMENSION_PX),
        )
    } else {
        (raw_w.round() as u32, raw_h.round() as u32)
    }
}

/// Rasterize 1-based `page` of `data`; zoom 1.0 is one pixel per point.
pub(crate) fn render_page(data: &[u8], page: u32, zoom: f32) -> Result<DynamicImage> {
    let index = page
        .checked_sub(1)
        .ok_or(PdfError::InvalidPage(page))? as usize;

    let pdfium = load_pdfium()?;
    let document = pdfium
        .load_pdf_from_byte_slice(data, None)
        .map_err(|e| PdfError::Render(format!("failed to load PDF: {}", e)))?;

    let pdf_page = document
        .pages()
        .iter()
        .nth(index)
        .ok_or(PdfError::InvalidPage(page))?;

    let (width, height) =
        target_dimensions(pdf_page.width().value, pdf_page.height().value, zoom);
    if width == MAX_DIMENSION_PX || height == MAX_DIMENSION_PX {
        warn!("Page {} capped to {}px", page, MAX_DIMENSION_PX);
    }

    let config = PdfRenderConfig::new()
        .set_target_width(width as i32)
        .set_maximum_height(height as i32);

    let bitmap = pdf_page
        .render_with_config(&config)
        .map_err(|e| PdfError::Render(format!("page {}: {}", page, e)))?;

    let (bitmap_w, bitmap_h) = (bitmap.width() as u32, bitmap.height() as u32);
    let image = RgbaImage::from_raw(bitmap_w, bitmap_h, bitmap.as_rgba_bytes())
        .ok_or_else(|| PdfError::Render(format!("page {}: short bitmap buffer", page)))?;

    debug!("Rendered page {} at {}x{}", page, bitmap_w, bitmap_h);
    Ok(DynamicImage::ImageRgba8(image))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_dimensions_scale_points_by_zoom() {
        // A4 in points
        assert_eq!(target_dimensions(595.0, 842.0, 2.0), (1190, 1684));
        assert_eq!(target_dimensions(595.0, 842.0, 1.0), (595, 842));
    }

    #[test]
    fn test_target_dimensions_cap_long_side() {
        let (w, h) = target_dimensions(1000.0, 4000.0, 2.0);
        assert_eq!(h, MAX_DIMENSION_PX);
        assert_eq!(w, 1024);
    }

    #[test]
    fn test_target_dimensions_ignore_non_positive_zoom() {
        assert_eq!(target_dimensions(100.0, 50.0, 0.0), (100, 50));
    }

    #[test]
    fn test_render_page_zero_is_invalid() {
        assert!(matches!(
            render_page(b"%PDF-1.4", 0, 1.0),
            Err(PdfError::InvalidPage(0))
        ));
    }
}
