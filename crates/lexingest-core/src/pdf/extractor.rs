//! PDF text-layer and page-image extraction using pdf-extract and lopdf,
//! with page rasterization through PDFium when the `native` feature is on.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace, warn};

use super::{PdfProcessor, Result};
use crate::error::PdfError;

/// The two independent text-layer parsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextLayerParser {
    /// Layout-aware parser from `pdf-extract`.
    Primary,
    /// Content-stream walker from `lopdf`.
    Secondary,
}

/// PDF content extractor backed by lopdf.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
        }
    }

    /// Create an extractor and load `data` into it.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut extractor = Self::new();
        extractor.load(data)?;
        Ok(extractor)
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or_else(|| PdfError::Parse("no document loaded".to_string()))
    }

    fn extract_primary(&self) -> Result<String> {
        // pdf-extract panics on some malformed font tables; treat that as a parse failure.
        let data = self.raw_data.as_slice();
        match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(data)) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(PdfError::TextExtraction(e.to_string())),
            Err(_) => Err(PdfError::TextExtraction(
                "pdf-extract panicked while reading the text layer".to_string(),
            )),
        }
    }

    fn extract_secondary(&self) -> Result<String> {
        let doc = self.document()?;
        let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
        doc.extract_text(&pages)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    /// Extract all images from the entire document.
    fn extract_all_images(&self) -> Vec<DynamicImage> {
        let Some(doc) = self.document.as_ref() else {
            return vec![];
        };

        let images: Vec<DynamicImage> = doc
            .objects
            .values()
            .filter_map(|object| self.try_extract_image_from_object(doc, object))
            .collect();

        debug!("Found {} images in document", images.len());
        images
    }

    fn try_extract_image_from_object(&self, doc: &Document, obj: &Object) -> Option<DynamicImage> {
        let Object::Stream(stream) = obj else {
            return None;
        };
        let dict = &stream.dict;

        if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
            return None;
        }

        let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
        let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;
        trace!("Found image object: {}x{}", width, height);

        let filter_name = dict.get(b"Filter").ok().and_then(|filter| match filter {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            _ => None,
        });

        match filter_name {
            Some(b"DCTDecode") => {
                return image::load_from_memory_with_format(
                    &stream.content,
                    image::ImageFormat::Jpeg,
                )
                .ok();
            }
            Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                trace!("Skipping image with unsupported filter");
                return None;
            }
            _ => {}
        }

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| match o {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
                _ => None,
            })
            .unwrap_or(b"DeviceRGB");

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8);

        if bits != 8 {
            trace!("Unsupported bits per component: {}", bits);
            return None;
        }

        decode_raw_image(data, width, height, color_space)
    }

    /// Approximate a page from its embedded rasters, stacked top to bottom.
    fn render_from_embedded(&self, page: u32, zoom: f32) -> Result<DynamicImage> {
        let images = self.extract_images(page)?;
        let Some(image) = stack_strips(images) else {
            warn!("Page {} has no raster content", page);
            return Err(PdfError::ImageExtraction(format!(
                "no images found on page {}",
                page
            )));
        };

        if (zoom - 1.0).abs() < f32::EPSILON || zoom <= 0.0 {
            return Ok(image);
        }

        let width = ((image.width() as f32) * zoom).round().max(1.0) as u32;
        let height = ((image.height() as f32) * zoom).round().max(1.0) as u32;
        Ok(image.resize_exact(width, height, FilterType::Triangle))
    }

    /// Get resources dictionary for a page, following the page-tree inheritance chain.
    fn page_resources(&self, doc: &Document, node_id: ObjectId) -> Option<Dictionary> {
        let Object::Dictionary(dict) = doc.get_object(node_id).ok()? else {
            return None;
        };

        if let Ok(resources) = dict.get(b"Resources") {
            if let Ok((_, Object::Dictionary(res_dict))) = doc.dereference(resources) {
                return Some(res_dict.clone());
            }
        }

        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => self.page_resources(doc, *parent_id),
            _ => None,
        }
    }
}

fn decode_raw_image(
    data: Vec<u8>,
    width: u32,
    height: u32,
    color_space: &[u8],
) -> Option<DynamicImage> {
    let pixels = (width as usize) * (height as usize);

    match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= pixels * 3 => {
            let mut data = data;
            data.truncate(pixels * 3);
            RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8)
        }
        b"DeviceGray" | b"G" if data.len() >= pixels => {
            let mut data = data;
            data.truncate(pixels);
            GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8)
        }
        _ => {
            trace!(
                "Could not decode image: data_len={}, colorspace={:?}",
                data.len(),
                String::from_utf8_lossy(color_space)
            );
            None
        }
    }
}

/// Scanners often split one page into horizontal strips; join them on a white
/// canvas as wide as the widest strip.
fn stack_strips(images: Vec<DynamicImage>) -> Option<DynamicImage> {
    if images.len() <= 1 {
        return images.into_iter().next();
    }

    let width = images.iter().map(|i| i.width()).max()?;
    let height = images.iter().map(|i| i.height()).sum();
    let mut canvas = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));

    let mut y = 0i64;
    for image in &images {
        imageops::overlay(&mut canvas, &image.to_rgb8(), 0, y);
        y += i64::from(image.height());
    }

    Some(DynamicImage::ImageRgb8(canvas))
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract needs the decrypted bytes.
            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn extract_text_with(&self, parser: TextLayerParser) -> Result<String> {
        match parser {
            TextLayerParser::Primary => self.extract_primary(),
            TextLayerParser::Secondary => self.extract_secondary(),
        }
    }

    fn render_page(&self, page: u32, zoom: f32) -> Result<DynamicImage> {
        #[cfg(feature = "native")]
        {
            match super::render::render_page(&self.raw_data, page, zoom) {
                Ok(image) => return Ok(image),
                Err(PdfError::InvalidPage(page)) => return Err(PdfError::InvalidPage(page)),
                Err(e) => warn!(
                    "Rasterizer unavailable for page {}, using embedded images: {}",
                    page, e
                ),
            }
        }

        self.render_from_embedded(page, zoom)
    }

    fn extract_images(&self, page: u32) -> Result<Vec<DynamicImage>> {
        let doc = self.document()?;

        let pages = doc.get_pages();
        let page_id = pages.get(&page).ok_or(PdfError::InvalidPage(page))?;

        let mut images = Vec::new();

        if let Some(resources) = self.page_resources(doc, *page_id) {
            if let Ok(xobjects) = resources.get(b"XObject") {
                if let Ok((_, Object::Dictionary(xobj_dict))) = doc.dereference(xobjects) {
                    for (_name, obj_ref) in xobj_dict.iter() {
                        if let Ok((_, obj)) = doc.dereference(obj_ref) {
                            if let Some(img) = self.try_extract_image_from_object(doc, obj) {
                                images.push(img);
                            }
                        }
                    }
                }
            }
        }

        // Single-page scans sometimes hang their image off an unreferenced object.
        if images.is_empty() && pages.len() == 1 {
            debug!("No XObject images found on page {}, scanning all objects", page);
            images = self.extract_all_images();
        }

        debug!("Extracted {} images from page {}", images.len(), page);
        Ok(images)
    }
}
