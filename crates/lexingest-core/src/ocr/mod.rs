//! Local text recognition.
//!
//! Recognition runs in one of two modes: a bilingual pass covering the Hebrew
//! and Latin alphabets, and a Latin-only fallback pass. Either way the output
//! is filtered through a character whitelist and laid out as a single uniform
//! text block.

#[cfg(feature = "native")]
mod pure_engine;

#[cfg(feature = "native")]
pub use pure_engine::PureOcrRecognizer;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// Recognition language mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionMode {
    /// Hebrew and Latin alphabets together.
    Bilingual,
    /// Latin alphabet only.
    Monolingual,
}

/// A detected text box with its coordinates and content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Quadrilateral corners (x1, y1, x2, y2, x3, y3, x4, y4).
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub confidence: f32,
}

impl TextBox {
    /// Get the axis-aligned bounding rectangle.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }
}

/// A local text recognizer.
pub trait TextRecognizer: Send + Sync {
    /// Recognize the text boxes on one page image.
    fn recognize(&self, image: &DynamicImage, mode: RecognitionMode) -> Result<Vec<TextBox>, OcrError>;
}

/// Punctuation allowed through the whitelist.
const WHITELIST_PUNCTUATION: &str = ".,:;-/()%₪$€\"'״׳&@#";

/// Whether `c` belongs to the recognition whitelist for `mode`.
pub fn is_whitelisted(c: char, mode: RecognitionMode) -> bool {
    let hebrew = ('\u{05D0}'..='\u{05EA}').contains(&c);
    c.is_ascii_alphanumeric()
        || c.is_whitespace()
        || WHITELIST_PUNCTUATION.contains(c)
        || (mode == RecognitionMode::Bilingual && hebrew)
}

/// Drop every character outside the whitelist.
pub fn apply_whitelist(text: &str, mode: RecognitionMode) -> String {
    text.chars().filter(|&c| is_whitelisted(c, mode)).collect()
}

/// Join boxes into a single uniform block: one line per visual row,
/// rows top-to-bottom, boxes in a row ordered by x.
pub fn single_block_text(boxes: &[TextBox], mode: RecognitionMode) -> String {
    let mut ordered: Vec<&TextBox> = boxes.iter().collect();
    ordered.sort_by(|a, b| {
        let (ax, ay, _, _) = a.rect();
        let (bx, by, _, _) = b.rect();
        // Group by approximate vertical position (within 20 pixels)
        let row_a = (ay / 20.0) as i32;
        let row_b = (by / 20.0) as i32;
        row_a
            .cmp(&row_b)
            .then(ax.partial_cmp(&bx).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut lines: Vec<String> = Vec::new();
    let mut current_row: Option<i32> = None;
    for text_box in ordered {
        let text = apply_whitelist(&text_box.text, mode);
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        let row = (text_box.rect().1 / 20.0) as i32;
        match (current_row, lines.last_mut()) {
            (Some(r), Some(line)) if r == row => {
                line.push(' ');
                line.push_str(text);
            }
            _ => {
                lines.push(text.to_string());
                current_row = Some(row);
            }
        }
    }

    lines.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_box(x: f32, y: f32, text: &str) -> TextBox {
        TextBox {
            bbox: [x, y, x + 50.0, y, x + 50.0, y + 10.0, x, y + 10.0],
            text: text.to_string(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_whitelist_modes() {
        assert!(is_whitelisted('א', RecognitionMode::Bilingual));
        assert!(!is_whitelisted('א', RecognitionMode::Monolingual));
        assert!(is_whitelisted('₪', RecognitionMode::Monolingual));
        assert!(!is_whitelisted('§', RecognitionMode::Bilingual));
        assert_eq!(apply_whitelist("a§b~1", RecognitionMode::Monolingual), "ab1");
    }

    #[test]
    fn test_single_block_orders_rows() {
        let boxes = vec![
            text_box(100.0, 40.0, "second"),
            text_box(200.0, 2.0, "world"),
            text_box(10.0, 0.0, "hello"),
        ];
        assert_eq!(
            single_block_text(&boxes, RecognitionMode::Bilingual),
            "hello world\nsecond"
        );
    }

    #[test]
    fn test_single_block_skips_filtered_boxes() {
        let boxes = vec![text_box(0.0, 0.0, "§§"), text_box(0.0, 50.0, "שלום")];
        assert_eq!(single_block_text(&boxes, RecognitionMode::Bilingual), "שלום");
        assert_eq!(single_block_text(&boxes, RecognitionMode::Monolingual), "");
    }
}
