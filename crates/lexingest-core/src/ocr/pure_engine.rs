//! Pure Rust OCR recognizer using `pure-onnx-ocr`.

use std::path::Path;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::{RecognitionMode, TextBox, TextRecognizer};

type Engine = pure_onnx_ocr::engine::OcrEngine;

/// Recognizer backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).
///
/// Holds one engine per recognition mode; both share the detection model.
pub struct PureOcrRecognizer {
    bilingual: Engine,
    monolingual: Option<Engine>,
    keep_unk: bool,
}

impl PureOcrRecognizer {
    /// Load engines from the model directory in `config`.
    ///
    /// The bilingual model is required; the Latin-only model is optional.
    pub fn from_config(config: &OcrConfig) -> Result<Self, OcrError> {
        let det_path = config.model_path(&config.detection_model);

        let bilingual = build_engine(
            &det_path,
            &config.model_path(&config.bilingual_recognition_model),
            &config.model_path(&config.bilingual_dictionary),
        )?;

        let mono_rec = config.model_path(&config.monolingual_recognition_model);
        let mono_dict = config.model_path(&config.monolingual_dictionary);
        let monolingual = if mono_rec.exists() && mono_dict.exists() {
            Some(build_engine(&det_path, &mono_rec, &mono_dict)?)
        } else {
            debug!("No Latin-only recognition model at {}", mono_rec.display());
            None
        };

        info!("Loaded pure-onnx-ocr recognizer from {}", config.model_dir.display());

        Ok(Self {
            bilingual,
            monolingual,
            keep_unk: config.keep_unk,
        })
    }
}

fn build_engine(det_path: &Path, rec_path: &Path, dict_path: &Path) -> Result<Engine, OcrError> {
    pure_onnx_ocr::engine::OcrEngineBuilder::new()
        .det_model_path(det_path)
        .rec_model_path(rec_path)
        .dictionary_path(dict_path)
        .build()
        .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))
}

impl TextRecognizer for PureOcrRecognizer {
    fn recognize(&self, image: &DynamicImage, mode: RecognitionMode) -> Result<Vec<TextBox>, OcrError> {
        let engine = match mode {
            RecognitionMode::Bilingual => &self.bilingual,
            RecognitionMode::Monolingual => self.monolingual.as_ref().unwrap_or(&self.bilingual),
        };

        let start = Instant::now();
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(OcrError::InvalidImage("empty image".to_string()));
        }

        let results = engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        let boxes: Vec<TextBox> = results
            .iter()
            .map(|r| TextBox {
                bbox: polygon_to_bbox(&r.bounding_box),
                text: if self.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                },
                confidence: r.confidence,
            })
            .collect();

        debug!(
            "{:?} recognition on {}x{}: {} boxes in {}ms",
            mode,
            width,
            height,
            boxes.len(),
            start.elapsed().as_millis()
        );

        Ok(boxes)
    }
}

/// Convert a `Polygon<f64>` to our `[f32; 8]` bbox format.
fn polygon_to_bbox(polygon: &pure_onnx_ocr::Polygon<f64>) -> [f32; 8] {
    let mut bbox = [0.0f32; 8];
    for (i, coord) in polygon.exterior().coords().take(4).enumerate() {
        bbox[i * 2] = coord.x as f32;
        bbox[i * 2 + 1] = coord.y as f32;
    }
    bbox
}
