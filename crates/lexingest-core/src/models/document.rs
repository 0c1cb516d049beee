//! Document input and extraction result models.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ExtractionError;

/// An uploaded document: raw bytes plus the declared MIME type.
#[derive(Debug, Clone)]
pub struct Document {
    bytes: Vec<u8>,
    mime_type: String,
}

impl Document {
    pub fn new(bytes: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn mime_class(&self) -> MimeClass {
        MimeClass::from_mime(&self.mime_type)
    }
}

/// Broad document family derived from a MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MimeClass {
    /// Portable document format.
    Pdf,
    /// Raster image.
    Image,
    /// Word-processor document (OOXML).
    WordProcessor,
    /// Plain text.
    PlainText,
    /// JSON text.
    Json,
    /// No adapter exists.
    Unsupported,
}

impl MimeClass {
    /// Classify a MIME type, ignoring parameters and case.
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "application/pdf" | "application/x-pdf" => MimeClass::Pdf,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                MimeClass::WordProcessor
            }
            "application/json" | "text/json" => MimeClass::Json,
            "text/plain" => MimeClass::PlainText,
            s if s.starts_with("image/") => MimeClass::Image,
            s if s.ends_with("+json") => MimeClass::Json,
            _ => MimeClass::Unsupported,
        }
    }

    /// Guess the MIME type of a file from its extension.
    pub fn mime_for_path(path: &Path) -> Option<&'static str> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        let mime = match ext.as_str() {
            "pdf" => "application/pdf",
            "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "txt" | "text" => "text/plain",
            "json" => "application/json",
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "tif" | "tiff" => "image/tiff",
            "bmp" => "image/bmp",
            _ => return None,
        };
        Some(mime)
    }
}

/// Per-call extraction options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractOptions {
    /// Maximum pages scanned by local OCR; falls back to the configured
    /// default. Zero turns local OCR into a no-op.
    #[serde(default, alias = "ocrPages")]
    pub max_ocr_pages: Option<usize>,

    /// Skip the native text layer and go straight to recognition.
    #[serde(default)]
    pub force_ocr: bool,
}

/// Identity of an extraction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    NativeText,
    FlatText,
    DocumentIntelligence,
    CloudVision,
    LocalOcr,
}

impl StrategyKind {
    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::NativeText => "native_text",
            StrategyKind::FlatText => "flat_text",
            StrategyKind::DocumentIntelligence => "document_intelligence",
            StrategyKind::CloudVision => "cloud_vision",
            StrategyKind::LocalOcr => "local_ocr",
        }
    }

    /// Strategies that recognise text visually rather than reading a text layer.
    pub fn is_recognition(self) -> bool {
        matches!(
            self,
            StrategyKind::DocumentIntelligence | StrategyKind::CloudVision | StrategyKind::LocalOcr
        )
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Which route produced the final text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathTaken {
    Strategy(StrategyKind),
    None,
}

/// Result of one strategy invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionAttemptResult {
    pub text: String,
    pub strategy: StrategyKind,
    pub succeeded: bool,
    pub error: Option<ExtractionError>,
}

impl ExtractionAttemptResult {
    pub fn text_length(&self) -> usize {
        self.text.chars().count()
    }
}

/// Final result of the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    pub text: Option<String>,
    pub path_taken: PathTaken,
    pub low_confidence: bool,
    /// Attempts in the order they ran.
    pub attempts: Vec<ExtractionAttemptResult>,
}

impl ExtractionOutcome {
    pub(crate) fn none(low_confidence: bool, attempts: Vec<ExtractionAttemptResult>) -> Self {
        Self {
            text: None,
            path_taken: PathTaken::None,
            low_confidence,
            attempts,
        }
    }

    /// Externally visible failure when no text was produced.
    pub fn error(&self, mime_class: MimeClass, mime: &str) -> Option<ExtractionError> {
        if self.text.is_some() {
            None
        } else if mime_class == MimeClass::Unsupported {
            Some(ExtractionError::UnsupportedMime(mime.to_string()))
        } else {
            Some(ExtractionError::InvalidDocument)
        }
    }
}
