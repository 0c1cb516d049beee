//! Error types for the lexingest-core library.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the lexingest library.
#[derive(Error, Debug)]
pub enum LexError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Cloud recognition service error.
    #[error("cloud error: {0}")]
    Cloud(#[from] CloudError),

    /// Document extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to extract images from PDF.
    #[error("failed to extract images: {0}")]
    ImageExtraction(String),

    /// Page rasterization failed.
    #[error("failed to render page: {0}")]
    Render(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to local OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// No recognizer is available in this build or deployment.
    #[error("no local recognizer available")]
    Unavailable,
}

/// Errors raised by the cloud recognition adapters.
#[derive(Error, Debug)]
pub enum CloudError {
    /// Transport-level failure talking to the service.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The service answered with a non-success status.
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The submit response did not carry an asynchronous job handle.
    #[error("response is missing the job handle header")]
    MissingJobHandle,

    /// The service answered with a body we could not interpret.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The job did not reach a terminal state within the poll budget.
    #[error("job timed out after {attempts} polls ({elapsed_ms}ms)")]
    Timeout { attempts: u32, elapsed_ms: u64 },

    /// The job reached the `failed` terminal state.
    #[error("remote job failed: {0}")]
    RemoteFailure(String),
}

impl From<reqwest::Error> for CloudError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CloudError::Http(format!("request timed out: {}", err))
        } else {
            CloudError::Http(err.to_string())
        }
    }
}

/// Diagnostic classification of an adapter failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    Memory,
    Other,
}

impl FailureKind {
    /// Classify a failure from its message text.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("timeout") || lower.contains("timed out") || lower.contains("deadline") {
            FailureKind::Timeout
        } else if lower.contains("memory")
            || lower
                .split(|c: char| !c.is_ascii_alphanumeric())
                .any(|word| word == "oom" || word == "heap" || word.starts_with("alloc"))
        {
            FailureKind::Memory
        } else {
            FailureKind::Other
        }
    }
}

/// Errors of the extraction cascade.
///
/// Only `UnsupportedMime` and `InvalidDocument` are ever visible outside the
/// orchestrator; the rest are recorded per attempt for diagnostics.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", content = "detail", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtractionError {
    /// No adapter exists for the MIME type.
    #[error("unsupported MIME type: {0}")]
    UnsupportedMime(String),

    /// Every applicable adapter returned empty text.
    #[error("no text could be extracted from the document")]
    InvalidDocument,

    /// A cloud job exceeded its poll budget.
    #[error("cloud job timed out: {0}")]
    Timeout(String),

    /// A cloud job reported a terminal failure status.
    #[error("cloud job failed: {0}")]
    RemoteFailure(String),

    /// Local processing threw.
    #[error("adapter failed ({kind:?}): {message}")]
    AdapterException { kind: FailureKind, message: String },
}

impl ExtractionError {
    /// Short machine-readable reason used in attempt events.
    pub fn reason(&self) -> &'static str {
        match self {
            ExtractionError::UnsupportedMime(_) => "unsupported_mime",
            ExtractionError::InvalidDocument => "invalid_document",
            ExtractionError::Timeout(_) => "timeout",
            ExtractionError::RemoteFailure(_) => "remote_failure",
            ExtractionError::AdapterException { kind, .. } => match kind {
                FailureKind::Timeout => "adapter_timeout",
                FailureKind::Memory => "adapter_memory",
                FailureKind::Other => "adapter_other",
            },
        }
    }

    /// Downgrade any error into an adapter exception with a classified kind.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        ExtractionError::AdapterException {
            kind: FailureKind::classify(&message),
            message,
        }
    }
}

impl From<CloudError> for ExtractionError {
    fn from(err: CloudError) -> Self {
        match err {
            CloudError::Timeout { .. } => ExtractionError::Timeout(err.to_string()),
            CloudError::RemoteFailure(msg) => ExtractionError::RemoteFailure(msg),
            other => ExtractionError::from_message(other.to_string()),
        }
    }
}

impl From<PdfError> for ExtractionError {
    fn from(err: PdfError) -> Self {
        ExtractionError::from_message(err.to_string())
    }
}

impl From<OcrError> for ExtractionError {
    fn from(err: OcrError) -> Self {
        ExtractionError::from_message(err.to_string())
    }
}

/// Result type for the lexingest library.
pub type Result<T> = std::result::Result<T, LexError>;
