//! Configuration structures for the ingestion pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::cloud::PollPolicy;
use crate::error::{LexError, Result};

/// Main configuration for the lexingest pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LexConfig {
    /// Cascade thresholds and deployment switches.
    pub extraction: ExtractionConfig,

    /// Cloud recognition services.
    pub cloud: CloudConfig,

    /// Local OCR configuration.
    pub ocr: OcrConfig,
}

/// Extraction cascade configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Minimum text length accepted from the native text layer.
    pub min_text_length: usize,

    /// Default number of pages scanned by local OCR.
    pub max_ocr_pages: usize,

    /// Disables local OCR and cloud vision.
    pub constrained_deployment: bool,

    /// Zoom factor applied when rasterizing pages for local OCR.
    pub render_zoom: f32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_text_length: 200,
            max_ocr_pages: 5,
            constrained_deployment: false,
            render_zoom: 2.0,
        }
    }
}

/// Endpoint and key for one cloud service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceCredentials {
    pub endpoint: String,
    pub key: String,
}

impl ServiceCredentials {
    /// A service counts as configured only when both halves are present.
    pub fn is_configured(&self) -> bool {
        !self.endpoint.trim().is_empty() && !self.key.trim().is_empty()
    }
}

/// Poll timing for an asynchronous cloud job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollSettings {
    pub interval_ms: u64,
    pub max_attempts: u32,
    pub budget_ms: u64,
}

impl PollSettings {
    pub fn policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.interval_ms),
            max_attempts: self.max_attempts,
            budget: Duration::from_millis(self.budget_ms),
        }
    }
}

/// Cloud recognition configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// Document-intelligence service.
    pub document_intelligence: Option<ServiceCredentials>,

    /// Vision OCR service.
    pub vision: Option<ServiceCredentials>,

    /// Document-intelligence poll timing.
    pub document_intelligence_poll: PollSettings,

    /// Vision OCR poll timing.
    pub vision_poll: PollSettings,

    /// Timeout for each individual HTTP request in seconds.
    pub request_timeout_secs: u64,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            document_intelligence: None,
            vision: None,
            document_intelligence_poll: PollSettings {
                interval_ms: 1500,
                max_attempts: 45,
                budget_ms: 60_000,
            },
            vision_poll: PollSettings {
                interval_ms: 1000,
                max_attempts: 12,
                budget_ms: 30_000,
            },
            request_timeout_secs: 30,
        }
    }
}

impl CloudConfig {
    pub fn document_intelligence(&self) -> Option<&ServiceCredentials> {
        self.document_intelligence.as_ref().filter(|c| c.is_configured())
    }

    pub fn vision(&self) -> Option<&ServiceCredentials> {
        self.vision.as_ref().filter(|c| c.is_configured())
    }
}

/// Local OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Recognition model and dictionary covering both alphabets.
    pub bilingual_recognition_model: String,
    pub bilingual_dictionary: String,

    /// Recognition model and dictionary for the Latin alphabet only.
    pub monolingual_recognition_model: String,
    pub monolingual_dictionary: String,

    /// Keep `[UNK]` markers emitted by the recognizer.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            bilingual_recognition_model: "heb_eng_rec.onnx".to_string(),
            bilingual_dictionary: "heb_eng_dict.txt".to_string(),
            monolingual_recognition_model: "latin_rec.onnx".to_string(),
            monolingual_dictionary: "latin_dict.txt".to_string(),
            keep_unk: false,
        }
    }
}

impl OcrConfig {
    /// Get full path to a model file.
    pub fn model_path(&self, model_name: &str) -> PathBuf {
        self.model_dir.join(model_name)
    }
}

pub const ENV_DOCINTEL_ENDPOINT: &str = "LEX_DOCINTEL_ENDPOINT";
pub const ENV_DOCINTEL_KEY: &str = "LEX_DOCINTEL_KEY";
pub const ENV_VISION_ENDPOINT: &str = "LEX_VISION_ENDPOINT";
pub const ENV_VISION_KEY: &str = "LEX_VISION_KEY";
pub const ENV_CONSTRAINED: &str = "LEX_CONSTRAINED_DEPLOYMENT";
pub const ENV_MAX_OCR_PAGES: &str = "LEX_MAX_OCR_PAGES";
pub const ENV_MIN_TEXT_LENGTH: &str = "LEX_MIN_TEXT_LENGTH";
pub const ENV_OCR_MODEL_DIR: &str = "LEX_OCR_MODEL_DIR";

impl LexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| LexError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| LexError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.apply_env(lookup);
        config
    }

    /// Overlay environment values onto this configuration.
    ///
    /// Unset or unparsable variables leave the current value untouched.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(creds) = credentials(&lookup, ENV_DOCINTEL_ENDPOINT, ENV_DOCINTEL_KEY) {
            self.cloud.document_intelligence = Some(creds);
        }
        if let Some(creds) = credentials(&lookup, ENV_VISION_ENDPOINT, ENV_VISION_KEY) {
            self.cloud.vision = Some(creds);
        }
        if let Some(flag) = lookup(ENV_CONSTRAINED) {
            self.extraction.constrained_deployment = parse_flag(&flag);
        }
        if let Some(pages) = lookup(ENV_MAX_OCR_PAGES).and_then(|v| v.trim().parse().ok()) {
            self.extraction.max_ocr_pages = pages;
        }
        if let Some(len) = lookup(ENV_MIN_TEXT_LENGTH).and_then(|v| v.trim().parse().ok()) {
            self.extraction.min_text_length = len;
        }
        if let Some(dir) = lookup(ENV_OCR_MODEL_DIR).filter(|v| !v.trim().is_empty()) {
            self.ocr.model_dir = PathBuf::from(dir);
        }
    }
}

fn credentials<F>(lookup: &F, endpoint_key: &str, key_key: &str) -> Option<ServiceCredentials>
where
    F: Fn(&str) -> Option<String>,
{
    let creds = ServiceCredentials {
        endpoint: lookup(endpoint_key)?,
        key: lookup(key_key)?,
    };
    creds.is_configured().then_some(creds)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
