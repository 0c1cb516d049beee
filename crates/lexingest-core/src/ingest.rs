//! Ingestion entrypoint: base64 payload in, text out.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::extraction::Orchestrator;
use crate::models::document::{Document, ExtractOptions};

/// An upload as received from a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    #[serde(alias = "base64", alias = "data")]
    pub data_base64: String,
    pub mime_type: String,
    #[serde(default)]
    pub options: ExtractOptions,
}

impl IngestRequest {
    pub fn new(data_base64: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data_base64: data_base64.into(),
            mime_type: mime_type.into(),
            options: ExtractOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    fn document(&self) -> Option<Document> {
        // Data URLs carry a "data:<mime>;base64," prefix.
        let payload = match self.data_base64.split_once(";base64,") {
            Some((prefix, rest)) if prefix.starts_with("data:") => rest,
            _ => self.data_base64.as_str(),
        };
        let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();

        match STANDARD.decode(cleaned.as_bytes()) {
            Ok(bytes) => Some(Document::new(bytes, self.mime_type.clone())),
            Err(e) => {
                warn!("Rejecting upload with invalid base64 payload: {}", e);
                None
            }
        }
    }
}

/// Result of the strict analysis entrypoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    pub text: Option<String>,
    pub low_confidence_document: bool,
}

/// Best-available text for an upload, or `None`.
pub fn ingest(orchestrator: &Orchestrator, request: &IngestRequest) -> Option<String> {
    let document = request.document()?;
    orchestrator.extract(&document, &request.options).text
}

/// Text layer or a single document-intelligence job, with the confidence flag.
pub fn ingest_for_analysis(orchestrator: &Orchestrator, request: &IngestRequest) -> AnalysisOutcome {
    let Some(document) = request.document() else {
        return AnalysisOutcome {
            text: None,
            low_confidence_document: false,
        };
    };
    let outcome = orchestrator.extract_for_analysis(&document, &request.options);
    AnalysisOutcome {
        text: outcome.text,
        low_confidence_document: outcome.low_confidence,
    }
}
