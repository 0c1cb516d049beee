//! Strategy wrappers around the cloud recognition clients.

use crate::cloud::{DocumentIntelligenceClient, VisionClient};
use crate::error::ExtractionError;
use crate::extraction::{ExtractionStrategy, StrategyContext};
use crate::models::document::{Document, StrategyKind};

/// One document-intelligence job per call.
pub struct DocumentIntelligenceStrategy {
    client: DocumentIntelligenceClient,
}

impl DocumentIntelligenceStrategy {
    pub fn new(client: DocumentIntelligenceClient) -> Self {
        Self { client }
    }
}

impl ExtractionStrategy for DocumentIntelligenceStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::DocumentIntelligence
    }

    fn try_extract(&self, document: &Document, _ctx: &StrategyContext) -> Result<String, ExtractionError> {
        Ok(cloud_text(&self.client.analyze(document)?))
    }
}

/// Cloud vision read job.
pub struct CloudVisionStrategy {
    client: VisionClient,
}

impl CloudVisionStrategy {
    pub fn new(client: VisionClient) -> Self {
        Self { client }
    }
}

impl ExtractionStrategy for CloudVisionStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::CloudVision
    }

    fn try_extract(&self, document: &Document, _ctx: &StrategyContext) -> Result<String, ExtractionError> {
        Ok(cloud_text(&self.client.read(document)?))
    }
}

/// Cloud services return their own character set; only surrounding
/// whitespace is dropped. The recognition whitelist is for local models.
fn cloud_text(raw: &str) -> String {
    raw.trim().to_string()
}
