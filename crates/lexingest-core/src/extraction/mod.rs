//! Document text extraction: strategy adapters and the cascade that orders them.

mod cascade;
mod observer;
mod orchestrator;
pub mod strategies;

pub use cascade::{Acceptance, CascadeMode, CascadeRule, ANALYSIS_CASCADE, STANDARD_CASCADE};
pub use observer::{AttemptEvent, ExtractionObserver, FanOutObserver, RecordingObserver, TracingObserver};
pub use orchestrator::{Orchestrator, OrchestratorSettings};

use crate::error::ExtractionError;
use crate::models::document::{Document, StrategyKind};

/// Per-call inputs a strategy may need beyond the document itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyContext {
    /// Maximum pages scanned by page-by-page recognition.
    pub max_ocr_pages: usize,
}

/// One independent way of turning a document into text.
///
/// Implementations return `Ok` with whatever text they found (possibly
/// empty) and `Err` when they fail. The orchestrator never lets an error
/// escape; it records it and moves on.
pub trait ExtractionStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    fn try_extract(&self, document: &Document, ctx: &StrategyContext) -> Result<String, ExtractionError>;
}
