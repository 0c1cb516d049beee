//! Core library for document ingestion.
//!
//! This crate provides:
//! - Text extraction through a cost-ordered cascade of strategies (PDF text
//!   layer, flat documents, cloud document intelligence, cloud vision, local OCR)
//! - Structured policy field extraction from free text
//! - Fact protection for external rewriting (placeholders and restore report)
//! - Configuration from a JSON file and the environment

pub mod cloud;
pub mod error;
pub mod extraction;
pub mod fields;
pub mod ingest;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod protect;

pub use error::{ExtractionError, FailureKind, LexError, Result};
pub use extraction::{
    AttemptEvent, CascadeMode, ExtractionObserver, ExtractionStrategy, Orchestrator,
    OrchestratorSettings, RecordingObserver, StrategyContext, TracingObserver,
};
pub use fields::extract_fields;
pub use ingest::{ingest, ingest_for_analysis, AnalysisOutcome, IngestRequest};
pub use models::config::LexConfig;
pub use models::document::{
    Document, ExtractOptions, ExtractionAttemptResult, ExtractionOutcome, MimeClass, PathTaken,
    StrategyKind,
};
pub use models::fields::StructuredPolicyFields;
pub use protect::{protect, restore, PlaceholderMap, ProtectedText, RestoreReport};
