//! The extraction orchestrator: runs the cascade for one document.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::cascade::{plan, Acceptance, CascadeMode};
use super::observer::{AttemptEvent, ExtractionObserver, TracingObserver};
use super::strategies::{
    CloudVisionStrategy, DocumentIntelligenceStrategy, FlatTextStrategy, LocalOcrStrategy,
    NativeTextStrategy,
};
use super::{ExtractionStrategy, StrategyContext};
use crate::cloud::{DocumentIntelligenceClient, VisionClient};
use crate::error::{ExtractionError, Result};
use crate::models::config::{ExtractionConfig, LexConfig};
use crate::models::document::{
    Document, ExtractOptions, ExtractionAttemptResult, ExtractionOutcome, MimeClass, PathTaken,
    StrategyKind,
};

/// Thresholds and deployment switches for the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorSettings {
    pub min_text_length: usize,
    pub max_ocr_pages: usize,
    /// Disables local OCR and cloud vision.
    pub constrained: bool,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from(&ExtractionConfig::default())
    }
}

impl From<&ExtractionConfig> for OrchestratorSettings {
    fn from(config: &ExtractionConfig) -> Self {
        Self {
            min_text_length: config.min_text_length,
            max_ocr_pages: config.max_ocr_pages,
            constrained: config.constrained_deployment,
        }
    }
}

/// Owns the registered strategies and runs them in cascade order.
///
/// Holds no per-call state; one instance may serve concurrent calls.
pub struct Orchestrator {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    settings: OrchestratorSettings,
    observer: Arc<dyn ExtractionObserver>,
}

impl Orchestrator {
    /// An orchestrator with no strategies registered.
    pub fn new(settings: OrchestratorSettings) -> Self {
        Self {
            strategies: Vec::new(),
            settings,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Register a strategy, replacing any previous one of the same kind.
    pub fn with_strategy<S: ExtractionStrategy + 'static>(mut self, strategy: S) -> Self {
        let kind = strategy.kind();
        self.strategies.retain(|s| s.kind() != kind);
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Set the attempt observer.
    pub fn with_observer(mut self, observer: Arc<dyn ExtractionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Build the full strategy set described by `config`.
    ///
    /// Cloud strategies are registered only when their credentials are
    /// present. Local OCR is registered only in an unconstrained deployment.
    pub fn from_config(config: &LexConfig) -> Result<Self> {
        let settings = OrchestratorSettings::from(&config.extraction);
        let timeout = std::time::Duration::from_secs(config.cloud.request_timeout_secs);

        let mut orchestrator = Self::new(settings)
            .with_strategy(NativeTextStrategy::new())
            .with_strategy(FlatTextStrategy::new());

        if let Some(creds) = config.cloud.document_intelligence() {
            let client = DocumentIntelligenceClient::new(
                creds,
                config.cloud.document_intelligence_poll.policy(),
                timeout,
            )?;
            orchestrator = orchestrator.with_strategy(DocumentIntelligenceStrategy::new(client));
        }

        if !settings.constrained {
            if let Some(creds) = config.cloud.vision() {
                let client = VisionClient::new(creds, config.cloud.vision_poll.policy(), timeout)?;
                orchestrator = orchestrator.with_strategy(CloudVisionStrategy::new(client));
            }
            orchestrator = orchestrator.with_strategy(local_ocr_strategy(config));
        }

        info!(
            "Extraction orchestrator ready: strategies={:?}, constrained={}",
            orchestrator.registered(),
            settings.constrained
        );
        Ok(orchestrator)
    }

    /// Kinds of the registered strategies.
    pub fn registered(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    fn strategy(&self, kind: StrategyKind) -> Option<&dyn ExtractionStrategy> {
        self.strategies
            .iter()
            .find(|s| s.kind() == kind)
            .map(|s| s.as_ref())
    }

    /// Best-available text through the full cascade.
    pub fn extract(&self, document: &Document, options: &ExtractOptions) -> ExtractionOutcome {
        self.run(CascadeMode::Standard, document, options)
    }

    /// Strict variant: text layer, then exactly one document-intelligence job.
    pub fn extract_for_analysis(&self, document: &Document, options: &ExtractOptions) -> ExtractionOutcome {
        self.run(CascadeMode::Analysis, document, options)
    }

    /// Legacy entrypoint returning only the text.
    pub fn extract_text(&self, document: &Document, options: &ExtractOptions) -> Option<String> {
        self.extract(document, options).text
    }

    fn run(&self, mode: CascadeMode, document: &Document, options: &ExtractOptions) -> ExtractionOutcome {
        let class = document.mime_class();
        if class == MimeClass::Unsupported {
            warn!("No adapter for MIME type {:?}", document.mime_type());
            return ExtractionOutcome::none(false, Vec::new());
        }

        let ctx = StrategyContext {
            max_ocr_pages: options.max_ocr_pages.unwrap_or(self.settings.max_ocr_pages),
        };
        let rules = plan(mode, class, self.settings.constrained, options.force_ocr);
        debug!(
            "{:?} cascade for {:?}: {:?}",
            mode,
            class,
            rules.iter().map(|r| r.kind).collect::<Vec<_>>()
        );

        let mut attempts = Vec::with_capacity(rules.len());
        let mut recognition_ran = false;
        // Index into `attempts` of the first short but non-empty text
        let mut short: Option<usize> = None;

        for rule in rules {
            let Some(strategy) = self.strategy(rule.kind) else {
                debug!("{} not configured, skipping", rule.kind);
                continue;
            };
            recognition_ran |= rule.kind.is_recognition();

            let attempt = self.attempt(strategy, document, &ctx);
            if attempt.succeeded && self.accepts(rule.acceptance, &attempt.text) {
                info!("Accepted {} chars from {}", attempt.text_length(), rule.kind);
                let text = attempt.text.clone();
                attempts.push(attempt);
                return ExtractionOutcome {
                    text: Some(text),
                    path_taken: PathTaken::Strategy(rule.kind),
                    low_confidence: recognition_ran,
                    attempts,
                };
            }

            if attempt.succeeded {
                info!(
                    "{} returned {} chars, below the {} char threshold; escalating",
                    rule.kind,
                    attempt.text_length(),
                    self.settings.min_text_length
                );
                if short.is_none() {
                    short = Some(attempts.len());
                }
            }
            attempts.push(attempt);
        }

        match mode {
            CascadeMode::Standard => {
                if let Some(index) = short {
                    let fallback = &attempts[index];
                    info!(
                        "Falling back to {} chars of short text from {}",
                        fallback.text_length(),
                        fallback.strategy
                    );
                    let (kind, text) = (fallback.strategy, fallback.text.clone());
                    return ExtractionOutcome {
                        text: Some(text),
                        path_taken: PathTaken::Strategy(kind),
                        low_confidence: true,
                        attempts,
                    };
                }
                warn!("No strategy produced text for {:?}", class);
                ExtractionOutcome::none(recognition_ran, attempts)
            }
            CascadeMode::Analysis => {
                let visual = matches!(class, MimeClass::Pdf | MimeClass::Image);
                warn!("Analysis extraction produced no text for {:?}", class);
                ExtractionOutcome::none(visual, attempts)
            }
        }
    }

    fn accepts(&self, acceptance: Acceptance, text: &str) -> bool {
        match acceptance {
            Acceptance::MinLength => text.chars().count() >= self.settings.min_text_length,
            Acceptance::NonEmpty => !text.is_empty(),
        }
    }

    /// Run one strategy; errors and panics become an empty attempt.
    fn attempt(
        &self,
        strategy: &dyn ExtractionStrategy,
        document: &Document,
        ctx: &StrategyContext,
    ) -> ExtractionAttemptResult {
        let kind = strategy.kind();
        let start = Instant::now();

        let result = panic::catch_unwind(AssertUnwindSafe(|| strategy.try_extract(document, ctx)))
            .unwrap_or_else(|payload| Err(ExtractionError::from_message(panic_message(&payload))));

        let (text, error) = match result {
            Ok(text) => (text, None),
            Err(e) => {
                debug!("{} failed: {}", kind, e);
                (String::new(), Some(e))
            }
        };

        let attempt = ExtractionAttemptResult {
            succeeded: error.is_none() && !text.is_empty(),
            text,
            strategy: kind,
            error,
        };

        self.observer.on_attempt(&AttemptEvent {
            strategy: kind,
            succeeded: attempt.succeeded,
            duration_ms: start.elapsed().as_millis() as u64,
            text_length: attempt.text_length(),
            error_reason: attempt.error.as_ref().map(|e| e.reason().to_string()),
        });

        attempt
    }
}

#[cfg(feature = "native")]
fn local_ocr_strategy(config: &LexConfig) -> LocalOcrStrategy {
    match crate::ocr::PureOcrRecognizer::from_config(&config.ocr) {
        Ok(recognizer) => LocalOcrStrategy::new(Arc::new(recognizer), config.extraction.render_zoom),
        Err(e) => {
            warn!("Local OCR unavailable: {}", e);
            LocalOcrStrategy::unavailable()
        }
    }
}

#[cfg(not(feature = "native"))]
fn local_ocr_strategy(_config: &LexConfig) -> LocalOcrStrategy {
    LocalOcrStrategy::unavailable()
}

fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {}", s)
    } else {
        "panic in extraction strategy".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::extraction::RecordingObserver;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behavior {
        Text(String),
        Fail(&'static str),
        Panic,
    }

    struct StubStrategy {
        kind: StrategyKind,
        behavior: Behavior,
        calls: Arc<AtomicUsize>,
    }

    impl StubStrategy {
        fn new(kind: StrategyKind, behavior: Behavior) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (Self { kind, behavior, calls: calls.clone() }, calls)
        }
    }

    impl ExtractionStrategy for StubStrategy {
        fn kind(&self) -> StrategyKind {
            self.kind
        }

        fn try_extract(&self, _document: &Document, _ctx: &StrategyContext) -> std::result::Result<String, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Text(text) => Ok(text.clone()),
                Behavior::Fail(message) => Err(ExtractionError::from_message(*message)),
                Behavior::Panic => panic!("renderer crashed"),
            }
        }
    }

    fn settings(constrained: bool) -> OrchestratorSettings {
        OrchestratorSettings {
            min_text_length: 20,
            max_ocr_pages: 2,
            constrained,
        }
    }

    fn pdf() -> Document {
        Document::new(b"%PDF-1.7".to_vec(), "application/pdf")
    }

    fn long_text() -> String {
        "Policy schedule for the insured party".to_string()
    }

    #[test]
    fn test_native_text_above_threshold_short_circuits() {
        let (native, native_calls) = StubStrategy::new(StrategyKind::NativeText, Behavior::Text(long_text()));
        let (docintel, docintel_calls) =
            StubStrategy::new(StrategyKind::DocumentIntelligence, Behavior::Text("cloud".into()));
        let orchestrator = Orchestrator::new(settings(false))
            .with_strategy(native)
            .with_strategy(docintel);

        let outcome = orchestrator.extract(&pdf(), &ExtractOptions::default());

        assert_eq!(outcome.text, Some(long_text()));
        assert_eq!(outcome.path_taken, PathTaken::Strategy(StrategyKind::NativeText));
        assert!(!outcome.low_confidence);
        assert_eq!(native_calls.load(Ordering::SeqCst), 1);
        assert_eq!(docintel_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_short_native_text_escalates() {
        let (native, _) = StubStrategy::new(StrategyKind::NativeText, Behavior::Text("short".into()));
        let (docintel, docintel_calls) =
            StubStrategy::new(StrategyKind::DocumentIntelligence, Behavior::Text("cloud text".into()));
        let orchestrator = Orchestrator::new(settings(false))
            .with_strategy(native)
            .with_strategy(docintel);

        let outcome = orchestrator.extract(&pdf(), &ExtractOptions::default());

        assert_eq!(docintel_calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.text.as_deref(), Some("cloud text"));
        assert_eq!(outcome.path_taken, PathTaken::Strategy(StrategyKind::DocumentIntelligence));
        assert!(outcome.low_confidence);
        assert!(outcome.attempts[0].succeeded);
    }

    #[test]
    fn test_short_native_text_is_last_resort() {
        let (native, _) = StubStrategy::new(StrategyKind::NativeText, Behavior::Text("short".into()));
        let (ocr, ocr_calls) = StubStrategy::new(StrategyKind::LocalOcr, Behavior::Text(String::new()));
        let orchestrator = Orchestrator::new(settings(false))
            .with_strategy(native)
            .with_strategy(ocr);

        let outcome = orchestrator.extract(&pdf(), &ExtractOptions::default());

        assert_eq!(ocr_calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.text.as_deref(), Some("short"));
        assert_eq!(outcome.path_taken, PathTaken::Strategy(StrategyKind::NativeText));
        assert!(outcome.low_confidence);
    }

    #[test]
    fn test_short_hebrew_text_is_measured_in_chars() {
        // 11 chars, 21 bytes; the threshold is 20
        let hebrew = "פוליסה קצרה";
        let (native, _) = StubStrategy::new(StrategyKind::NativeText, Behavior::Text(hebrew.into()));
        let (ocr, ocr_calls) = StubStrategy::new(StrategyKind::LocalOcr, Behavior::Text(String::new()));
        let orchestrator = Orchestrator::new(settings(false))
            .with_strategy(native)
            .with_strategy(ocr);

        let outcome = orchestrator.extract(&pdf(), &ExtractOptions::default());

        assert_eq!(ocr_calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.text.as_deref(), Some(hebrew));
        assert!(outcome.low_confidence);
        assert_eq!(outcome.attempts[0].text_length(), 11);
    }

    #[test]
    fn test_constrained_mode_skips_local_and_vision() {
        let (native, _) = StubStrategy::new(StrategyKind::NativeText, Behavior::Text(String::new()));
        let (vision, vision_calls) = StubStrategy::new(StrategyKind::CloudVision, Behavior::Text("v".into()));
        let (ocr, ocr_calls) = StubStrategy::new(StrategyKind::LocalOcr, Behavior::Text("o".into()));
        let orchestrator = Orchestrator::new(settings(true))
            .with_strategy(native)
            .with_strategy(vision)
            .with_strategy(ocr);

        let outcome = orchestrator.extract(&pdf(), &ExtractOptions::default());

        assert_eq!(vision_calls.load(Ordering::SeqCst), 0);
        assert_eq!(ocr_calls.load(Ordering::SeqCst), 0);
        assert_eq!(outcome.text, None);
        assert_eq!(outcome.path_taken, PathTaken::None);
        assert!(!outcome.low_confidence);
    }

    #[test]
    fn test_image_cascade_order() {
        let observer = Arc::new(RecordingObserver::new());
        let (docintel, _) = StubStrategy::new(StrategyKind::DocumentIntelligence, Behavior::Fail("request timed out"));
        let (vision, _) = StubStrategy::new(StrategyKind::CloudVision, Behavior::Text(String::new()));
        let (ocr, _) = StubStrategy::new(StrategyKind::LocalOcr, Behavior::Text("ocr text".into()));
        let orchestrator = Orchestrator::new(settings(false))
            .with_strategy(ocr)
            .with_strategy(vision)
            .with_strategy(docintel)
            .with_observer(observer.clone());

        let image = Document::new(vec![0u8; 4], "image/jpeg");
        let outcome = orchestrator.extract(&image, &ExtractOptions::default());

        assert_eq!(outcome.text.as_deref(), Some("ocr text"));
        assert!(outcome.low_confidence);

        let events = observer.events();
        let order: Vec<StrategyKind> = events.iter().map(|e| e.strategy).collect();
        assert_eq!(
            order,
            vec![StrategyKind::DocumentIntelligence, StrategyKind::CloudVision, StrategyKind::LocalOcr]
        );
        assert_eq!(events[0].error_reason.as_deref(), Some("adapter_timeout"));
        assert_eq!(events[1].error_reason, None);
        assert_eq!(events[2].text_length, 8);
    }

    #[test]
    fn test_unsupported_mime_invokes_nothing() {
        let (native, native_calls) = StubStrategy::new(StrategyKind::NativeText, Behavior::Text(long_text()));
        let (flat, flat_calls) = StubStrategy::new(StrategyKind::FlatText, Behavior::Text(long_text()));
        let orchestrator = Orchestrator::new(settings(false))
            .with_strategy(native)
            .with_strategy(flat);

        let doc = Document::new(vec![1, 2, 3], "application/x-msdownload");
        let outcome = orchestrator.extract(&doc, &ExtractOptions::default());

        assert_eq!(outcome.text, None);
        assert!(outcome.attempts.is_empty());
        assert_eq!(native_calls.load(Ordering::SeqCst) + flat_calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            outcome.error(doc.mime_class(), doc.mime_type()),
            Some(ExtractionError::UnsupportedMime("application/x-msdownload".to_string()))
        );
    }

    #[test]
    fn test_panicking_strategy_is_contained() {
        let (native, _) = StubStrategy::new(StrategyKind::NativeText, Behavior::Panic);
        let (docintel, _) = StubStrategy::new(StrategyKind::DocumentIntelligence, Behavior::Text("rescued".into()));
        let orchestrator = Orchestrator::new(settings(false))
            .with_strategy(native)
            .with_strategy(docintel);

        let outcome = orchestrator.extract(&pdf(), &ExtractOptions::default());

        assert_eq!(outcome.text.as_deref(), Some("rescued"));
        match &outcome.attempts[0].error {
            Some(ExtractionError::AdapterException { kind, message }) => {
                assert_eq!(*kind, FailureKind::Other);
                assert!(message.contains("renderer crashed"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_every_strategy_empty_yields_none() {
        let (native, _) = StubStrategy::new(StrategyKind::NativeText, Behavior::Fail("bad xref"));
        let (docintel, _) = StubStrategy::new(StrategyKind::DocumentIntelligence, Behavior::Text(String::new()));
        let orchestrator = Orchestrator::new(settings(true))
            .with_strategy(native)
            .with_strategy(docintel);

        let doc = pdf();
        let outcome = orchestrator.extract(&doc, &ExtractOptions::default());

        assert_eq!(outcome.text, None);
        assert!(outcome.low_confidence);
        assert_eq!(outcome.attempts.len(), 2);
        assert_eq!(outcome.error(doc.mime_class(), doc.mime_type()), Some(ExtractionError::InvalidDocument));
    }

    #[test]
    fn test_force_ocr_skips_native() {
        let (native, native_calls) = StubStrategy::new(StrategyKind::NativeText, Behavior::Text(long_text()));
        let (ocr, _) = StubStrategy::new(StrategyKind::LocalOcr, Behavior::Text("scanned".into()));
        let orchestrator = Orchestrator::new(settings(false))
            .with_strategy(native)
            .with_strategy(ocr);

        let options = ExtractOptions { force_ocr: true, ..Default::default() };
        let outcome = orchestrator.extract(&pdf(), &options);

        assert_eq!(native_calls.load(Ordering::SeqCst), 0);
        assert_eq!(outcome.text.as_deref(), Some("scanned"));
    }

    #[test]
    fn test_flat_document_uses_single_adapter() {
        let (flat, flat_calls) = StubStrategy::new(StrategyKind::FlatText, Behavior::Text("tiny".into()));
        let (docintel, docintel_calls) =
            StubStrategy::new(StrategyKind::DocumentIntelligence, Behavior::Text("cloud".into()));
        let orchestrator = Orchestrator::new(settings(false))
            .with_strategy(flat)
            .with_strategy(docintel);

        let doc = Document::new(b"tiny".to_vec(), "text/plain");
        let outcome = orchestrator.extract(&doc, &ExtractOptions::default());

        assert_eq!(outcome.text.as_deref(), Some("tiny"));
        assert!(!outcome.low_confidence);
        assert_eq!(flat_calls.load(Ordering::SeqCst), 1);
        assert_eq!(docintel_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_analysis_mode_single_cloud_job() {
        let (native, _) = StubStrategy::new(StrategyKind::NativeText, Behavior::Text("short".into()));
        let (docintel, docintel_calls) =
            StubStrategy::new(StrategyKind::DocumentIntelligence, Behavior::Fail("job failed"));
        let (vision, vision_calls) = StubStrategy::new(StrategyKind::CloudVision, Behavior::Text("v".into()));
        let (ocr, ocr_calls) = StubStrategy::new(StrategyKind::LocalOcr, Behavior::Text("o".into()));
        let orchestrator = Orchestrator::new(settings(false))
            .with_strategy(native)
            .with_strategy(docintel)
            .with_strategy(vision)
            .with_strategy(ocr);

        let outcome = orchestrator.extract_for_analysis(&pdf(), &ExtractOptions::default());

        assert_eq!(outcome.text, None);
        assert!(outcome.low_confidence);
        assert_eq!(docintel_calls.load(Ordering::SeqCst), 1);
        assert_eq!(vision_calls.load(Ordering::SeqCst) + ocr_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_analysis_mode_success_is_still_low_confidence() {
        let (docintel, _) =
            StubStrategy::new(StrategyKind::DocumentIntelligence, Behavior::Text("recognised".into()));
        let orchestrator = Orchestrator::new(settings(false)).with_strategy(docintel);

        let image = Document::new(vec![0u8; 4], "image/png");
        let outcome = orchestrator.extract_for_analysis(&image, &ExtractOptions::default());

        assert_eq!(outcome.text.as_deref(), Some("recognised"));
        assert!(outcome.low_confidence);
    }

    #[test]
    fn test_analysis_mode_native_text_is_confident() {
        let (native, _) = StubStrategy::new(StrategyKind::NativeText, Behavior::Text(long_text()));
        let orchestrator = Orchestrator::new(settings(false)).with_strategy(native);

        let outcome = orchestrator.extract_for_analysis(&pdf(), &ExtractOptions::default());

        assert_eq!(outcome.text, Some(long_text()));
        assert!(!outcome.low_confidence);
    }

    #[test]
    fn test_with_strategy_replaces_same_kind() {
        let (first, first_calls) = StubStrategy::new(StrategyKind::FlatText, Behavior::Text("a".into()));
        let (second, _) = StubStrategy::new(StrategyKind::FlatText, Behavior::Text("b".into()));
        let orchestrator = Orchestrator::new(settings(false))
            .with_strategy(first)
            .with_strategy(second);

        assert_eq!(orchestrator.registered(), vec![StrategyKind::FlatText]);
        let doc = Document::new(b"x".to_vec(), "text/plain");
        assert_eq!(orchestrator.extract_text(&doc, &ExtractOptions::default()).as_deref(), Some("b"));
        assert_eq!(first_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_from_config_registers_only_configured_strategies() {
        let mut config = LexConfig::default();
        config.extraction.constrained_deployment = true;
        let orchestrator = Orchestrator::from_config(&config).unwrap();
        assert_eq!(
            orchestrator.registered(),
            vec![StrategyKind::NativeText, StrategyKind::FlatText]
        );
    }
}
