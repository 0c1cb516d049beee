//! Declarative strategy ordering: which strategy runs for which MIME class,
//! in which deployment mode, and what output it must produce to be accepted.

use crate::models::document::{MimeClass, StrategyKind};

/// What a strategy's output must satisfy to end the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    /// At least the configured minimum text length.
    MinLength,
    /// Any non-empty text.
    NonEmpty,
}

/// One row of a cascade table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeRule {
    pub kind: StrategyKind,
    pub applies_to: &'static [MimeClass],
    /// Skipped in a constrained deployment.
    pub unconstrained_only: bool,
    /// Skipped when the caller forces OCR.
    pub skipped_by_force_ocr: bool,
    pub acceptance: Acceptance,
}

impl CascadeRule {
    pub fn is_eligible(&self, class: MimeClass, constrained: bool, force_ocr: bool) -> bool {
        self.applies_to.contains(&class)
            && !(self.unconstrained_only && constrained)
            && !(self.skipped_by_force_ocr && force_ocr)
    }
}

const VISUAL: &[MimeClass] = &[MimeClass::Pdf, MimeClass::Image];
const FLAT: &[MimeClass] = &[MimeClass::WordProcessor, MimeClass::PlainText, MimeClass::Json];

const NATIVE_RULE: CascadeRule = CascadeRule {
    kind: StrategyKind::NativeText,
    applies_to: &[MimeClass::Pdf],
    unconstrained_only: false,
    skipped_by_force_ocr: true,
    acceptance: Acceptance::MinLength,
};

const FLAT_RULE: CascadeRule = CascadeRule {
    kind: StrategyKind::FlatText,
    applies_to: FLAT,
    unconstrained_only: false,
    skipped_by_force_ocr: false,
    acceptance: Acceptance::NonEmpty,
};

const DOCUMENT_INTELLIGENCE_RULE: CascadeRule = CascadeRule {
    kind: StrategyKind::DocumentIntelligence,
    applies_to: VISUAL,
    unconstrained_only: false,
    skipped_by_force_ocr: false,
    acceptance: Acceptance::NonEmpty,
};

/// Full cost-ascending cascade.
pub const STANDARD_CASCADE: &[CascadeRule] = &[
    NATIVE_RULE,
    FLAT_RULE,
    DOCUMENT_INTELLIGENCE_RULE,
    CascadeRule {
        kind: StrategyKind::CloudVision,
        applies_to: VISUAL,
        unconstrained_only: true,
        skipped_by_force_ocr: false,
        acceptance: Acceptance::NonEmpty,
    },
    CascadeRule {
        kind: StrategyKind::LocalOcr,
        applies_to: VISUAL,
        unconstrained_only: true,
        skipped_by_force_ocr: false,
        acceptance: Acceptance::NonEmpty,
    },
];

/// Strict cascade: text layer, then at most one document-intelligence job.
pub const ANALYSIS_CASCADE: &[CascadeRule] = &[NATIVE_RULE, FLAT_RULE, DOCUMENT_INTELLIGENCE_RULE];

/// How the orchestrator treats a cascade's end state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeMode {
    /// Best-available text; a short text layer is returned if nothing better came along.
    Standard,
    /// No partial results; visual documents without a text layer are always low confidence.
    Analysis,
}

impl CascadeMode {
    pub fn rules(self) -> &'static [CascadeRule] {
        match self {
            CascadeMode::Standard => STANDARD_CASCADE,
            CascadeMode::Analysis => ANALYSIS_CASCADE,
        }
    }
}

/// Eligible rules for a call, in order.
pub(crate) fn plan(
    mode: CascadeMode,
    class: MimeClass,
    constrained: bool,
    force_ocr: bool,
) -> Vec<CascadeRule> {
    mode.rules()
        .iter()
        .filter(|rule| rule.is_eligible(class, constrained, force_ocr))
        .copied()
        .collect()
}
