//! Reference numbers: market reference, certificate reference, line slip.
//!
//! Strict keyword patterns run first. Looser inline patterns are a fallback
//! because they also catch neighbouring text. A reference must contain at
//! least one digit.

use regex::Regex;

use super::labels::next_line_value;
use super::patterns::{
    CERTIFICATE_LABEL_LINE, CERTIFICATE_LOOSE, CERTIFICATE_STRICT, LINE_SLIP_LABEL_LINE,
    LINE_SLIP_LOOSE, LINE_SLIP_STRICT, MARKET_REF_LABEL_LINE, MARKET_REF_LOOSE,
    MARKET_REF_STRICT, REFERENCE_TOKEN,
};
use super::{clean_value, first_match, Heuristic};

fn is_reference(token: &str) -> bool {
    token.len() >= 3 && token.chars().any(|c| c.is_ascii_digit())
}

/// First capture of `pattern` that looks like a reference.
fn captured_reference(text: &str, pattern: &Regex) -> Option<String> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| clean_value(m.as_str())))
        .find(|token| is_reference(token))
}

/// First reference-like token on the line after a label line.
fn reference_after_label(text: &str, label_line: &Regex) -> Option<String> {
    let line = next_line_value(text, label_line)?;
    REFERENCE_TOKEN
        .find_iter(&line)
        .map(|m| m.as_str().to_string())
        .find(|token| is_reference(token))
}

const MARKET_REF_HEURISTICS: [Heuristic<String>; 3] = [
    Heuristic::new("strict keyword", |t| captured_reference(t, &MARKET_REF_STRICT)),
    Heuristic::new("label line", |t| reference_after_label(t, &MARKET_REF_LABEL_LINE)),
    Heuristic::new("loose inline", |t| captured_reference(t, &MARKET_REF_LOOSE)),
];

const CERTIFICATE_HEURISTICS: [Heuristic<String>; 3] = [
    Heuristic::new("strict keyword", |t| captured_reference(t, &CERTIFICATE_STRICT)),
    Heuristic::new("label line", |t| reference_after_label(t, &CERTIFICATE_LABEL_LINE)),
    Heuristic::new("loose inline", |t| captured_reference(t, &CERTIFICATE_LOOSE)),
];

const LINE_SLIP_HEURISTICS: [Heuristic<String>; 3] = [
    Heuristic::new("strict keyword", |t| captured_reference(t, &LINE_SLIP_STRICT)),
    Heuristic::new("label line", |t| reference_after_label(t, &LINE_SLIP_LABEL_LINE)),
    Heuristic::new("loose inline", |t| captured_reference(t, &LINE_SLIP_LOOSE)),
];

pub fn market_ref(text: &str) -> Option<String> {
    first_match("marketRef", text, &MARKET_REF_HEURISTICS)
}

pub fn certificate_ref(text: &str) -> Option<String> {
    first_match("certificateRef", text, &CERTIFICATE_HEURISTICS)
}

pub fn line_slip_no(text: &str) -> Option<String> {
    first_match("lineSlipNo", text, &LINE_SLIP_HEURISTICS)
}
