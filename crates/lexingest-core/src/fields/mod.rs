//! Structured policy field extraction from free text.
//!
//! Every field is recovered by an ordered list of heuristics; the first one
//! that yields a non-empty value wins. Values are whitespace-collapsed
//! substrings of the normalized input and are never synthesized.

mod dates;
mod identifiers;
mod labels;
pub mod patterns;

pub use dates::{policy_period, retro_period, DateRange};
pub use identifiers::{certificate_ref, line_slip_no, market_ref};
pub use labels::insured_name;

use tracing::debug;

use crate::models::fields::StructuredPolicyFields;

/// One named way of finding a value.
pub struct Heuristic<T> {
    pub name: &'static str,
    pub run: fn(&str) -> Option<T>,
}

impl<T> Heuristic<T> {
    pub const fn new(name: &'static str, run: fn(&str) -> Option<T>) -> Self {
        Self { name, run }
    }
}

/// Run heuristics in order and keep the first hit.
pub(crate) fn first_match<T>(field: &str, text: &str, heuristics: &[Heuristic<T>]) -> Option<T> {
    heuristics.iter().find_map(|h| {
        let found = (h.run)(text);
        if found.is_some() {
            debug!("{} matched by {}", field, h.name);
        }
        found
    })
}

/// Fold typographic variants to plain forms.
///
/// Non-breaking and other Unicode spaces become ASCII spaces, `\r\n` and
/// lone `\r` become `\n`, and dash glyphs (including the Hebrew maqaf)
/// become `-`.
pub fn normalize(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    text.chars()
        .map(|c| match c {
            '\r' => '\n',
            '\u{00A0}' | '\u{2007}' | '\u{202F}' | '\u{2009}' | '\u{200A}' | '\u{3000}' => ' ',
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}'
            | '\u{2212}' | '\u{05BE}' | '\u{FE58}' | '\u{FE63}' | '\u{FF0D}' => '-',
            c => c,
        })
        .filter(|c| !matches!(c, '\u{200E}' | '\u{200F}' | '\u{FEFF}'))
        .collect()
}

/// Collapse inner whitespace and trim whitespace and trailing separators.
pub fn clean_value(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches([',', ';', ':', '|', '-'])
        .trim()
        .to_string()
}

pub(crate) fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

/// Recover the structured fields from raw extracted text. Never fails.
pub fn extract_fields(text: &str) -> StructuredPolicyFields {
    let text = normalize(text);
    let period = policy_period(&text);
    let retro = retro_period(&text);

    let fields = StructuredPolicyFields {
        insured_name: insured_name(&text).unwrap_or_default(),
        market_ref: market_ref(&text).unwrap_or_default(),
        line_slip_no: line_slip_no(&text).unwrap_or_default(),
        certificate_ref: certificate_ref(&text).unwrap_or_default(),
        policy_period_start: period.start,
        policy_period_end: period.end,
        retro_start: retro.start,
        retro_end: retro.end,
    };

    debug!(
        "Extracted {} of {} policy fields",
        fields.entries().iter().filter(|(_, v)| !v.is_empty()).count(),
        StructuredPolicyFields::FIELD_NAMES.len()
    );
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize() {
        assert_eq!(
            normalize("a\u{00A0}b\r\nc\rd 01\u{2013}02 \u{05D0}\u{05BE}\u{05D1}"),
            "a b\nc\nd 01-02 \u{05D0}-\u{05D1}"
        );
    }

    #[test]
    fn test_clean_value() {
        assert_eq!(clean_value("  Acme \t  Holdings   Ltd ,"), "Acme Holdings Ltd");
        assert_eq!(clean_value(" \n "), "");
    }

    #[test]
    fn test_schedule_scenario() {
        let fields = extract_fields(
            "Insured: Test Insured Ltd. UNIQUE MARKET REFERENCE UMR-TEST-123 CERTIFICATE REFERENCE 987654",
        );
        assert!(fields.insured_name.contains("Test Insured"));
        assert!(fields.market_ref.to_lowercase().contains("umr"));
        assert_eq!(fields.certificate_ref, "987654");
    }

    #[test]
    fn test_full_schedule() {
        let text = "\
SCHEDULE
Name of Insured:   Northwind  Logistics Ltd
Unique Market Reference: B0180FN2100123
Line Slip No: LS-2021/045
Certificate Number: C-99812
Period of Insurance: From 01/04/2021 To 31/03/2022 both days inclusive
Retroactive Date: 01/04/2015
";
        let fields = extract_fields(text);
        assert_eq!(
            fields,
            StructuredPolicyFields {
                insured_name: "Northwind Logistics Ltd".to_string(),
                market_ref: "B0180FN2100123".to_string(),
                line_slip_no: "LS-2021/045".to_string(),
                certificate_ref: "C-99812".to_string(),
                policy_period_start: "01/04/2021".to_string(),
                policy_period_end: "31/03/2022".to_string(),
                retro_start: "01/04/2015".to_string(),
                retro_end: String::new(),
            }
        );
    }

    #[test]
    fn test_explicit_range_beats_generic_line() {
        let text = "Printed 05/05/2019 - 06/05/2019\nCover runs from 1 January 2021 to 31 December 2021";
        let fields = extract_fields(text);
        assert_eq!(fields.policy_period_start, "1 January 2021");
        assert_eq!(fields.policy_period_end, "31 December 2021");
    }

    #[test]
    fn test_hebrew_schedule() {
        let text = "שם המבוטח: חברת הדוגמה בע\"מ\nתקופת הביטוח: 01.01.2022 \u{2013} 31.12.2022";
        let fields = extract_fields(text);
        assert_eq!(fields.insured_name, "חברת הדוגמה בע\"מ");
        assert_eq!(fields.policy_period_start, "01.01.2022");
        assert_eq!(fields.policy_period_end, "31.12.2022");
    }

    #[test]
    fn test_empty_text_yields_empty_fields() {
        assert!(extract_fields("").is_empty());
        assert!(extract_fields("nothing useful here").is_empty());
    }

    #[test]
    fn test_values_are_substrings_of_source() {
        let text = "Insured:\tBlue   Harbour Marine\nUMR: B1234XY5678\nRetroactive period: 01/01/2010 - 31/12/2012";
        let fields = extract_fields(text);
        let collapsed = clean_value(&normalize(text));
        for (name, value) in fields.entries() {
            assert!(collapsed.contains(value), "{name} = {value:?} not in source");
        }
        assert_eq!(fields.retro_start, "01/01/2010");
        assert_eq!(fields.retro_end, "31/12/2012");
        assert_eq!(fields.policy_period_start, "");
    }
}
