//! Label/value heuristics shared by text fields.

use regex::Regex;

use super::patterns::{INSURED_INLINE, INSURED_LABEL_LINE, INSURED_TABLE, STOP_LABEL};
use super::{clean_value, first_match, non_empty, Heuristic};

/// Cut a captured value where another field's label starts.
fn truncate_at_stop_label(value: &str) -> &str {
    match STOP_LABEL.find(value) {
        Some(m) => &value[..m.start()],
        None => value,
    }
}

/// `Label: value` on one line. The value is the first capture group.
pub(crate) fn inline_value(text: &str, pattern: &Regex) -> Option<String> {
    pattern.captures_iter(text).find_map(|caps| {
        let value = caps.get(1)?.as_str();
        non_empty(clean_value(truncate_at_stop_label(value)))
    })
}

/// A line holding only the label; the value is the next non-blank line.
pub(crate) fn next_line_value(text: &str, label_line: &Regex) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();

    for (i, line) in lines.iter().enumerate() {
        if !label_line.is_match(line) {
            continue;
        }
        let Some(next) = lines[i + 1..].iter().find(|l| !l.trim().is_empty()) else {
            continue;
        };
        if let Some(value) = non_empty(clean_value(truncate_at_stop_label(next))) {
            return Some(value);
        }
    }
    None
}

/// Label and value in separate cells of the same row.
pub(crate) fn table_value(text: &str, pattern: &Regex) -> Option<String> {
    inline_value(text, pattern)
}

const INSURED_HEURISTICS: [Heuristic<String>; 3] = [
    Heuristic::new("inline label", |t| inline_value(t, &INSURED_INLINE)),
    Heuristic::new("label line", |t| next_line_value(t, &INSURED_LABEL_LINE)),
    Heuristic::new("table row", |t| table_value(t, &INSURED_TABLE)),
];

pub fn insured_name(text: &str) -> Option<String> {
    first_match("insuredName", text, &INSURED_HEURISTICS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_stops_at_next_label() {
        assert_eq!(
            insured_name("The Insured: Harbour Foods Ltd  Policy No: 7781").as_deref(),
            Some("Harbour Foods Ltd")
        );
    }

    #[test]
    fn test_next_line() {
        let text = "Assured\n\n  Kestrel Aviation Services  \nBroker: Smith & Co";
        assert_eq!(insured_name(text).as_deref(), Some("Kestrel Aviation Services"));
    }

    #[test]
    fn test_table_row() {
        let text = "Policyholder     Greenfield Farms Cooperative\nAddress          12 Mill Lane";
        assert_eq!(insured_name(text).as_deref(), Some("Greenfield Farms Cooperative"));
    }

    #[test]
    fn test_pipe_table_row() {
        assert_eq!(
            insured_name("| Insured | Orion Holdings |\n").as_deref(),
            Some("Orion Holdings")
        );
    }

    #[test]
    fn test_hebrew_next_line() {
        assert_eq!(insured_name("המבוטח:\nדני כהן").as_deref(), Some("דני כהן"));
    }

    #[test]
    fn test_label_without_value() {
        assert_eq!(insured_name("Insured:\nUnique Market Reference: B0180X1234"), None);
    }
}
