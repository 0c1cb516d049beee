//! Date-range recovery for the policy period and the retroactive period.

use regex::Captures;

use super::patterns::{
    EXPLICIT_RANGE, GENERIC_RANGE, PERIOD_RANGE, RETRO_DATE, RETRO_EXPLICIT_RANGE, RETRO_KEYWORD,
    RETRO_RANGE,
};
use super::{clean_value, first_match, Heuristic};

/// Start and end of a range, as written in the source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

impl DateRange {
    fn from_captures(caps: &Captures) -> Self {
        Self {
            start: caps.get(1).map(|m| clean_value(m.as_str())).unwrap_or_default(),
            end: caps.get(2).map(|m| clean_value(m.as_str())).unwrap_or_default(),
        }
    }
}

/// The line containing byte offset `at`.
fn line_at(text: &str, at: usize) -> &str {
    let start = text[..at].rfind('\n').map_or(0, |i| i + 1);
    let end = text[at..].find('\n').map_or(text.len(), |i| at + i);
    &text[start..end]
}

/// "From X to Y" anywhere outside a retroactive clause.
fn explicit_range(text: &str) -> Option<DateRange> {
    EXPLICIT_RANGE
        .captures_iter(text)
        .find(|caps| {
            let at = caps.get(0).map_or(0, |m| m.start());
            !RETRO_KEYWORD.is_match(line_at(text, at))
        })
        .map(|caps| DateRange::from_captures(&caps))
}

/// A range shortly after a period-of-insurance keyword.
fn keyword_range(text: &str) -> Option<DateRange> {
    PERIOD_RANGE
        .captures(text)
        .map(|caps| DateRange::from_captures(&caps))
}

/// First line with two dates joined by a dash or "to".
///
/// Last resort: nothing anchors this to the policy period.
fn generic_range(text: &str) -> Option<DateRange> {
    text.lines()
        .filter(|line| !RETRO_KEYWORD.is_match(line))
        .find_map(|line| GENERIC_RANGE.captures(line))
        .map(|caps| DateRange::from_captures(&caps))
}

fn retro_explicit_range(text: &str) -> Option<DateRange> {
    RETRO_EXPLICIT_RANGE
        .captures(text)
        .map(|caps| DateRange::from_captures(&caps))
}

fn retro_range(text: &str) -> Option<DateRange> {
    RETRO_RANGE
        .captures(text)
        .map(|caps| DateRange::from_captures(&caps))
}

/// A single retroactive date; the end stays empty.
fn retro_date(text: &str) -> Option<DateRange> {
    RETRO_DATE
        .captures(text)
        .map(|caps| DateRange::from_captures(&caps))
}

const POLICY_PERIOD_HEURISTICS: [Heuristic<DateRange>; 3] = [
    Heuristic::new("explicit from/to", explicit_range),
    Heuristic::new("period keyword", keyword_range),
    Heuristic::new("generic two-date line", generic_range),
];

const RETRO_HEURISTICS: [Heuristic<DateRange>; 3] = [
    Heuristic::new("explicit from/to", retro_explicit_range),
    Heuristic::new("retro keyword range", retro_range),
    Heuristic::new("retro keyword date", retro_date),
];

pub fn policy_period(text: &str) -> DateRange {
    first_match("policyPeriod", text, &POLICY_PERIOD_HEURISTICS).unwrap_or_default()
}

pub fn retro_period(text: &str) -> DateRange {
    first_match("retroPeriod", text, &RETRO_HEURISTICS).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn range(start: &str, end: &str) -> DateRange {
        DateRange {
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    #[test]
    fn test_explicit_range_wins_over_generic() {
        let text = "Invoice run 01/01/2020 - 02/01/2020\nInsurance from 15/06/2021 until 14/06/2022";
        assert_eq!(policy_period(text), range("15/06/2021", "14/06/2022"));
    }

    #[test]
    fn test_explicit_range_across_lines() {
        let text = "Period\nFrom: 2021-04-01\nTo: 2022-03-31";
        assert_eq!(policy_period(text), range("2021-04-01", "2022-03-31"));
    }

    #[test]
    fn test_keyword_range() {
        let text = "Policy Period\n1st July 2021 - 30th June 2022 (local standard time)";
        assert_eq!(policy_period(text), range("1st July 2021", "30th June 2022"));
    }

    #[test]
    fn test_generic_fallback() {
        assert_eq!(policy_period("Cover: 01.03.2023 to 29.02.2024"), range("01.03.2023", "29.02.2024"));
    }

    #[test]
    fn test_explicit_range_skips_retro_line() {
        let text = "Retroactive cover from 01/01/2010 to 31/12/2019\nPolicy Period: 01/01/2020 - 31/12/2020";
        assert_eq!(policy_period(text), range("01/01/2020", "31/12/2020"));
        assert_eq!(retro_period(text), range("01/01/2010", "31/12/2019"));
    }

    #[test]
    fn test_hebrew_explicit_range() {
        let text = "תקופת הביטוח מתאריך 01/01/2022 עד תאריך 31/12/2022";
        assert_eq!(policy_period(text), range("01/01/2022", "31/12/2022"));
    }

    #[test]
    fn test_single_retro_date() {
        assert_eq!(retro_period("Retro Date: March 1, 2016"), range("March 1, 2016", ""));
    }

    #[test]
    fn test_no_dates() {
        assert_eq!(policy_period("no period stated"), DateRange::default());
        assert_eq!(retro_period("retroactive: none"), DateRange::default());
    }
}
