//! Regex patterns for policy schedule fields, English and Hebrew.

use lazy_static::lazy_static;
use regex::Regex;

/// Month names recognised inside dates.
const MONTHS: &str = r"jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?|ב?(?:ינואר|פברואר|מרץ|מרס|אפריל|מאי|יוני|יולי|אוגוסט|ספטמבר|אוקטובר|נובמבר|דצמבר)";

/// The single date grammar shared by every date pattern.
///
/// Day-month-year and year-month-day with `.`, `/` or `-` separators, plus
/// "1 January 2020", "1st Jan. 2020" and "January 1, 2020".
pub const DATE_FRAGMENT: &str = r"\b(?:\d{1,2}[./\-]\d{1,2}[./\-](?:\d{4}|\d{2})|\d{4}[./\-]\d{1,2}[./\-]\d{1,2}|\d{1,2}(?:st|nd|rd|th)?\s+(?:MONTHS)\.?,?\s+\d{4}|(?:MONTHS)\.?\s+\d{1,2}(?:st|nd|rd|th)?,?\s+\d{4})\b";

/// Words joining the two ends of a range.
const RANGE_JOIN: &str = r"(?:-|\bto\b|\buntil\b|\btill\b|\bthrough\b|ו?עד)";

const RETRO_KEYWORDS: &str = r"retro(?:active)?(?:\s+(?:date|period|cover))?|תאריך\s+רטרו(?:אקטיבי)?|רטרו(?:אקטיבי)?|תחולה\s+למפרע";

const PERIOD_KEYWORDS: &str = r"period\s+of\s+(?:insurance|cover)|policy\s+period|insurance\s+period|תקופת\s+ה?ביטוח|תקופת\s+הפוליסה";

const FROM_WORDS: &str = r"(?:\bfrom|\bמתאריך|\bמיום|\bמ-)";

const INSURED_LABELS: &str = r"name\s+of\s+(?:the\s+)?insured|insured(?:'s)?\s+name|the\s+insured|insured|assured|policy\s*holder|שם\s+המבוטח|המבוטח|מבוטח";

const MARKET_REF_LABELS: &str = r"unique\s+market\s+reference|market\s+ref(?:erence)?|umr";

const CERTIFICATE_LABELS: &str = r"certificate\s+(?:reference|ref\.?|number|no\.?)|מספר\s+תעודה|מס'\s+תעודה";

const LINE_SLIP_LABELS: &str = r"line\s*slip(?:\s+(?:no\.?|number|ref(?:erence)?))?";

/// Reference token: letters, digits and inner `-`, `/`, `.`.
const TOKEN: &str = r"[A-Z0-9](?:[A-Z0-9\-/.]*[A-Z0-9])?";

fn compile(pattern: &str) -> Regex {
    let expanded = pattern
        .replace("{DATE}", DATE_FRAGMENT)
        .replace("MONTHS", MONTHS)
        .replace("{JOIN}", RANGE_JOIN)
        .replace("{FROM}", FROM_WORDS)
        .replace("{RETRO}", RETRO_KEYWORDS)
        .replace("{PERIOD}", PERIOD_KEYWORDS)
        .replace("{INSURED}", INSURED_LABELS)
        .replace("{MARKET}", MARKET_REF_LABELS)
        .replace("{CERTIFICATE}", CERTIFICATE_LABELS)
        .replace("{LINE_SLIP}", LINE_SLIP_LABELS)
        .replace("{TOKEN}", TOKEN);
    Regex::new(&expanded).unwrap()
}

lazy_static! {
    pub static ref DATE: Regex = compile(r"(?i){DATE}");

    // Date ranges
    pub static ref EXPLICIT_RANGE: Regex = compile(
        r"(?i){FROM}[ \t]*:?[ \t]*({DATE})[ \t,]*\s*(?:\bto\b|\buntil\b|\btill\b|\bthrough\b|ו?עד)[ \t]*(?:תאריך|ליום|יום)?[ \t]*:?[ \t]*({DATE})"
    );

    pub static ref PERIOD_RANGE: Regex = compile(
        r"(?i)(?:{PERIOD})[^\d]{0,60}?({DATE})\s*{JOIN}\s*({DATE})"
    );

    pub static ref GENERIC_RANGE: Regex = compile(
        r"(?i)({DATE})[ \t]*{JOIN}[ \t]*({DATE})"
    );

    pub static ref RETRO_KEYWORD: Regex = compile(r"(?i)\b(?:{RETRO})\b");

    pub static ref RETRO_EXPLICIT_RANGE: Regex = compile(
        r"(?i)\b(?:{RETRO})[^\d\n]{0,40}?{FROM}[ \t]*:?[ \t]*({DATE})\s*(?:\bto\b|\buntil\b|\btill\b|\bthrough\b|ו?עד)\s*({DATE})"
    );

    pub static ref RETRO_RANGE: Regex = compile(
        r"(?i)\b(?:{RETRO})[^\d]{0,40}?({DATE})\s*{JOIN}\s*({DATE})"
    );

    pub static ref RETRO_DATE: Regex = compile(
        r"(?i)\b(?:{RETRO})[^\d]{0,40}?({DATE})"
    );

    // Insured name
    pub static ref INSURED_INLINE: Regex = compile(
        r"(?i)\b(?:{INSURED})[ \t]*[:：][ \t]*([^\n]+)"
    );

    pub static ref INSURED_LABEL_LINE: Regex = compile(
        r"(?i)^[ \t]*(?:{INSURED})[ \t]*[:：]?[ \t]*$"
    );

    pub static ref INSURED_TABLE: Regex = compile(
        r"(?im)^[ \t|]*(?:{INSURED})(?:\t+|[ \t]{2,}|[ \t]*\|)[ \t]*([^\n|]+)"
    );

    // Market reference
    pub static ref MARKET_REF_STRICT: Regex = compile(
        r"(?i)\b(?:{MARKET})(?:[ \t]+(?:no\.?|number))?[ \t]*[:#]?[ \t]*({TOKEN})"
    );

    pub static ref MARKET_REF_LABEL_LINE: Regex = compile(
        r"(?i)^[ \t]*(?:{MARKET})(?:[ \t]+(?:no\.?|number))?[ \t]*[:#]?[ \t]*$"
    );

    pub static ref MARKET_REF_LOOSE: Regex = compile(
        r"(?i)\b(UMR[\-:]?[ \t]*{TOKEN}|B\d{4}[A-Z0-9]{4,})\b"
    );

    // Certificate reference
    pub static ref CERTIFICATE_STRICT: Regex = compile(
        r"(?i)\b(?:{CERTIFICATE})[ \t]*[:#]?[ \t]*({TOKEN})"
    );

    pub static ref CERTIFICATE_LABEL_LINE: Regex = compile(
        r"(?i)^[ \t]*(?:{CERTIFICATE})[ \t]*[:#]?[ \t]*$"
    );

    pub static ref CERTIFICATE_LOOSE: Regex = compile(
        r"(?i)\b(?:cert(?:ificate)?\.?|תעודה)[ \t]*(?:no\.?|#)?[ \t]*[:\-]?[ \t]*({TOKEN})"
    );

    // Line slip
    pub static ref LINE_SLIP_STRICT: Regex = compile(
        r"(?i)\bline\s*slip[ \t]+(?:no\.?|number|ref(?:erence)?)[ \t]*[:#]?[ \t]*({TOKEN})"
    );

    pub static ref LINE_SLIP_LABEL_LINE: Regex = compile(
        r"(?i)^[ \t]*(?:{LINE_SLIP})[ \t]*[:#]?[ \t]*$"
    );

    pub static ref LINE_SLIP_LOOSE: Regex = compile(
        r"(?i)\bline\s*slip[ \t]*[:#\-]?[ \t]*({TOKEN})"
    );

    /// A bare reference token, used on the line after a label line.
    pub static ref REFERENCE_TOKEN: Regex = compile(r"(?i)\b{TOKEN}");

    /// Labels of other fields; an inline value ends where one of these begins.
    pub static ref STOP_LABEL: Regex = compile(
        r"(?i)\b(?:{MARKET}|{CERTIFICATE}|{LINE_SLIP}|{PERIOD}|{RETRO}|policy\s+(?:no\.?|number)|insurers?|broker|address|כתובת|מבטח)\b"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_fragment_forms() {
        for date in [
            "01/02/2020",
            "1.2.20",
            "2020-02-01",
            "1 January 2020",
            "1st Jan. 2020",
            "January 1, 2020",
            "1 בינואר 2020",
        ] {
            assert!(DATE.is_match(date), "{date} should be a date");
        }
        assert!(!DATE.is_match("1234/56"));
        assert!(!DATE.is_match("12,500"));
    }

    #[test]
    fn test_stop_label_does_not_match_insured() {
        assert!(!STOP_LABEL.is_match("Test Insured Ltd."));
        assert!(STOP_LABEL.is_match("Acme UNIQUE MARKET REFERENCE"));
    }
}
