//! Token-class patterns for fact protection.
//!
//! Patterns with a `value` group protect only that group; the rest of the
//! match (a keyword or title) stays editable.

use lazy_static::lazy_static;
use regex::Regex;

/// Comma-grouped, dot-grouped (`1.000,50`), then plain.
const NUM: &str = r"\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d{1,3}(?:\.\d{3})+(?:,\d+)?|\d+(?:[.,]\d+)?";

const CURRENCY_PREFIX: &str = r#"[₪$€£]|\b(?:NIS|ILS|USD|EUR|GBP)\b"#;

const CURRENCY_SUFFIX: &str = r#"[₪$€£]|(?:NIS|ILS|USD|EUR|GBP)\b|ש"ח|ש״ח|שקלים|שקל\b|(?:dollars?|euros?|pounds?|shekels?)\b"#;

const EN_NUMBER_WORD: &str = r"seventeen|thirteen|fourteen|eighteen|nineteen|fifteen|sixteen|eleven|twelve|twenty|thirty|forty|fifty|sixty|seventy|eighty|ninety|hundred|thousand|million|billion|zero|one|two|three|four|five|six|seven|eight|nine|ten";

const HE_NUMBER_WORD: &str = r"אחד|אחת|שתיים|שתים|שניים|שני|שתי|שלושים|שלושה|שלוש|ארבעים|ארבעה|ארבע|חמישים|חמישה|חמש|שישים|שישה|שש|שבעים|שבעה|שבע|שמונים|שמונה|תשעים|תשעה|תשע|עשרים|עשרה|עשר|מאתיים|מאות|מאה|אלפיים|אלפים|אלף|מיליונים|מיליון";

/// A Hebrew word, allowing geresh and gershayim inside.
const HE_WORD: &str = r#"[\u05D0-\u05EA][\u05D0-\u05EA'׳"״\-]*"#;

const LATIN_NAME_WORD: &str = r"[A-Z][a-z]+(?:-[A-Z][a-z]+)?";

const HE_TITLES: &str = r#"עו"ד|עו״ד|עוה"ד|עוה״ד|ד"ר|ד״ר|פרופ'|פרופ׳|רו"ח|רו״ח|גב'|גב׳|גברת|מר|השופטת|השופט|כב'|כב׳|אינג'"#;

const HE_ROLES: &str = r"תובעים|תובעת|תובע|נתבעים|נתבעת|נתבע|מבוטחת|מבוטח|מערערת|מערער|משיבה|משיב|ניזוקה|ניזוק|עדה|עד";

const EN_ROLES: &str = r"plaintiff|claimant|defendant|insured|witness|appellant|respondent|injured\s+party";

fn compile(pattern: &str) -> Regex {
    let expanded = pattern
        .replace("{NUM}", NUM)
        .replace("{CUR_PRE}", CURRENCY_PREFIX)
        .replace("{CUR_SUF}", CURRENCY_SUFFIX)
        .replace("{EN_NUM}", EN_NUMBER_WORD)
        .replace("{HE_NUM}", HE_NUMBER_WORD)
        .replace("{HE_WORD}", HE_WORD)
        .replace("{LATIN}", LATIN_NAME_WORD)
        .replace("{HE_TITLES}", HE_TITLES)
        .replace("{HE_ROLES}", HE_ROLES)
        .replace("{EN_ROLES}", EN_ROLES);
    Regex::new(&expanded).unwrap()
}

lazy_static! {
    /// `⟦KIND_n⟧`; the brackets never occur in ordinary text.
    pub static ref PLACEHOLDER: Regex = Regex::new(r"⟦[A-Z]+_\d+⟧").unwrap();

    pub static ref MONEY: Regex = compile(
        r"(?i)(?:{CUR_PRE})[ \t]?(?:{NUM})(?:[ \t]?(?:million|thousand|מיליון|אלף)\b)?|(?:{NUM})[ \t]?(?:million[ \t]|thousand[ \t])?(?:{CUR_SUF})"
    );

    pub static ref PERCENT: Regex = compile(
        r"(?i)(?:{NUM})[ \t]?(?:%|percent\b|per[ \t]+cent\b|אחוזים|אחוז)"
    );

    pub static ref IDENTIFIER: Regex = compile(
        r#"(?i)(?:\b(?:case|claim|policy|file|docket|certificate|account|invoice|ref(?:erence)?)(?:[ \t]+(?:no\.?|number|#))?|תיק|ת"א|ת״א|תא"מ|תא״מ|ע"א|ע״א|רע"א|רע״א|ה"פ|ה״פ|בש"א|בש״א|פוליסה|תביעה|חשבון|מס'|מס׳|מספר)[ \t]*[:#.]?[ \t]*(?P<value>(?:[A-Z]{1,5}[\-/])?\d[A-Z0-9]*(?:[\-/.][A-Z0-9]+)*)"#
    );

    pub static ref NUMBER: Regex = Regex::new(r"\b\d+(?:[.,]\d+)*\b").unwrap();

    pub static ref EN_SPELLED_NUMBER: Regex = compile(
        r"(?i)\b(?:{EN_NUM})(?:(?:[ \t]+and[ \t]+|[ \t]+|-)(?:{EN_NUM}))*\b"
    );

    pub static ref HE_SPELLED_NUMBER: Regex = compile(
        r"\bו?(?:{HE_NUM})(?:[ \t]+ו?(?:{HE_NUM}))*\b"
    );

    pub static ref LATIN_NAME: Regex = compile(r"\b{LATIN}(?:[ \t]+{LATIN})+\b");

    pub static ref HE_TITLED_NAME: Regex = compile(
        r"\b(?:{HE_TITLES})[ \t]+(?P<value>{HE_WORD}(?:[ \t]+{HE_WORD})?)"
    );

    pub static ref ROLE_NAME: Regex = compile(
        r#"(?:\b[ושלבכמ]?ה(?:{HE_ROLES})|(?i:\bthe[ \t]+(?:{EN_ROLES})))[,:]?[ \t]+(?:(?:מר|גב'|גב׳|גברת|עו"ד|עו״ד|ד"ר|ד״ר)[ \t]+)?(?P<value>{HE_WORD}(?:[ \t]+{HE_WORD})?)"#
    );

    pub static ref INITIALS_NAME: Regex = compile(r"\b(?:[A-Z]\.[ \t]?){1,3}{LATIN}\b");

    /// Hebrew initials need a preceding word on the same line; a letter
    /// opening a line is a list marker.
    pub static ref HE_INITIALS_NAME: Regex = Regex::new(
        r"(?P<lead>\S+)[ \t]+(?P<value>(?:[\u05D0-\u05EA][.'׳][ \t]?){1,2}[\u05D0-\u05EA]{2,})"
    )
    .unwrap();
}

/// Words that follow a title or role but are not names.
pub const NAME_STOPWORDS: &[&str] = &[
    "כי", "את", "של", "על", "לא", "גם", "אשר", "זה", "זו", "הוא", "היא", "טען", "טענה", "טוען",
    "טוענת", "קבע", "קבעה", "ציין", "ציינה", "הגיש", "הגישה", "מסר", "מסרה", "אמר", "אמרה", "עצמו",
    "עצמה", "ביום", "בתאריך", "לבית", "בבית", "עבור", "היה", "הייתה", "מר", "גב'", "גב׳", "גברת",
    "עו\"ד", "עו״ד", "ד\"ר", "ד״ר",
];

/// Nouns that introduce a lettered clause, annex or item rather than a name.
pub const ENUMERATION_NOUNS: &[&str] = &[
    "נספח", "נספחים", "סעיף", "סעיפים", "ס\"ק", "ס״ק", "פרק", "חלק", "פסקה", "פסקאות", "מוצג",
    "טבלה", "עמוד", "שלב", "חלופה", "תוספת", "פריט", "רשימה",
];
