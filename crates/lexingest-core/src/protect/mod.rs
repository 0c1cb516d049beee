//! Fact protection for external rewriting.
//!
//! [`protect`] replaces amounts, percentages, dates, identifiers, numbers
//! and names with placeholder tokens so a rewriting service can change the
//! wording around them. [`restore`] puts the originals back and reports any
//! placeholder the rewrite dropped.

mod patterns;

pub use patterns::PLACEHOLDER;

use std::collections::HashSet;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use patterns::{
    ENUMERATION_NOUNS, EN_SPELLED_NUMBER, HE_INITIALS_NAME, HE_SPELLED_NUMBER, HE_TITLED_NAME,
    IDENTIFIER, INITIALS_NAME, LATIN_NAME, MONEY, NAME_STOPWORDS, NUMBER, PERCENT, ROLE_NAME,
};

/// Categories of protected fact, in the order they are scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactClass {
    Money,
    Percent,
    Date,
    Identifier,
    Number,
    SpelledNumber,
    Name,
}

impl FactClass {
    /// Tag used inside placeholder tokens.
    pub fn tag(self) -> &'static str {
        match self {
            FactClass::Money => "MONEY",
            FactClass::Percent => "PCT",
            FactClass::Date => "DATE",
            FactClass::Identifier => "REF",
            FactClass::Number => "NUM",
            FactClass::SpelledNumber => "NUMWORD",
            FactClass::Name => "NAME",
        }
    }
}

struct FactRule {
    class: FactClass,
    pattern: &'static Regex,
    accept: fn(&Captures) -> bool,
}

fn any_value(_: &Captures) -> bool {
    true
}

fn value_of<'t>(caps: &Captures<'t>) -> &'t str {
    caps.name("value").or_else(|| caps.get(0)).map_or("", |m| m.as_str())
}

fn not_stopword(caps: &Captures) -> bool {
    !value_of(caps)
        .split_whitespace()
        .any(|w| NAME_STOPWORDS.contains(&w))
}

/// A lone "one" is usually a pronoun ("no one", "the one who").
fn not_bare_one(caps: &Captures) -> bool {
    !value_of(caps).eq_ignore_ascii_case("one")
}

/// Rejects list markers such as `נספח ב'` or `1. א.`; the lead may carry
/// a prefix letter (`לסעיף`).
fn initials_not_enumeration(caps: &Captures) -> bool {
    let lead = caps.name("lead").map_or("", |m| m.as_str());
    lead.chars().any(char::is_alphabetic)
        && !ENUMERATION_NOUNS.iter().any(|noun| lead.ends_with(noun))
        && not_stopword(caps)
}

fn rules() -> [FactRule; 12] {
    [
        FactRule { class: FactClass::Money, pattern: &MONEY, accept: any_value },
        FactRule { class: FactClass::Percent, pattern: &PERCENT, accept: any_value },
        FactRule { class: FactClass::Date, pattern: &crate::fields::patterns::DATE, accept: any_value },
        FactRule { class: FactClass::Identifier, pattern: &IDENTIFIER, accept: any_value },
        FactRule { class: FactClass::Number, pattern: &NUMBER, accept: any_value },
        FactRule { class: FactClass::SpelledNumber, pattern: &EN_SPELLED_NUMBER, accept: not_bare_one },
        FactRule { class: FactClass::SpelledNumber, pattern: &HE_SPELLED_NUMBER, accept: any_value },
        FactRule { class: FactClass::Name, pattern: &LATIN_NAME, accept: any_value },
        FactRule { class: FactClass::Name, pattern: &HE_TITLED_NAME, accept: not_stopword },
        FactRule { class: FactClass::Name, pattern: &ROLE_NAME, accept: not_stopword },
        FactRule { class: FactClass::Name, pattern: &INITIALS_NAME, accept: any_value },
        FactRule { class: FactClass::Name, pattern: &HE_INITIALS_NAME, accept: initials_not_enumeration },
    ]
}

/// One placeholder and the text it stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderEntry {
    pub placeholder: String,
    pub original: String,
}

/// Placeholders in the order they were issued.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceholderMap {
    entries: Vec<PlaceholderEntry>,
}

impl PlaceholderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, placeholder: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.placeholder == placeholder)
            .map(|e| e.original.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlaceholderEntry> {
        self.entries.iter()
    }

    fn insert(&mut self, placeholder: String, original: String) {
        self.entries.push(PlaceholderEntry { placeholder, original });
    }
}

/// Output of [`protect`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectedText {
    pub protected_text: String,
    pub map: PlaceholderMap,
}

/// Output of [`restore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreReport {
    pub restored_text: String,
    /// Placeholders from the map that no longer appear in the text.
    pub missing_placeholders: Vec<String>,
}

impl RestoreReport {
    /// True when every protected fact came back.
    pub fn is_intact(&self) -> bool {
        self.missing_placeholders.is_empty()
    }
}

enum Segment {
    Text(String),
    Placeholder(String),
}

/// Per-call substitution state.
struct Protector {
    next_id: usize,
    reserved: HashSet<String>,
    map: PlaceholderMap,
}

impl Protector {
    fn new(reserved: HashSet<String>) -> Self {
        Self {
            next_id: 1,
            reserved,
            map: PlaceholderMap::new(),
        }
    }

    fn issue(&mut self, class: FactClass, original: &str) -> String {
        loop {
            let token = format!("⟦{}_{}⟧", class.tag(), self.next_id);
            self.next_id += 1;
            if !self.reserved.contains(&token) {
                self.map.insert(token.clone(), original.to_string());
                return token;
            }
        }
    }

    fn apply(&mut self, segments: Vec<Segment>, rule: &FactRule) -> Vec<Segment> {
        let mut out = Vec::with_capacity(segments.len());
        for segment in segments {
            match segment {
                Segment::Text(text) => self.split(&text, rule, &mut out),
                fixed => out.push(fixed),
            }
        }
        out
    }

    fn split(&mut self, text: &str, rule: &FactRule, out: &mut Vec<Segment>) {
        let mut last = 0;
        for caps in rule.pattern.captures_iter(text) {
            let Some(m) = caps.name("value").or_else(|| caps.get(0)) else {
                continue;
            };
            if m.start() < last || m.as_str().trim().is_empty() || !(rule.accept)(&caps) {
                continue;
            }
            if m.start() > last {
                out.push(Segment::Text(text[last..m.start()].to_string()));
            }
            out.push(Segment::Placeholder(self.issue(rule.class, m.as_str())));
            last = m.end();
        }
        if last < text.len() {
            out.push(Segment::Text(text[last..].to_string()));
        }
    }
}

/// Split on existing placeholder tokens; those are kept verbatim.
fn initial_segments(text: &str) -> (Vec<Segment>, HashSet<String>) {
    let mut segments = Vec::new();
    let mut reserved = HashSet::new();
    let mut last = 0;

    for m in PLACEHOLDER.find_iter(text) {
        if m.start() > last {
            segments.push(Segment::Text(text[last..m.start()].to_string()));
        }
        segments.push(Segment::Placeholder(m.as_str().to_string()));
        reserved.insert(m.as_str().to_string());
        last = m.end();
    }
    if last < text.len() {
        segments.push(Segment::Text(text[last..].to_string()));
    }
    (segments, reserved)
}

/// Replace every protected fact in `text` with a unique placeholder.
pub fn protect(text: &str) -> ProtectedText {
    let (mut segments, reserved) = initial_segments(text);
    if !reserved.is_empty() {
        debug!("Input already holds {} placeholder tokens", reserved.len());
    }

    let mut protector = Protector::new(reserved);
    for rule in rules().iter() {
        let before = protector.map.len();
        segments = protector.apply(segments, rule);
        let added = protector.map.len() - before;
        if added > 0 {
            debug!("Protected {} {:?} tokens", added, rule.class);
        }
    }

    let protected_text = segments
        .into_iter()
        .map(|s| match s {
            Segment::Text(t) | Segment::Placeholder(t) => t,
        })
        .collect();

    ProtectedText {
        protected_text,
        map: protector.map,
    }
}

/// Put the originals back and list the placeholders that went missing.
pub fn restore(protected_text: &str, map: &PlaceholderMap) -> RestoreReport {
    let missing_placeholders: Vec<String> = map
        .iter()
        .filter(|e| !protected_text.contains(&e.placeholder))
        .map(|e| e.placeholder.clone())
        .collect();

    let restored_text = PLACEHOLDER
        .replace_all(protected_text, |caps: &regex::Captures| {
            let token = &caps[0];
            map.get(token).unwrap_or(token).to_string()
        })
        .into_owned();

    if !missing_placeholders.is_empty() {
        warn!(
            "Rewrite dropped {} of {} protected facts: {:?}",
            missing_placeholders.len(),
            map.len(),
            missing_placeholders
        );
    }

    RestoreReport {
        restored_text,
        missing_placeholders,
    }
}
