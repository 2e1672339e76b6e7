//! Connector phrases ("for groceries", "at Trader Joe's") and the category
//! and merchant slots read from them.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

use super::amount::{currency_for_word, AmountMatch};

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\s,;:!?()]+").expect("valid regex"));

pub const CONNECTORS: &[&str] = &["for", "on", "at", "towards", "toward", "to", "in", "into", "with", "from"];

/// Words that end a connector phrase without being part of it.
const BOUNDARY_WORDS: &[&str] = &[
    "for", "on", "at", "towards", "toward", "to", "in", "into", "with", "from", "by", "split", "paid",
    "and", "today", "tonight", "tomorrow", "yesterday", "next", "this", "last", "please", "via", "using",
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];

const STOP_WORDS: &[&str] = &["the", "a", "an", "my", "our", "some", "his", "her", "their", "of", "me", "us"];

const CATEGORY_SYNONYMS: &[(&str, &str)] = &[
    ("gasoline", "gas"),
    ("fuel", "gas"),
    ("petrol", "gas"),
    ("grocery", "groceries"),
    ("groceries", "groceries"),
    ("supermarket", "groceries"),
    ("restaurant", "dining"),
    ("restaurants", "dining"),
    ("takeout", "dining"),
    ("eating out", "dining"),
    ("cab", "taxi"),
    ("coffees", "coffee"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub lower: String,
    pub span: Range<usize>,
}

pub fn tokens(text: &str) -> Vec<Token> {
    WORD.find_iter(text)
        .filter_map(|m| {
            let raw = m.as_str().trim_end_matches('.');
            if raw.is_empty() {
                return None;
            }
            Some(Token {
                text: raw.to_string(),
                lower: raw.to_lowercase(),
                span: m.start()..m.start() + raw.len(),
            })
        })
        .collect()
}

/// True for numbers and currency-marked numbers such as `$12` or `12.50`.
fn is_numeric(token: &Token) -> bool {
    token.lower.chars().any(|c| c.is_ascii_digit())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrase {
    pub connector: String,
    /// Original casing, single-spaced.
    pub text: String,
    pub span: Range<usize>,
}

impl Phrase {
    pub fn lower(&self) -> String {
        self.text.to_lowercase()
    }

    pub fn last_word(&self) -> String {
        self.lower().split_whitespace().last().unwrap_or_default().to_string()
    }
}

/// Every connector followed by at least one word, up to the next boundary.
pub fn connector_phrases(text: &str) -> Vec<Phrase> {
    let toks = tokens(text);
    let mut out = Vec::new();
    for (i, tok) in toks.iter().enumerate() {
        if !CONNECTORS.contains(&tok.lower.as_str()) {
            continue;
        }
        let body: Vec<&Token> = toks[i + 1..]
            .iter()
            .take_while(|t| !BOUNDARY_WORDS.contains(&t.lower.as_str()) && !is_numeric(t))
            .collect();
        if let (Some(first), Some(last)) = (body.first(), body.last()) {
            out.push(Phrase {
                connector: tok.lower.clone(),
                text: body.iter().map(|t| t.text.as_str()).collect::<Vec<_>>().join(" "),
                span: first.span.start..last.span.end,
            });
        }
    }
    out
}

/// Lower-cases, drops stop words and folds synonyms. `None` when nothing is left.
pub fn normalize_category(raw: &str) -> Option<String> {
    let words: Vec<String> = raw
        .to_lowercase()
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '&').to_string())
        .filter(|w| !w.is_empty() && !STOP_WORDS.contains(&w.as_str()))
        .collect();
    if words.is_empty() {
        return None;
    }
    let joined = words.join(" ");
    let folded = CATEGORY_SYNONYMS
        .iter()
        .find(|(from, _)| *from == joined)
        .map_or(joined.clone(), |(_, to)| to.to_string());
    Some(folded)
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySlots {
    pub category: Option<String>,
    pub merchant: Option<String>,
}

/// Reads category (`for`/`on`/`towards`) and merchant (`at`) phrases,
/// skipping spans already claimed by entity names. Without a category phrase
/// the one or two words right after the amount are used.
pub fn extract_category_and_merchant(
    text: &str,
    amount: Option<&AmountMatch>,
    claimed: &[Range<usize>],
) -> CategorySlots {
    let mut slots = CategorySlots::default();
    for phrase in connector_phrases(text) {
        if claimed.iter().any(|c| overlaps(c, &phrase.span)) {
            continue;
        }
        match phrase.connector.as_str() {
            "at" if slots.merchant.is_none() => {
                slots.merchant = Some(phrase.text.trim_matches(|c: char| c == '\'' || c == '"').to_string());
            }
            "for" | "on" | "towards" | "toward" if slots.category.is_none() => {
                slots.category = normalize_category(&phrase.text);
            }
            _ => {}
        }
    }

    if slots.category.is_none() {
        if let Some(amount) = amount {
            slots.category = words_after_amount(text, amount, claimed);
        }
    }
    slots
}

fn words_after_amount(text: &str, amount: &AmountMatch, claimed: &[Range<usize>]) -> Option<String> {
    let words: Vec<String> = tokens(text)
        .into_iter()
        .filter(|t| t.span.start >= amount.span.end)
        .filter(|t| currency_for_word(&t.lower).is_none() && !t.lower.chars().all(|c| "$€£¥₹".contains(c)))
        .filter(|t| !STOP_WORDS.contains(&t.lower.as_str()))
        .take_while(|t| {
            !BOUNDARY_WORDS.contains(&t.lower.as_str())
                && !CONNECTORS.contains(&t.lower.as_str())
                && !is_numeric(t)
                && !claimed.iter().any(|c| overlaps(c, &t.span))
        })
        .take(2)
        .map(|t| t.text)
        .collect();
    normalize_category(&words.join(" "))
}

/// Splits an edited description such as "groceries at Trader Joes".
pub fn split_category_at_merchant(description: &str) -> CategorySlots {
    let lower = description.to_ascii_lowercase();
    match lower.find(" at ") {
        Some(pos) => CategorySlots {
            category: normalize_category(&description[..pos]),
            merchant: Some(description[pos + 4..].trim().to_string()).filter(|m| !m.is_empty()),
        },
        None => CategorySlots { category: normalize_category(description), merchant: None },
    }
}

/// "groceries at Trader Joes", "groceries", "Trader Joes", or `None`.
pub fn describe(category: Option<&str>, merchant: Option<&str>) -> Option<String> {
    match (category, merchant) {
        (Some(c), Some(m)) => Some(format!("{c} at {m}")),
        (Some(c), None) => Some(c.to_string()),
        (None, Some(m)) => Some(m.to_string()),
        (None, None) => None,
    }
}
