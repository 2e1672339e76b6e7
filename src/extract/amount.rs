//! Money amounts and currencies.
//!
//! Every numeric token is a candidate. Candidates carrying a currency symbol
//! score +4, a currency code or word +2, bare numbers 0; the best score wins
//! and ties go to the left-most candidate. Conversion to minor units uses the
//! currency's own number of fractional digits.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

use super::datetime::{date_spans, next_word, TIME_UNIT_WORDS};

static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?").expect("valid regex"));

const SYMBOL_SCORE: u8 = 4;
const WORD_SCORE: u8 = 2;

/// Words after a number that mean it counts something other than money.
const COUNT_WORDS: &[&str] = &["people", "person", "persons", "ways", "way", "x", "times", "percent"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountMatch {
    pub minor: i64,
    /// `None` when the text carried no currency marker.
    pub currency: Option<String>,
    /// The numeric text as written, thousands separators removed.
    pub number: String,
    pub span: Range<usize>,
    pub score: u8,
}

impl AmountMatch {
    pub fn has_currency_marker(&self) -> bool {
        self.score > 0
    }
}

pub fn currency_for_symbol(symbol: char) -> Option<&'static str> {
    match symbol {
        '$' => Some("USD"),
        '€' => Some("EUR"),
        '£' => Some("GBP"),
        '¥' => Some("JPY"),
        '₹' => Some("INR"),
        _ => None,
    }
}

pub fn currency_for_word(word: &str) -> Option<&'static str> {
    let code = match word.to_ascii_lowercase().as_str() {
        "usd" | "dollar" | "dollars" | "buck" | "bucks" => "USD",
        "eur" | "euro" | "euros" => "EUR",
        "gbp" | "pound" | "pounds" | "quid" => "GBP",
        "jpy" | "yen" => "JPY",
        "inr" | "rupee" | "rupees" | "rs" => "INR",
        "cad" => "CAD",
        "aud" => "AUD",
        "chf" | "franc" | "francs" => "CHF",
        "mxn" | "peso" | "pesos" => "MXN",
        "krw" | "won" => "KRW",
        "kwd" | "dinar" | "dinars" => "KWD",
        "bhd" => "BHD",
        _ => return None,
    };
    Some(code)
}

/// Number of fractional digits in the currency's minor unit.
pub fn fraction_digits(currency: &str) -> u32 {
    match currency.to_ascii_uppercase().as_str() {
        "JPY" | "KRW" | "VND" | "CLP" | "ISK" | "UGX" | "XOF" | "XAF" => 0,
        "BHD" | "KWD" | "OMR" | "JOD" | "TND" | "LYD" | "IQD" => 3,
        _ => 2,
    }
}

pub fn to_minor(major: f64, currency: &str) -> i64 {
    (major * 10f64.powi(fraction_digits(currency) as i32)).round() as i64
}

pub fn to_major(minor: i64, currency: &str) -> f64 {
    minor as f64 / 10f64.powi(fraction_digits(currency) as i32)
}

/// Exact decimal parse of `12`, `12.5`, `1,200.75` into minor units, rounding
/// half-up past the currency's precision.
pub fn parse_minor(number: &str, currency: &str) -> Option<i64> {
    let digits = fraction_digits(currency) as usize;
    let cleaned: String = number.chars().filter(|c| *c != ',').collect();
    let (whole, frac) = match cleaned.split_once('.') {
        Some((w, f)) => (w, f),
        None => (cleaned.as_str(), ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    if !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let mut kept: String = frac.chars().take(digits).collect();
    while kept.len() < digits {
        kept.push('0');
    }
    let mut minor = whole.checked_mul(10i64.checked_pow(digits as u32)?)?;
    if !kept.is_empty() {
        minor = minor.checked_add(kept.parse::<i64>().ok()?)?;
    }
    if frac.chars().nth(digits).is_some_and(|c| c >= '5') {
        minor = minor.checked_add(1)?;
    }
    Some(minor)
}

/// `$42.50`, `¥500`, `12.500 KWD`.
pub fn format_money(minor: i64, currency: &str) -> String {
    let digits = fraction_digits(currency) as usize;
    let major = format!("{:.*}", digits, to_major(minor, currency));
    match currency.to_ascii_uppercase().as_str() {
        "USD" => format!("${major}"),
        "EUR" => format!("€{major}"),
        "GBP" => format!("£{major}"),
        "JPY" => format!("¥{major}"),
        "INR" => format!("₹{major}"),
        other => format!("{major} {other}"),
    }
}

/// Plain major-unit rendering for editable fields, e.g. `42.50`.
pub fn format_major(minor: i64, currency: &str) -> String {
    format!("{:.*}", fraction_digits(currency) as usize, to_major(minor, currency))
}

fn previous_word(lower: &str, pos: usize) -> Option<&str> {
    let before = lower.get(..pos)?.trim_end_matches(' ');
    let start = before
        .char_indices()
        .rev()
        .find(|(_, c)| !c.is_ascii_alphabetic())
        .map_or(0, |(i, c)| i + c.len_utf8());
    let word = &before[start..];
    (!word.is_empty()).then_some(word)
}

fn symbol_near(text: &str, before: usize, after: usize) -> Option<&'static str> {
    let prev = text.get(..before)?.trim_end_matches(' ').chars().next_back();
    let next = text.get(after..)?.trim_start_matches(' ').chars().next();
    prev.and_then(currency_for_symbol).or_else(|| next.and_then(currency_for_symbol))
}

/// All plausible money amounts, in text order.
pub fn amount_candidates(text: &str) -> Vec<AmountMatch> {
    let lower = text.to_ascii_lowercase();
    let masked = date_spans(text);
    let mut out = Vec::new();

    for m in NUMBER.find_iter(&lower) {
        let span = m.range();
        if masked.iter().any(|r| r.start <= span.start && span.end <= r.end) {
            continue;
        }
        let prev_char = lower[..span.start].chars().next_back();
        let next_char = lower[span.end..].chars().next();
        if matches!(prev_char, Some(':') | Some('/') | Some('#') | Some('-'))
            || matches!(next_char, Some(':') | Some('/') | Some('%'))
        {
            continue;
        }
        let following = next_word(&lower, span.end);
        if following.is_some_and(|w| TIME_UNIT_WORDS.contains(&w) || COUNT_WORDS.contains(&w)) {
            continue;
        }

        let (currency, score) = if let Some(code) = symbol_near(text, span.start, span.end) {
            (Some(code), SYMBOL_SCORE)
        } else if let Some(code) = following.and_then(currency_for_word) {
            (Some(code), WORD_SCORE)
        } else if let Some(code) = previous_word(&lower, span.start).and_then(currency_for_word) {
            (Some(code), WORD_SCORE)
        } else {
            (None, 0)
        };

        let number: String = m.as_str().chars().filter(|c| *c != ',').collect();
        let Some(minor) = parse_minor(&number, currency.unwrap_or("USD")) else { continue };
        out.push(AmountMatch { minor, currency: currency.map(str::to_string), number, span, score });
    }
    out
}

/// Highest-scoring candidate, left-most on ties. Bare amounts are re-read in
/// `default_currency` so their minor units use the right precision.
pub fn extract_amount(text: &str, default_currency: &str) -> Option<AmountMatch> {
    let mut best: Option<AmountMatch> = None;
    for candidate in amount_candidates(text) {
        if best.as_ref().map_or(true, |b| candidate.score > b.score) {
            best = Some(candidate);
        }
    }
    best.map(|mut m| {
        if m.currency.is_none() {
            if let Some(minor) = parse_minor(&m.number, default_currency) {
                m.minor = minor;
            }
        }
        m
    })
}

/// True when any amount in the text carries a currency marker.
pub fn has_monetary_token(text: &str) -> bool {
    amount_candidates(text).iter().any(AmountMatch::has_currency_marker)
}

/// True when the utterance opens with a number.
pub fn starts_with_amount(text: &str) -> bool {
    let trimmed = text.trim_start();
    let offset = text.len() - trimmed.len();
    amount_candidates(text)
        .first()
        .is_some_and(|m| m.span.start == offset || (m.score == SYMBOL_SCORE && m.span.start <= offset + 4))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minor_respects_currency_precision() {
        assert_eq!(parse_minor("42.50", "USD"), Some(4250));
        assert_eq!(parse_minor("1,200", "USD"), Some(120000));
        assert_eq!(parse_minor("500", "JPY"), Some(500));
        assert_eq!(parse_minor("500.6", "JPY"), Some(501));
        assert_eq!(parse_minor("1.5", "KWD"), Some(1500));
        assert_eq!(parse_minor("9.999", "USD"), Some(1000));
    }

    #[test]
    fn previous_word_finds_prefix_code() {
        assert_eq!(previous_word("eur 20", 4), Some("eur"));
        assert_eq!(previous_word("20", 0), None);
    }

    #[test]
    fn previous_word_stops_at_multibyte_chars() {
        assert_eq!(previous_word("lunch at café 12", 15), None);
        assert_eq!(previous_word("jalapeño eur 12", 14), Some("eur"));
        assert_eq!(previous_word("zoëusd 12", 8), Some("usd"));
    }

    #[test]
    fn parse_minor_rejects_overflow() {
        assert_eq!(parse_minor("92233720368547758.075", "USD"), None);
        assert_eq!(parse_minor("99999999999999999999", "USD"), None);
    }
}
