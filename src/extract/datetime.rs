//! Dates, clock times and durations inside free text.
//!
//! All scanning runs on an ASCII-lowercased copy so byte offsets line up with
//! the original utterance; callers use the spans to cut recognized pieces
//! out of titles and to keep date digits away from amount parsing.

use std::ops::Range;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::intent::{ClockTime, DateHint};

static RELATIVE_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(today|tonight|tomorrow|tmrw|tmr|yesterday)\b").expect("valid regex"));
static ISO_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").expect("valid regex"));
static SLASH_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})(?:/(\d{2}|\d{4}))?\b").expect("valid regex"));
static MONTH_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?\s+(\d{1,2})(?:st|nd|rd|th)?\b(?:,?\s+(\d{4})\b)?",
    )
    .expect("valid regex")
});
static WEEKDAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:(next|this|on)\s+)?(monday|mon|tuesday|tues|tue|wednesday|wed|thursday|thurs|thur|thu|friday|fri|saturday|sunday)\b",
    )
    .expect("valid regex")
});

static MERIDIEM_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})(?::(\d{2}))?\s*(am|pm|a\.m\.|p\.m\.)").expect("valid regex"));
static NAMED_TIME: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(noon|midday|midnight)\b").expect("valid regex"));
static CLOCK_24H: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([01]?\d|2[0-3]):([0-5]\d)\b").expect("valid regex"));
static AT_HOUR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bat\s+(\d{1,2})\b").expect("valid regex"));

static HOUR_AND_HALF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:(?:an|a|one)\s+)?hour\s+and\s+a\s+half\b").expect("valid regex"));
static NUMERIC_DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d+(?:\.\d+)?)\s*-?\s*(minutes|minute|mins|min|hours|hour|hrs|hr|h)\b").expect("valid regex")
});
static WORD_DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|fifteen|twenty|thirty|forty|forty-five|fifty|ninety)\s*-?\s*(minutes|minute|mins|min|hours|hour)\b",
    )
    .expect("valid regex")
});
static HALF_HOUR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bhalf\s+(?:an\s+)?hour\b").expect("valid regex"));
static QUARTER_HOUR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:a\s+)?quarter\s+(?:of\s+an\s+)?hour\b").expect("valid regex"));
static ONE_HOUR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:an|a|one)\s+hour\b").expect("valid regex"));

/// Words that follow a number when it counts time rather than money.
pub const TIME_UNIT_WORDS: &[&str] = &[
    "am", "pm", "a.m.", "p.m.", "min", "mins", "minute", "minutes", "hour", "hours", "hr", "hrs", "h",
    "st", "nd", "rd", "th", "day", "days", "week", "weeks", "month", "months", "year", "years",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekdayQualifier {
    /// A bare weekday: the next occurrence, never today.
    Plain,
    /// "this <day>": the coming occurrence within the week, today included.
    This,
    /// "next <day>": one week past the coming occurrence.
    Next,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateMatch {
    pub hint: DateHint,
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeMatch {
    pub time: ClockTime,
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurationMatch {
    pub minutes: u32,
    pub span: Range<usize>,
}

pub fn resolve_weekday(base: NaiveDate, target: Weekday, qualifier: WeekdayQualifier) -> NaiveDate {
    let ahead = (target.num_days_from_monday() as i64 - base.weekday().num_days_from_monday() as i64)
        .rem_euclid(7);
    let days = match qualifier {
        WeekdayQualifier::This => ahead,
        WeekdayQualifier::Plain if ahead == 0 => 7,
        WeekdayQualifier::Plain => ahead,
        WeekdayQualifier::Next => ahead + 7,
    };
    base + Duration::days(days)
}

fn weekday_from(word: &str) -> Option<Weekday> {
    match word {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tues" | "tue" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thurs" | "thur" | "thu" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

fn month_from(word: &str) -> Option<u32> {
    let month = match word.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn expand_year(raw: Option<&str>, today: NaiveDate) -> Option<i32> {
    match raw {
        None => Some(today.year()),
        Some(y) if y.len() == 2 => y.parse::<i32>().ok().map(|y| 2000 + y),
        Some(y) => y.parse().ok(),
    }
}

/// Explicit calendar dates only (ISO, slash, "Month Day"), used to mask
/// their digits from amount scanning.
pub fn date_spans(text: &str) -> Vec<Range<usize>> {
    let lower = text.to_ascii_lowercase();
    let mut spans: Vec<Range<usize>> = Vec::new();
    for re in [&*ISO_DATE, &*SLASH_DATE, &*MONTH_DAY] {
        spans.extend(re.find_iter(&lower).map(|m| m.range()));
    }
    spans.sort_by_key(|r| r.start);
    spans
}

/// The left-most recognizable date reference.
pub fn find_date(text: &str, today: NaiveDate) -> Option<DateMatch> {
    let lower = text.to_ascii_lowercase();
    let mut found: Vec<DateMatch> = Vec::new();

    if let Some(c) = RELATIVE_DAY.captures(&lower) {
        let hint = match &c[1] {
            "today" | "tonight" => DateHint::Today,
            "yesterday" => DateHint::Yesterday,
            _ => DateHint::Tomorrow,
        };
        found.push(DateMatch { hint, span: c.get(0).map_or(0..0, |m| m.range()) });
    }

    for c in ISO_DATE.captures_iter(&lower) {
        let date = (|| {
            NaiveDate::from_ymd_opt(c[1].parse().ok()?, c[2].parse().ok()?, c[3].parse().ok()?)
        })();
        if let (Some(date), Some(m)) = (date, c.get(0)) {
            found.push(DateMatch { hint: DateHint::On(date), span: m.range() });
            break;
        }
    }

    for c in SLASH_DATE.captures_iter(&lower) {
        let date = (|| {
            let year = expand_year(c.get(3).map(|m| m.as_str()), today)?;
            NaiveDate::from_ymd_opt(year, c[1].parse().ok()?, c[2].parse().ok()?)
        })();
        if let (Some(date), Some(m)) = (date, c.get(0)) {
            found.push(DateMatch { hint: DateHint::On(date), span: m.range() });
            break;
        }
    }

    for c in MONTH_DAY.captures_iter(&lower) {
        let date = (|| {
            let year = expand_year(c.get(3).map(|m| m.as_str()), today)?;
            NaiveDate::from_ymd_opt(year, month_from(&c[1])?, c[2].parse().ok()?)
        })();
        if let (Some(date), Some(m)) = (date, c.get(0)) {
            found.push(DateMatch { hint: DateHint::On(date), span: m.range() });
            break;
        }
    }

    if let Some(c) = WEEKDAY.captures(&lower) {
        if let (Some(day), Some(m)) = (weekday_from(&c[2]), c.get(0)) {
            let qualifier = match c.get(1).map(|q| q.as_str()) {
                Some("next") => WeekdayQualifier::Next,
                Some("this") => WeekdayQualifier::This,
                _ => WeekdayQualifier::Plain,
            };
            let date = resolve_weekday(today, day, qualifier);
            let hint = match (date - today).num_days() {
                0 => DateHint::Today,
                1 => DateHint::Tomorrow,
                _ => DateHint::On(date),
            };
            found.push(DateMatch { hint, span: m.range() });
        }
    }

    found.into_iter().min_by_key(|m| m.span.start)
}

/// The first clock time, trying the most explicit forms first.
pub fn find_time(text: &str) -> Option<TimeMatch> {
    let lower = text.to_ascii_lowercase();

    if let Some(c) = MERIDIEM_TIME.captures(&lower) {
        let raw = format!(
            "{}:{}{}",
            &c[1],
            c.get(2).map_or("00", |m| m.as_str()),
            if c[3].starts_with('p') { "pm" } else { "am" }
        );
        if let (Ok(time), Some(m)) = (raw.parse::<ClockTime>(), c.get(0)) {
            return Some(TimeMatch { time, span: m.range() });
        }
    }

    if let Some(m) = NAMED_TIME.find(&lower) {
        let time = if m.as_str() == "midnight" { ClockTime::new(0, 0) } else { ClockTime::new(12, 0) };
        if let Some(time) = time {
            return Some(TimeMatch { time, span: m.range() });
        }
    }

    if let Some(c) = CLOCK_24H.captures(&lower) {
        let time = ClockTime::new(c[1].parse().ok()?, c[2].parse().ok()?);
        if let (Some(time), Some(m)) = (time, c.get(0)) {
            return Some(TimeMatch { time, span: m.range() });
        }
    }

    for c in AT_HOUR.captures_iter(&lower) {
        let Some(m) = c.get(0) else { continue };
        if next_word(&lower, m.end()).is_some_and(|w| TIME_UNIT_WORDS.contains(&w)) {
            continue;
        }
        let hour: u32 = match c[1].parse() {
            Ok(h) if (1..=12).contains(&h) => h,
            _ => continue,
        };
        // bare "at 3" reads as afternoon for the early hours
        let hour = if hour <= 7 { hour + 12 } else { hour };
        if let Some(time) = ClockTime::new(hour, 0) {
            return Some(TimeMatch { time, span: m.range() });
        }
    }

    None
}

fn word_number(word: &str) -> Option<f32> {
    let n = match word {
        "one" => 1.0,
        "two" => 2.0,
        "three" => 3.0,
        "four" => 4.0,
        "five" => 5.0,
        "six" => 6.0,
        "seven" => 7.0,
        "eight" => 8.0,
        "nine" => 9.0,
        "ten" => 10.0,
        "eleven" => 11.0,
        "twelve" => 12.0,
        "fifteen" => 15.0,
        "twenty" => 20.0,
        "thirty" => 30.0,
        "forty" => 40.0,
        "forty-five" => 45.0,
        "fifty" => 50.0,
        "ninety" => 90.0,
        _ => return None,
    };
    Some(n)
}

/// Longest duration a single task can hold.
pub const MAX_DURATION_MINUTES: u32 = 24 * 60;

fn unit_minutes(amount: f32, unit: &str) -> Option<u32> {
    let minutes = if unit.starts_with('h') { amount * 60.0 } else { amount };
    // anything over a day is kept at a day so the executor can refuse it
    (minutes > 0.0).then(|| minutes.min(MAX_DURATION_MINUTES as f32).round() as u32)
}

pub fn find_duration(text: &str) -> Option<DurationMatch> {
    let lower = text.to_ascii_lowercase();

    if let Some(m) = HOUR_AND_HALF.find(&lower) {
        return Some(DurationMatch { minutes: 90, span: m.range() });
    }
    if let Some(c) = NUMERIC_DURATION.captures(&lower) {
        let minutes = c[1].parse::<f32>().ok().and_then(|n| unit_minutes(n, &c[2]));
        if let (Some(minutes), Some(m)) = (minutes, c.get(0)) {
            return Some(DurationMatch { minutes, span: m.range() });
        }
    }
    if let Some(c) = WORD_DURATION.captures(&lower) {
        let minutes = word_number(&c[1]).and_then(|n| unit_minutes(n, &c[2]));
        if let (Some(minutes), Some(m)) = (minutes, c.get(0)) {
            return Some(DurationMatch { minutes, span: m.range() });
        }
    }
    if let Some(m) = HALF_HOUR.find(&lower) {
        return Some(DurationMatch { minutes: 30, span: m.range() });
    }
    if let Some(m) = QUARTER_HOUR.find(&lower) {
        return Some(DurationMatch { minutes: 15, span: m.range() });
    }
    if let Some(m) = ONE_HOUR.find(&lower) {
        return Some(DurationMatch { minutes: 60, span: m.range() });
    }
    None
}

/// The word right after `pos`, skipping at most one run of spaces.
pub(crate) fn next_word(lower: &str, pos: usize) -> Option<&str> {
    let rest = lower.get(pos..)?.trim_start_matches(' ');
    let end = rest
        .find(|c: char| !(c.is_ascii_alphabetic() || c == '.'))
        .unwrap_or(rest.len());
    let word = rest[..end].trim_end_matches('.');
    let word = if word.contains('.') { &rest[..end] } else { word };
    (!word.is_empty()).then_some(word)
}
