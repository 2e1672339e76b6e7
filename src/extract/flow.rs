//! Schedule rule: "schedule a 30 minute call tomorrow at 3pm",
//! "block 2 hours for focus tomorrow morning".

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

use super::amount::has_monetary_token;
use super::datetime::{find_date, find_duration, find_time};
use super::{has_any, words};
use crate::intent::{ClockTime, DateHint, FlowTaskInput, Intent};
use crate::planner::{DeterministicPlan, EditableMessage, FieldKind, TraceEntry};
use crate::snapshot::Snapshot;

const BASE_CONFIDENCE: f32 = 0.6;
const TIME_BONUS: f32 = 0.1;
const DATE_BONUS: f32 = 0.05;
const DURATION_BONUS: f32 = 0.05;

const ACTION_VERBS: &[&str] = &[
    "schedule", "plan", "block", "add", "book", "set", "put", "create", "remind", "make", "reserve", "arrange",
];
const CONTEXT_WORDS: &[&str] = &[
    "task", "meeting", "call", "block", "calendar", "event", "appointment", "session", "focus", "reminder",
    "todo", "to-do", "standup", "sync", "workout", "agenda",
];
/// Loose cue for the planner's fallback.
const SCHEDULE_KEYWORDS: &[&str] = &["schedule", "calendar", "meeting", "remind", "appointment", "agenda"];
const CATEGORIES: &[(&str, &str)] = &[
    ("meeting", "meeting"),
    ("standup", "meeting"),
    ("sync", "meeting"),
    ("call", "call"),
    ("focus", "focus"),
    ("workout", "workout"),
    ("appointment", "appointment"),
    ("event", "event"),
    ("reminder", "reminder"),
    ("task", "task"),
    ("todo", "task"),
];

const LEADING_FILLER: &[&str] = &[
    "a", "an", "the", "me", "my", "please", "to", "for", "at", "on", "in", "new", "some", "up", "i", "need",
    "want", "let's", "lets", "can", "you", "could", "would", "of", "time",
];
const TRAILING_FILLER: &[&str] = &[
    "for", "at", "on", "to", "in", "with", "from", "the", "a", "an", "and", "by", "please", "my", "of", "around",
    "about",
];
const SMALL_WORDS: &[&str] = &["a", "an", "the", "and", "or", "with", "for", "to", "of", "at", "on", "in", "by"];

static CALENDAR_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:to|on|in|into)\s+(?:my\s+|the\s+)?(?:calendar|schedule|agenda|plan)\b")
        .expect("valid calendar regex")
});
static PART_OF_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:in\s+the\s+|this\s+)?(morning|afternoon|evening)\b").expect("valid part-of-day regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeSource {
    Explicit,
    PartOfDay,
    Missing,
}

struct Draft {
    input: FlowTaskInput,
    time_source: TimeSource,
    has_date: bool,
}

pub fn flow_rule(text: &str, snapshot: &Snapshot) -> Option<DeterministicPlan> {
    if has_monetary_token(text) {
        return None;
    }
    let ws = words(text);
    if !has_any(&ws, ACTION_VERBS) || !has_any(&ws, CONTEXT_WORDS) {
        return None;
    }

    let draft = draft(text, snapshot);
    let mut confidence = BASE_CONFIDENCE;
    if draft.time_source == TimeSource::Explicit {
        confidence += TIME_BONUS;
    }
    if draft.has_date {
        confidence += DATE_BONUS;
    }
    if draft.input.duration_minutes.is_some() {
        confidence += DURATION_BONUS;
    }
    Some(plan(draft, confidence, "flow_rule"))
}

/// Loose fallback: the text mentions a duration or scheduling word but
/// did not satisfy the rule.
pub fn tentative_flow(text: &str, snapshot: &Snapshot, confidence: f32) -> DeterministicPlan {
    plan(draft(text, snapshot), confidence, "flow_heuristic")
}

pub fn looks_scheduled(text: &str) -> bool {
    find_duration(text).is_some() || has_any(&words(text), SCHEDULE_KEYWORDS)
}

fn part_of_day(text: &str) -> Option<(ClockTime, Range<usize>)> {
    let caps = PART_OF_DAY.captures(text)?;
    let time = match caps.get(1)?.as_str().to_ascii_lowercase().as_str() {
        "morning" => ClockTime::new(9, 0),
        "afternoon" => ClockTime::new(14, 0),
        _ => ClockTime::new(18, 0),
    }?;
    Some((time, caps.get(0)?.range()))
}

/// Cuts the given spans out and joins what is left with single spaces.
fn without_spans(text: &str, spans: &mut [Range<usize>]) -> String {
    spans.sort_by_key(|r| r.start);
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for span in spans.iter() {
        if span.start > last {
            out.push_str(text.get(last..span.start).unwrap_or_default());
            out.push(' ');
        }
        last = last.max(span.end);
    }
    out.push_str(text.get(last..).unwrap_or_default());
    out
}

fn title_case(words: &[&str]) -> String {
    words
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let lower = w.to_lowercase();
            if i > 0 && SMALL_WORDS.contains(&lower.as_str()) {
                return lower;
            }
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Title left after removing recognized date, time and duration text plus
/// leading verbs and filler. Falls back to the raw utterance.
pub fn extract_title(text: &str, mut spans: Vec<Range<usize>>) -> String {
    spans.extend(CALENDAR_PHRASE.find_iter(text).map(|m| m.range()));
    let cleaned = without_spans(text, &mut spans);
    let mut parts: Vec<&str> = cleaned
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'' && c != '-'))
        .filter(|w| !w.is_empty())
        .collect();

    let lead = parts
        .iter()
        .take_while(|w| {
            let lower = w.to_lowercase();
            ACTION_VERBS.contains(&lower.as_str()) || LEADING_FILLER.contains(&lower.as_str())
        })
        .count();
    // "block" alone is still a title
    let lead = if lead == parts.len() { lead.saturating_sub(1) } else { lead };
    parts.drain(..lead);
    while parts.last().is_some_and(|w| TRAILING_FILLER.contains(&w.to_lowercase().as_str())) {
        parts.pop();
    }

    if parts.is_empty() {
        return text.trim().to_string();
    }
    title_case(&parts)
}

fn draft(text: &str, snapshot: &Snapshot) -> Draft {
    let date = find_date(text, snapshot.today);
    let time = find_time(text);
    let duration = find_duration(text);
    let day_part = part_of_day(text);

    let mut spans: Vec<Range<usize>> = Vec::new();
    spans.extend(date.as_ref().map(|d| d.span.clone()));
    spans.extend(time.as_ref().map(|t| t.span.clone()));
    spans.extend(duration.as_ref().map(|d| d.span.clone()));
    spans.extend(day_part.as_ref().map(|(_, span)| span.clone()));

    let (starts_at, time_source) = match (&time, &day_part) {
        (Some(t), _) => (Some(t.time), TimeSource::Explicit),
        (None, Some((t, _))) => (Some(*t), TimeSource::PartOfDay),
        (None, None) => (None, TimeSource::Missing),
    };
    let ws = words(text);
    let category = CATEGORIES
        .iter()
        .find(|(word, _)| ws.iter().any(|w| w == word))
        .map(|(_, category)| category.to_string());

    let input = FlowTaskInput {
        title: Some(extract_title(text, spans)),
        scheduled_for: date.as_ref().map(|d| d.hint),
        starts_at,
        duration_minutes: duration.map(|d| d.minutes),
        category,
    };
    Draft { input, time_source, has_date: date.is_some() }
}

/// "30 minutes", "1 hour", "1 hour 30 minutes".
pub fn format_minutes(minutes: u32) -> String {
    let plural = |n: u32, unit: &str| if n == 1 { format!("1 {unit}") } else { format!("{n} {unit}s") };
    match (minutes / 60, minutes % 60) {
        (0, m) => plural(m, "minute"),
        (h, 0) => plural(h, "hour"),
        (h, m) => format!("{} {}", plural(h, "hour"), plural(m, "minute")),
    }
}

fn day_phrase(hint: Option<DateHint>) -> String {
    match hint {
        None | Some(DateHint::Today) => "today".to_string(),
        Some(DateHint::Tomorrow) => "tomorrow".to_string(),
        Some(DateHint::Yesterday) => "yesterday".to_string(),
        Some(DateHint::On(date)) => format!("on {}", date.format("%a, %b %-d")),
    }
}

fn plan(draft: Draft, confidence: f32, phase: &str) -> DeterministicPlan {
    let input = &draft.input;
    let title = input.title.clone().unwrap_or_default();

    let mut message = format!("Schedule \"{title}\" {}", day_phrase(input.scheduled_for));
    if let Some(time) = input.starts_at {
        message.push_str(&format!(" at {time}"));
    }
    if let Some(minutes) = input.duration_minutes {
        message.push_str(&format!(" for {}", format_minutes(minutes)));
    }
    message.push('?');

    let editable = EditableMessage::new("Schedule {title} on {date} at {time} for {duration}")
        .field("title", "Title", title.clone(), FieldKind::Text)
        .field(
            "date",
            "Date",
            input.scheduled_for.map_or_else(|| "today".to_string(), |d| d.to_string()),
            FieldKind::Date,
        )
        .field("time", "Start", input.starts_at.map(|t| t.to_string()).unwrap_or_default(), FieldKind::Time)
        .field(
            "duration",
            "Minutes",
            input.duration_minutes.map(|m| m.to_string()).unwrap_or_default(),
            FieldKind::Duration,
        );

    let trace = TraceEntry::new(
        phase,
        format!("task \"{title}\""),
        json!({
            "scheduled_for": input.scheduled_for,
            "starts_at": input.starts_at,
            "time_source": format!("{:?}", draft.time_source),
            "duration_minutes": input.duration_minutes,
            "category": input.category,
        }),
    );

    DeterministicPlan {
        intent: Intent::AddFlowTask(draft.input),
        message,
        confidence,
        editable: Some(editable),
        trace: vec![trace],
    }
}
