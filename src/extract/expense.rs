//! Shared-expense rule: "add 42.50 to Roommates for groceries",
//! "spent $30 on dinner with the ski trip group, paid by Alice".

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use tracing::debug;

use super::amount::{extract_amount, format_major, format_money, parse_minor, starts_with_amount, AmountMatch};
use super::budget::INCOME_WORDS;
use super::category::{connector_phrases, describe, extract_category_and_merchant, Phrase};
use super::datetime::find_date;
use super::fuzzy::{match_entity, normalize_name, EntityMatch, MatchKind};
use super::{contains_phrase, has_any, list_names, words};
use crate::intent::{ExpenseInput, Intent};
use crate::planner::{DeterministicPlan, EditableMessage, FieldKind, TraceEntry};
use crate::snapshot::{GroupSnapshot, Snapshot};

const BASE_CONFIDENCE: f32 = 0.55;
const GROUP_BONUS: f32 = 0.2;
const CATEGORY_BONUS: f32 = 0.05;
const UNMATCHED_CEILING: f32 = 0.35;

/// Verbs that open an expense command within its first three words.
const LEADING_VERBS: &[&str] = &[
    "add", "spent", "spend", "paid", "pay", "log", "record", "split", "charge", "charged", "put", "bought",
    "buy", "expense",
];
const EXPENSE_KEYWORDS: &[&str] =
    &["spent", "spend", "paid", "pay", "cost", "costs", "expense", "bill", "split", "charged", "bought", "owe", "owes"];
/// Words that tie an utterance to a shared group rather than a personal budget.
pub(crate) const GROUP_KEYWORDS: &[&str] =
    &["group", "groups", "trip", "split", "splitting", "owe", "owes", "owed", "settle", "settled"];

const GROUP_CONNECTORS: &[&str] = &["to", "in", "into", "for", "with", "on"];
/// Connectors whose unmatched phrase is reported back as the group the user meant.
const HINT_CONNECTORS: &[&str] = &["to", "in", "into"];
const EXPLICIT_SUFFIXES: &[&str] = &["group", "trip"];
/// Edit-distance matches on shorter phrases ("gas" vs "gym") are too loose.
const MIN_FUZZY_LEN: usize = 4;

const NOT_NAMES: &[&str] = &[
    "paid", "split", "for", "at", "on", "to", "in", "today", "yesterday", "tomorrow", "the", "everyone", "all",
    "everybody",
];
const NOT_PAYERS: &[&str] =
    &["just", "already", "also", "we", "they", "who", "you", "she", "he", "and", "have", "had", "has", "never"];

static WITH_PEOPLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bwith\s+(?:the\s+|my\s+|our\s+)?([a-z][\w'.@-]*(?:\s*(?:,|\band\b|&)\s*[a-z][\w'.@-]*)*)")
        .expect("valid participant regex")
});
static NAME_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*(?:,|\band\b|&)\s*").expect("valid separator regex"));
static PAID_BY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bpaid\s+by\s+([a-z][\w'.@-]*)").expect("valid payer regex"));
static SELF_PAID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bi\s+paid\b").expect("valid payer regex"));
static NAMED_PAYER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([A-Z][a-z]+)\s+paid\b").expect("valid payer regex"));

#[derive(Debug, Default)]
struct GroupPick {
    index: Option<usize>,
    kind: Option<MatchKind>,
    hint: Option<String>,
    span: Option<Range<usize>>,
    ambiguous: Vec<usize>,
}

struct Draft<'a> {
    input: ExpenseInput,
    group: Option<&'a GroupSnapshot>,
    pick: GroupPick,
}

pub fn expense_rule(text: &str, snapshot: &Snapshot) -> Option<DeterministicPlan> {
    let ws = words(text);
    let amount = extract_amount(text, &snapshot.default_currency)?;
    if !has_signal(text, &ws, &amount) {
        return None;
    }
    if defers_to_budget(&ws) {
        debug!("expense rule: budget wording without group wording");
        return None;
    }

    let draft = draft(text, snapshot, amount);
    let mut confidence = BASE_CONFIDENCE;
    if draft.group.is_some() {
        confidence += GROUP_BONUS;
    }
    if draft.input.category.is_some() {
        confidence += CATEGORY_BONUS;
    }
    if draft.group.is_none() {
        confidence = confidence.min(UNMATCHED_CEILING);
    }
    Some(plan(draft, snapshot, confidence, "expense_rule"))
}

/// Loose fallback when no rule claimed the text but it carries an amount.
pub fn tentative_expense(text: &str, snapshot: &Snapshot, confidence: f32) -> Option<DeterministicPlan> {
    let amount = extract_amount(text, &snapshot.default_currency)?;
    Some(plan(draft(text, snapshot, amount), snapshot, confidence, "expense_heuristic"))
}

fn has_signal(text: &str, ws: &[String], amount: &AmountMatch) -> bool {
    let leading_verb = ws.iter().take(3).any(|w| LEADING_VERBS.contains(&w.as_str()));
    let marked_keyword = amount.has_currency_marker() && has_any(ws, EXPENSE_KEYWORDS);
    leading_verb || marked_keyword || starts_with_amount(text)
}

fn defers_to_budget(ws: &[String]) -> bool {
    let budget_wording = has_any(ws, &["budget", "budgets"]) || has_any(ws, INCOME_WORDS);
    budget_wording && !has_any(ws, GROUP_KEYWORDS)
}

fn is_explicit(phrase: &Phrase) -> bool {
    EXPLICIT_SUFFIXES.contains(&phrase.last_word().as_str())
}

fn accepted(kind: MatchKind, candidate: &str) -> bool {
    match kind {
        MatchKind::EditDistance(_) => normalize_name(candidate).chars().count() >= MIN_FUZZY_LEN,
        _ => true,
    }
}

/// "the Beach House group" -> "Beach House".
fn clean_hint(phrase: &str) -> String {
    let mut parts: Vec<&str> = phrase.split_whitespace().collect();
    while parts.first().is_some_and(|w| matches!(w.to_lowercase().as_str(), "the" | "my" | "our")) {
        parts.remove(0);
    }
    if parts.len() > 1 && parts.last().is_some_and(|w| w.eq_ignore_ascii_case("group")) {
        parts.pop();
    }
    parts.join(" ")
}

fn resolve_group(text: &str, groups: &[GroupSnapshot]) -> GroupPick {
    let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
    let mut phrases: Vec<Phrase> = connector_phrases(text)
        .into_iter()
        .filter(|p| GROUP_CONNECTORS.contains(&p.connector.as_str()))
        .collect();
    // explicit "... group" / "... trip" phrases first, text order otherwise
    phrases.sort_by_key(|p| !is_explicit(p));

    let mut pick = GroupPick::default();
    for phrase in &phrases {
        match match_entity(&phrase.text, &names) {
            EntityMatch::Matched { index, kind } if accepted(kind, &phrase.text) => {
                return GroupPick {
                    index: Some(index),
                    kind: Some(kind),
                    hint: Some(clean_hint(&phrase.text)),
                    span: Some(phrase.span.clone()),
                    ambiguous: Vec::new(),
                };
            }
            EntityMatch::Ambiguous(indices)
                if pick.ambiguous.is_empty() && accepted(MatchKind::EditDistance(0), &phrase.text) =>
            {
                pick.ambiguous = indices;
                pick.hint = Some(clean_hint(&phrase.text));
            }
            _ => {}
        }
    }

    // a known group named anywhere in the text
    let normalized_text = normalize_name(text);
    let lower = text.to_ascii_lowercase();
    for (index, group) in groups.iter().enumerate() {
        let name = normalize_name(&group.name);
        if name.len() >= 3 && contains_phrase(&normalized_text, &name) {
            let needle = group.name.to_ascii_lowercase();
            let span = lower.find(&needle).map(|start| start..start + needle.len());
            return GroupPick {
                index: Some(index),
                kind: Some(MatchKind::Direct),
                hint: Some(group.name.clone()),
                span,
                ambiguous: Vec::new(),
            };
        }
    }

    if pick.hint.is_none() {
        pick.hint = phrases
            .iter()
            .find(|p| is_explicit(p))
            .or_else(|| phrases.iter().find(|p| HINT_CONNECTORS.contains(&p.connector.as_str())))
            .map(|p| clean_hint(&p.text))
            .filter(|h| !h.is_empty());
    }
    pick
}

/// Names after "with", minus anything that is really the group.
fn participant_hints(text: &str, group_span: Option<&Range<usize>>) -> (Vec<String>, Vec<Range<usize>>) {
    let mut names = Vec::new();
    let mut spans = Vec::new();
    for caps in WITH_PEOPLE.captures_iter(text) {
        let Some(list) = caps.get(1) else { continue };
        if group_span.is_some_and(|g| g.start < list.end() && list.start() < g.end) {
            continue;
        }
        spans.push(list.range());
        for name in NAME_SEPARATOR.split(list.as_str()) {
            let name = name.trim_matches(|c: char| c == '.' || c == '\'');
            match name.to_lowercase().as_str() {
                "" => {}
                "i" | "me" => names.push("me".to_string()),
                lower if NOT_NAMES.contains(&lower) => {}
                _ => names.push(name.to_string()),
            }
        }
    }
    (names, spans)
}

fn payer_hint(text: &str) -> Option<(String, Range<usize>)> {
    if let Some(caps) = PAID_BY.captures(text) {
        let (whole, name) = (caps.get(0)?, caps.get(1)?);
        let name = name.as_str().trim_end_matches('.');
        let hint = if name.eq_ignore_ascii_case("me") { "me".to_string() } else { name.to_string() };
        return Some((hint, whole.range()));
    }
    if let Some(m) = SELF_PAID.find(text) {
        return Some(("me".to_string(), m.range()));
    }
    NAMED_PAYER.captures_iter(text).find_map(|caps| {
        let (whole, name) = (caps.get(0)?, caps.get(1)?);
        (!NOT_PAYERS.contains(&name.as_str().to_lowercase().as_str()))
            .then(|| (name.as_str().to_string(), whole.range()))
    })
}

fn draft<'a>(text: &str, snapshot: &'a Snapshot, amount: AmountMatch) -> Draft<'a> {
    let pick = resolve_group(text, &snapshot.groups);
    let group = pick.index.and_then(|i| snapshot.groups.get(i));

    let currency = amount
        .currency
        .clone()
        .or_else(|| group.map(|g| g.currency.clone()))
        .unwrap_or_else(|| snapshot.default_currency.clone());
    let amount_minor = match amount.currency {
        Some(_) => amount.minor,
        None => parse_minor(&amount.number, &currency).unwrap_or(amount.minor),
    };

    let date = find_date(text, snapshot.today);
    let (participants, participant_spans) = participant_hints(text, pick.span.as_ref());
    let payer = payer_hint(text);

    let mut claimed: Vec<Range<usize>> = participant_spans;
    claimed.extend(pick.span.clone());
    claimed.extend(date.as_ref().map(|d| d.span.clone()));
    claimed.extend(payer.as_ref().map(|(_, span)| span.clone()));
    let slots = extract_category_and_merchant(text, Some(&amount), &claimed);

    let input = ExpenseInput {
        amount_minor: Some(amount_minor),
        currency: Some(currency),
        description: describe(slots.category.as_deref(), slots.merchant.as_deref()),
        group_hint: pick.hint.clone(),
        group_id: group.map(|g| g.id.clone()),
        participant_hints: participants,
        payer_hint: payer.map(|(hint, _)| hint),
        category: slots.category,
        merchant: slots.merchant,
        occurred_on: date.map(|d| d.hint),
    };
    Draft { input, group, pick }
}

fn message(draft: &Draft<'_>, snapshot: &Snapshot, money: &str) -> String {
    if let Some(group) = draft.group {
        let mut msg = format!("Add {money} to {}", group.name);
        if let Some(description) = &draft.input.description {
            msg.push_str(&format!(" for {description}"));
        }
        if let Some(date) = &draft.input.occurred_on {
            msg.push_str(&format!(" ({date})"));
        }
        msg.push('?');
        return msg;
    }

    let names = snapshot.group_names();
    if names.is_empty() {
        return "You don't have any expense groups yet. Create one before adding shared expenses.".to_string();
    }
    if !draft.pick.ambiguous.is_empty() {
        let options: Vec<&str> =
            draft.pick.ambiguous.iter().filter_map(|i| snapshot.groups.get(*i)).map(|g| g.name.as_str()).collect();
        return format!(
            "\"{}\" matches more than one group ({}). Which one is this {money} for?",
            draft.pick.hint.as_deref().unwrap_or_default(),
            options.join(", ")
        );
    }
    match &draft.pick.hint {
        Some(hint) => format!("I couldn't match \"{hint}\" to a group. You have groups: {}.", list_names(&names)),
        None => format!("Which group is this {money} for? You have groups: {}.", list_names(&names)),
    }
}

fn plan(draft: Draft<'_>, snapshot: &Snapshot, confidence: f32, phase: &str) -> DeterministicPlan {
    let input = &draft.input;
    let currency = input.currency.as_deref().unwrap_or(&snapshot.default_currency);
    let minor = input.amount_minor.unwrap_or_default();
    let money = format_money(minor, currency);

    let group_value = draft
        .group
        .map(|g| g.name.clone())
        .or_else(|| input.group_hint.clone())
        .unwrap_or_default();
    let editable = EditableMessage::new("Add {amount} to {group} for {description} on {date}")
        .field("amount", "Amount", format_major(minor, currency), FieldKind::Money)
        .field("group", "Group", group_value, FieldKind::Entity)
        .field("description", "Description", input.description.clone().unwrap_or_default(), FieldKind::Text)
        .field(
            "date",
            "Date",
            input.occurred_on.map_or_else(|| "today".to_string(), |d| d.to_string()),
            FieldKind::Date,
        );

    let trace = TraceEntry::new(
        phase,
        match draft.group {
            Some(g) => format!("matched group {}", g.name),
            None => "no group matched".to_string(),
        },
        json!({
            "amount_minor": minor,
            "currency": currency,
            "group_id": input.group_id,
            "group_hint": input.group_hint,
            "match": draft.pick.kind.map(|k| format!("{k:?}")),
            "ambiguous": draft.pick.ambiguous.len(),
            "category": input.category,
            "merchant": input.merchant,
            "participants": input.participant_hints,
            "payer": input.payer_hint,
        }),
    );

    DeterministicPlan {
        message: message(&draft, snapshot, &money),
        intent: Intent::AddExpense(draft.input),
        confidence,
        editable: Some(editable),
        trace: vec![trace],
    }
}
