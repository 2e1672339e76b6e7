//! Personal budget rule: "add 15 to travel budget", "earned 500 salary",
//! "42 at Costco for groceries" when a budget is named Groceries.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use tracing::debug;

use super::amount::{extract_amount, format_major, format_money, parse_minor, AmountMatch};
use super::category::{connector_phrases, describe, extract_category_and_merchant, normalize_category, tokens};
use super::datetime::find_date;
use super::expense::GROUP_KEYWORDS;
use super::fuzzy::{match_entity, normalize_name, similarity, EntityMatch, MatchKind};
use super::{contains_phrase, has_any, list_names, words};
use crate::intent::{BudgetEntryInput, EntryKind, Intent};
use crate::planner::{DeterministicPlan, EditableMessage, FieldKind, TraceEntry};
use crate::snapshot::{BudgetRef, Snapshot};

const BASE_CONFIDENCE: f32 = 0.6;
const HINT_BONUS: f32 = 0.15;
const ACTIVE_BONUS: f32 = 0.05;
const CATEGORY_BONUS: f32 = 0.05;
const UNRESOLVED_CEILING: f32 = 0.35;
const MIN_SIMILARITY: f32 = 0.6;

pub(crate) const INCOME_WORDS: &[&str] =
    &["income", "earned", "earn", "salary", "paycheck", "refund", "refunded", "received", "bonus"];
const BUDGET_WORDS: &[&str] = &["budget", "budgets"];
const BUDGET_CONNECTORS: &[&str] = &["in", "into", "to", "for", "on", "from", "towards", "toward"];
const HINT_STOP: &[&str] = &["today", "tomorrow", "yesterday", "for", "at", "on", "from", "please"];

static HINT_BEFORE_BUDGET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:in|into|to|for|on|from|towards?)\s+(?:my\s+|the\s+|our\s+)?((?:[a-z0-9'&-]+\s+){0,3}?)budget\b")
        .expect("valid budget hint regex")
});
static NAMED_BUDGET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bbudget\s+(?:for|called|named)\s+([a-z0-9'&-]+(?:\s+[a-z0-9'&-]+){0,2})")
        .expect("valid budget hint regex")
});
static BARE_BUDGET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b([a-z][a-z'&-]*)\s+budget\b").expect("valid budget hint regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Hint,
    Active,
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Hint {
    text: String,
    span: Range<usize>,
}

struct Draft {
    input: BudgetEntryInput,
    budget: Option<BudgetRef>,
    resolution: Resolution,
    explicit_category: bool,
}

pub fn budget_rule(text: &str, snapshot: &Snapshot) -> Option<DeterministicPlan> {
    let ws = words(text);
    if has_any(&ws, GROUP_KEYWORDS) {
        debug!("budget rule: group wording");
        return None;
    }
    let budget_word = has_any(&ws, BUDGET_WORDS);
    if !budget_word && names_a_group(text, snapshot) {
        return None;
    }
    if !(budget_word || is_income(text, &ws) || phrase_names_budget(text, snapshot).is_some()) {
        return None;
    }
    let amount = extract_amount(text, &snapshot.default_currency)?;

    let draft = draft(text, snapshot, Some(amount));
    let mut confidence = BASE_CONFIDENCE;
    match draft.resolution {
        Resolution::Hint => confidence += HINT_BONUS,
        Resolution::Active => confidence += ACTIVE_BONUS,
        Resolution::Unresolved => {}
    }
    if draft.explicit_category {
        confidence += CATEGORY_BONUS;
    }
    if draft.resolution == Resolution::Unresolved {
        confidence = confidence.min(UNRESOLVED_CEILING);
    }
    Some(plan(draft, snapshot, confidence, "budget_rule"))
}

/// Loose fallback for budget wording the rule could not fully read.
pub fn tentative_budget(text: &str, snapshot: &Snapshot, confidence: f32) -> DeterministicPlan {
    let amount = extract_amount(text, &snapshot.default_currency);
    plan(draft(text, snapshot, amount), snapshot, confidence, "budget_heuristic")
}

fn is_income(text: &str, ws: &[String]) -> bool {
    has_any(ws, INCOME_WORDS) || contains_phrase(&text.to_lowercase(), "got paid")
}

fn names_a_group(text: &str, snapshot: &Snapshot) -> bool {
    let names = snapshot.group_names();
    connector_phrases(text)
        .iter()
        .any(|p| matches!(match_entity(&p.text, &names), EntityMatch::Matched { kind: MatchKind::Direct, .. }))
}

/// A connector phrase that is exactly a known budget's name, e.g. "for groceries".
fn phrase_names_budget(text: &str, snapshot: &Snapshot) -> Option<Hint> {
    let titles: Vec<String> = snapshot.budgets.iter().map(|b| normalize_name(&b.title)).collect();
    connector_phrases(text)
        .into_iter()
        .filter(|p| BUDGET_CONNECTORS.contains(&p.connector.as_str()))
        .find(|p| {
            let name = normalize_name(&p.text);
            !name.is_empty() && titles.contains(&name)
        })
        .map(|p| Hint { text: p.text, span: p.span })
}

/// Keeps the words after the last connector: "dinner to travel" -> "travel".
fn trim_hint(text: &str, span: Range<usize>) -> Option<Hint> {
    let raw = text.get(span.clone())?;
    let toks = tokens(raw);
    let start = toks
        .iter()
        .rposition(|t| BUDGET_CONNECTORS.contains(&t.lower.as_str()) || matches!(t.lower.as_str(), "my" | "the" | "our"))
        .map_or(0, |i| i + 1);
    let kept: Vec<_> = toks[start..]
        .iter()
        .take_while(|t| !HINT_STOP.contains(&t.lower.as_str()))
        .collect();
    let (first, last) = (kept.first()?, kept.last()?);
    Some(Hint {
        text: kept.iter().map(|t| t.text.as_str()).collect::<Vec<_>>().join(" "),
        span: span.start + first.span.start..span.start + last.span.end,
    })
}

fn budget_hint(text: &str, snapshot: &Snapshot) -> Option<Hint> {
    let from_capture = |re: &Regex| {
        re.captures_iter(text)
            .filter_map(|c| c.get(1))
            .find_map(|m| trim_hint(text, m.range()))
    };
    from_capture(&*HINT_BEFORE_BUDGET)
        .or_else(|| from_capture(&*NAMED_BUDGET))
        .or_else(|| phrase_names_budget(text, snapshot))
        .or_else(|| {
            from_capture(&*BARE_BUDGET).filter(|h| {
                let lower = h.text.to_lowercase();
                !BUDGET_CONNECTORS.contains(&lower.as_str()) && !matches!(lower.as_str(), "my" | "the" | "our" | "a")
            })
        })
}

fn resolve_budget(hint: Option<&Hint>, snapshot: &Snapshot) -> (Option<BudgetRef>, Resolution) {
    if let Some(hint) = hint {
        let titles = snapshot.budget_titles();
        if let EntityMatch::Matched { index, .. } = match_entity(&hint.text, &titles) {
            return (snapshot.budgets.get(index).cloned(), Resolution::Hint);
        }
        let wanted = normalize_name(&hint.text);
        let mut best: Option<(usize, f32)> = None;
        for (i, budget) in snapshot.budgets.iter().enumerate() {
            let score = similarity(&wanted, &normalize_name(&budget.title));
            if score >= MIN_SIMILARITY && best.map_or(true, |(_, b)| score > b) {
                best = Some((i, score));
            }
        }
        if let Some((index, _)) = best {
            return (snapshot.budgets.get(index).cloned(), Resolution::Hint);
        }
    }

    let active = snapshot.active_budget_ref().or_else(|| match snapshot.budgets.as_slice() {
        [only] => Some(only.clone()),
        _ => None,
    });
    match active {
        Some(budget) => (Some(budget), Resolution::Active),
        None => (None, Resolution::Unresolved),
    }
}

fn draft(text: &str, snapshot: &Snapshot, amount: Option<AmountMatch>) -> Draft {
    let ws = words(text);
    let hint = budget_hint(text, snapshot);
    let (budget, resolution) = resolve_budget(hint.as_ref(), snapshot);
    let kind = if is_income(text, &ws) { EntryKind::Income } else { EntryKind::Expense };

    let currency = amount
        .as_ref()
        .and_then(|a| a.currency.clone())
        .or_else(|| budget.as_ref().map(|b| b.currency.clone()))
        .unwrap_or_else(|| snapshot.default_currency.clone());
    let amount_minor = amount.as_ref().map(|a| match a.currency {
        Some(_) => a.minor,
        None => parse_minor(&a.number, &currency).unwrap_or(a.minor),
    });

    let date = find_date(text, snapshot.today);
    let mut claimed: Vec<Range<usize>> = Vec::new();
    claimed.extend(hint.as_ref().map(|h| h.span.clone()));
    claimed.extend(date.as_ref().map(|d| d.span.clone()));
    let slots = extract_category_and_merchant(text, amount.as_ref(), &claimed);
    let explicit_category = slots.category.is_some();
    let category = slots
        .category
        .or_else(|| hint.as_ref().and_then(|h| normalize_category(&h.text)))
        .filter(|c| !INCOME_WORDS.contains(&c.as_str()) || kind == EntryKind::Income);

    let description = describe(category.as_deref(), slots.merchant.as_deref())
        .or_else(|| (kind == EntryKind::Income).then(|| "income".to_string()));

    let input = BudgetEntryInput {
        amount_minor,
        currency: Some(currency),
        description,
        budget_hint: hint.map(|h| h.text),
        budget_id: budget.as_ref().map(|b| b.id.clone()),
        category,
        merchant: slots.merchant,
        occurred_on: date.map(|d| d.hint),
        kind,
    };
    Draft { input, budget, resolution, explicit_category }
}

fn message(draft: &Draft, snapshot: &Snapshot, money: Option<&str>) -> String {
    let input = &draft.input;
    let Some(budget) = &draft.budget else {
        let titles = snapshot.budget_titles();
        if titles.is_empty() {
            return "You don't have a budget yet. Create one before adding entries.".to_string();
        }
        return match money {
            Some(money) => format!("Which budget should {money} go to? You have: {}.", list_names(&titles)),
            None => format!("Which budget is this for? You have: {}.", list_names(&titles)),
        };
    };

    let mut question = match (money, input.kind) {
        (None, _) => format!("How much should I add to {}?", budget.title),
        (Some(money), EntryKind::Income) => format!("Record {money} income in {}", budget.title),
        (Some(money), EntryKind::Expense) => format!("Add {money} to {}", budget.title),
    };
    if money.is_some() {
        if let Some(description) = &input.description {
            if input.kind == EntryKind::Expense || description != "income" {
                question.push_str(&format!(" for {description}"));
            }
        }
        if let Some(date) = &input.occurred_on {
            question.push_str(&format!(" ({date})"));
        }
        question.push('?');
    }

    match (&input.budget_hint, draft.resolution) {
        (Some(hint), Resolution::Active) => {
            format!("I couldn't find a \"{hint}\" budget, so this goes to {}. {question}", budget.title)
        }
        _ => question,
    }
}

fn plan(draft: Draft, snapshot: &Snapshot, confidence: f32, phase: &str) -> DeterministicPlan {
    let input = &draft.input;
    let currency = input.currency.clone().unwrap_or_else(|| snapshot.default_currency.clone());
    let money = input.amount_minor.map(|m| format_money(m, &currency));

    let editable = EditableMessage::new("Add {amount} to {budget} for {description} on {date}")
        .field(
            "amount",
            "Amount",
            input.amount_minor.map(|m| format_major(m, &currency)).unwrap_or_default(),
            FieldKind::Money,
        )
        .field(
            "budget",
            "Budget",
            draft
                .budget
                .as_ref()
                .map(|b| b.title.clone())
                .or_else(|| input.budget_hint.clone())
                .unwrap_or_default(),
            FieldKind::Entity,
        )
        .field("description", "Description", input.description.clone().unwrap_or_default(), FieldKind::Text)
        .field(
            "date",
            "Date",
            input.occurred_on.map_or_else(|| "today".to_string(), |d| d.to_string()),
            FieldKind::Date,
        );

    let trace = TraceEntry::new(
        phase,
        format!("budget resolved by {:?}", draft.resolution),
        json!({
            "amount_minor": input.amount_minor,
            "currency": currency,
            "budget_id": input.budget_id,
            "budget_hint": input.budget_hint,
            "kind": input.kind,
            "category": input.category,
            "merchant": input.merchant,
        }),
    );

    DeterministicPlan {
        message: message(&draft, snapshot, money.as_deref()),
        intent: Intent::AddBudgetEntry(draft.input),
        confidence,
        editable: Some(editable),
        trace: vec![trace],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hint_keeps_words_after_the_last_connector() {
        let text = "add 15 for dinner to travel budget";
        let caps = HINT_BEFORE_BUDGET.captures(text).unwrap();
        let hint = trim_hint(text, caps.get(1).unwrap().range()).unwrap();
        assert_eq!(hint.text, "travel");
        assert_eq!(&text[hint.span], "travel");
    }

    #[test]
    fn named_budget_form() {
        let text = "put 30 in the budget called Date Night";
        let caps = NAMED_BUDGET.captures(text).unwrap();
        assert_eq!(trim_hint(text, caps.get(1).unwrap().range()).unwrap().text, "Date Night");
    }

    #[test]
    fn income_wording() {
        assert!(is_income("got paid 2000 today", &words("got paid 2000 today")));
        assert!(is_income("earned 500 salary", &words("earned 500 salary")));
        assert!(!is_income("paid 20 for lunch", &words("paid 20 for lunch")));
    }
}
