use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use super::IntentOverride;
use crate::extract::amount::extract_amount;
use crate::extract::category::split_category_at_merchant;
use crate::extract::datetime::{find_date, find_duration, find_time, MAX_DURATION_MINUTES};
use crate::intent::{BudgetEntryInput, ClockTime, DateHint, EntryKind, ExpenseInput, FlowTaskInput, Intent};

/// Applies edited field values to a confirmed intent. Values are re-read the
/// way the extractors read them; fields derived from free text are recomputed
/// from the edit instead of being taken as given.
pub fn apply_override(over: &IntentOverride, today: NaiveDate, default_currency: &str) -> Intent {
    let fields = &over.fields;
    match &over.intent {
        Intent::AddExpense(input) => Intent::AddExpense(edit_expense(input.clone(), fields, today, default_currency)),
        Intent::AddBudgetEntry(input) => {
            Intent::AddBudgetEntry(edit_budget(input.clone(), fields, today, default_currency))
        }
        Intent::AddFlowTask(input) => Intent::AddFlowTask(edit_flow(input.clone(), fields, today)),
        other => other.clone(),
    }
}

fn cleaned(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_amount(value: &str, currency: &str) -> (Option<i64>, Option<String>) {
    match extract_amount(value, currency) {
        Some(m) => (Some(m.minor), m.currency),
        None => (None, None),
    }
}

pub fn parse_date(value: &str, today: NaiveDate) -> Option<DateHint> {
    value.parse::<DateHint>().ok().or_else(|| find_date(value, today).map(|m| m.hint))
}

pub fn parse_time(value: &str) -> Option<ClockTime> {
    value.parse::<ClockTime>().ok().or_else(|| find_time(value).map(|m| m.time))
}

pub fn parse_duration(value: &str) -> Option<u32> {
    value
        .trim()
        .parse::<u32>()
        .ok()
        .or_else(|| find_duration(value).map(|m| m.minutes))
        .filter(|m| *m > 0)
        .map(|m| m.min(MAX_DURATION_MINUTES))
}

fn names(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c == '&')
        .flat_map(|part| part.split(" and "))
        .filter_map(cleaned)
        .collect()
}

fn edit_expense(
    mut input: ExpenseInput,
    fields: &BTreeMap<String, String>,
    today: NaiveDate,
    default_currency: &str,
) -> ExpenseInput {
    for (key, value) in fields {
        match key.as_str() {
            "amount" => {
                let currency = input.currency.clone().unwrap_or_else(|| default_currency.to_string());
                let (minor, marked) = parse_amount(value, &currency);
                input.amount_minor = minor;
                if marked.is_some() {
                    input.currency = marked;
                }
            }
            "group" => {
                input.group_hint = cleaned(value);
                input.group_id = None;
            }
            "description" => {
                let slots = split_category_at_merchant(value.trim());
                input.description = cleaned(value);
                input.category = slots.category;
                input.merchant = slots.merchant;
            }
            "date" => input.occurred_on = parse_date(value, today),
            "participants" => input.participant_hints = names(value),
            "payer" => input.payer_hint = cleaned(value),
            other => debug!(field = other, "override: ignoring unknown expense field"),
        }
    }
    input
}

fn edit_budget(
    mut input: BudgetEntryInput,
    fields: &BTreeMap<String, String>,
    today: NaiveDate,
    default_currency: &str,
) -> BudgetEntryInput {
    for (key, value) in fields {
        match key.as_str() {
            "amount" => {
                let currency = input.currency.clone().unwrap_or_else(|| default_currency.to_string());
                let (minor, marked) = parse_amount(value, &currency);
                input.amount_minor = minor;
                if marked.is_some() {
                    input.currency = marked;
                }
            }
            "budget" => {
                input.budget_hint = cleaned(value);
                input.budget_id = None;
            }
            "description" => {
                let slots = split_category_at_merchant(value.trim());
                input.description = cleaned(value);
                input.category = slots.category;
                input.merchant = slots.merchant;
            }
            "date" => input.occurred_on = parse_date(value, today),
            "kind" => {
                input.kind = match value.trim().to_ascii_lowercase().as_str() {
                    "income" => EntryKind::Income,
                    _ => EntryKind::Expense,
                }
            }
            other => debug!(field = other, "override: ignoring unknown budget field"),
        }
    }
    input
}

fn edit_flow(mut input: FlowTaskInput, fields: &BTreeMap<String, String>, today: NaiveDate) -> FlowTaskInput {
    for (key, value) in fields {
        match key.as_str() {
            "title" => input.title = cleaned(value),
            "date" => input.scheduled_for = parse_date(value, today),
            "time" => input.starts_at = parse_time(value),
            "duration" => input.duration_minutes = parse_duration(value),
            other => debug!(field = other, "override: ignoring unknown task field"),
        }
    }
    input
}
