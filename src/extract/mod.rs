//! Deterministic slot extraction.
//!
//! Each tool has one rule: a pure `(utterance, snapshot)` function that
//! either claims the utterance with a plan or returns `None` so the planner
//! can try the next rule. Shared scanners (amounts, dates, connector phrases,
//! fuzzy names) live in their own modules.

pub mod amount;
pub mod datetime;
pub mod category;
pub mod fuzzy;
pub mod expense;
pub mod budget;
pub mod flow;

use crate::intent::ToolName;
use crate::planner::DeterministicPlan;
use crate::snapshot::Snapshot;

pub use amount::{extract_amount, format_money, to_major, to_minor, AmountMatch};
pub use fuzzy::{match_entity, EntityMatch, MatchKind};

pub type Rule = fn(&str, &Snapshot) -> Option<DeterministicPlan>;

/// Rules in their fixed fallback order.
pub const RULES: &[(ToolName, Rule)] = &[
    (ToolName::AddExpense, expense::expense_rule),
    (ToolName::AddBudgetEntry, budget::budget_rule),
    (ToolName::AddFlowTask, flow::flow_rule),
];

/// `RULES` reordered so `preferred` runs first; the rest keep their order.
pub fn ordered_rules(preferred: Option<ToolName>) -> Vec<(ToolName, Rule)> {
    let mut rules = RULES.to_vec();
    if let Some(pos) = preferred.and_then(|tool| rules.iter().position(|(t, _)| *t == tool)) {
        let first = rules.remove(pos);
        rules.insert(0, first);
    }
    rules
}

/// Lower-cased words with surrounding punctuation removed.
pub(crate) fn words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric() && c != '$' && c != '\'')
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

pub(crate) fn has_any(words: &[String], list: &[&str]) -> bool {
    words.iter().any(|w| list.contains(&w.as_str()))
}

/// Word-aligned phrase search on lower-cased text.
pub(crate) fn contains_phrase(lower: &str, phrase: &str) -> bool {
    let padded = format!(" {} ", words(lower).join(" "));
    padded.contains(&format!(" {phrase} "))
}

/// "A, B and C" for messages.
pub(crate) fn list_names(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [one] => one.to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}
