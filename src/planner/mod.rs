//! Utterance -> intent.
//!
//! The classifier gates everything: text it does not read as a command goes
//! straight to the safe `summarize_state` fallback. Commands run through the
//! deterministic rules, predicted tool first, then through a short chain of
//! looser heuristics with fixed confidences.

pub mod types;

pub use types::*;

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};

use crate::classifier::{Classifier, ClassifierSignal, ModelError};
use crate::extract::budget::tentative_budget;
use crate::extract::expense::tentative_expense;
use crate::extract::flow::{looks_scheduled, tentative_flow};
use crate::extract::{has_any, ordered_rules, words};
use crate::intent::Intent;
use crate::snapshot::Snapshot;

pub const FLOW_HEURISTIC_CONFIDENCE: f32 = 0.55;
pub const BUDGET_HEURISTIC_CONFIDENCE: f32 = 0.5;
pub const EXPENSE_HEURISTIC_CONFIDENCE: f32 = 0.45;

const FALLBACK_MESSAGE: &str = "I'm not sure what to do with that. Try something like \"add 20 for lunch to \
                                Roommates\" or \"schedule a call tomorrow at 3pm\".";

pub struct Planner {
    classifier: Arc<Classifier>,
    threshold: f32,
}

impl Planner {
    pub fn new(classifier: Arc<Classifier>, threshold: f32) -> Self {
        Self { classifier, threshold }
    }

    /// Planner over the models shipped with the crate.
    pub fn packaged(threshold: f32) -> Result<Self, ModelError> {
        Ok(Self::new(Classifier::packaged()?, threshold))
    }

    pub fn plan(&self, text: &str, snapshot: &Snapshot) -> PlannerResult {
        let signal = self.classifier.classify_with_threshold(text, self.threshold);
        let classifier_entry = classifier_trace(&signal);

        if !signal.is_command {
            debug!(prob_command = signal.prob_command, "planner: not a command");
            let mut plan = fallback_plan("not_a_command");
            plan.trace.insert(0, classifier_entry);
            return plan.into();
        }

        for (tool, rule) in ordered_rules(signal.top_tool()) {
            if let Some(mut plan) = rule(text, snapshot) {
                info!(%tool, confidence = plan.confidence, "planner: rule matched");
                plan.trace.insert(0, classifier_entry);
                return plan.into();
            }
        }

        let mut plan = heuristic_plan(text, snapshot);
        info!(tool = %plan.intent.tool(), confidence = plan.confidence, "planner: heuristic fallback");
        plan.trace.insert(0, classifier_entry);
        plan.into()
    }
}

fn classifier_trace(signal: &ClassifierSignal) -> TraceEntry {
    let description = match (&signal.top_intent, signal.is_command) {
        (Some(top), true) => format!("command ({:.2}), top tool {top}", signal.prob_command),
        (None, true) => format!("command ({:.2})", signal.prob_command),
        (_, false) => format!("not a command ({:.2})", signal.prob_command),
    };
    TraceEntry::new("classifier", description, serde_json::to_value(signal).unwrap_or_default())
}

/// Looser cues tried in order when no rule claimed the text.
fn heuristic_plan(text: &str, snapshot: &Snapshot) -> DeterministicPlan {
    if looks_scheduled(text) {
        return tentative_flow(text, snapshot, FLOW_HEURISTIC_CONFIDENCE);
    }
    if has_any(&words(text), &["budget", "budgets"]) {
        return tentative_budget(text, snapshot, BUDGET_HEURISTIC_CONFIDENCE);
    }
    if let Some(plan) = tentative_expense(text, snapshot, EXPENSE_HEURISTIC_CONFIDENCE) {
        return plan;
    }
    fallback_plan("no_rule_matched")
}

/// The single safe default: a no-op summary with an explanation.
pub fn fallback_plan(reason: &str) -> DeterministicPlan {
    DeterministicPlan {
        intent: Intent::unrecognized(reason),
        message: FALLBACK_MESSAGE.to_string(),
        confidence: MIN_CONFIDENCE,
        editable: None,
        trace: vec![TraceEntry::new("fallback", "no actionable intent", json!({ "reason": reason }))],
    }
}
