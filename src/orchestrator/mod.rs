//! Request -> response.
//!
//! One request runs identity check, snapshot, plan (or confirmed override),
//! then either stops at `needs_confirmation` or executes. Nothing outside
//! the executors writes, and nothing before the snapshot reads.

pub mod overrides;
pub mod types;

pub use overrides::apply_override;
pub use types::*;

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::classifier::{Classifier, ModelError};
use crate::config::{AssistantConfig, ExecutionMode};
use crate::executor::{Executor, ToolExecution};
use crate::intent::Intent;
use crate::planner::{Planner, PlannerResult, TraceEntry, MAX_CONFIDENCE};
use crate::snapshot::{Snapshot, SnapshotBuilder};
use crate::stores::Stores;

const NO_IDENTITY: &str = "I need to know who you are before I can do anything. Sign in and try again.";
const EMPTY_TEXT: &str = "Tell me what you'd like to do, for example \"add 20 for lunch to Roommates\".";

pub struct Assistant {
    config: AssistantConfig,
    snapshots: SnapshotBuilder,
    planner: Planner,
    executor: Executor,
}

impl Assistant {
    pub fn new(config: AssistantConfig, stores: Stores, classifier: Arc<Classifier>) -> Self {
        Self {
            snapshots: SnapshotBuilder::new(stores.clone(), &config),
            planner: Planner::new(classifier, config.command_threshold),
            executor: Executor::new(stores, &config),
            config,
        }
    }

    /// Assistant over the classifier models shipped with the crate.
    pub fn packaged(config: AssistantConfig, stores: Stores) -> Result<Self, ModelError> {
        Ok(Self::new(config, stores, Classifier::packaged()?))
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    pub async fn handle(&self, request: AssistantRequest) -> AssistantResponse {
        self.handle_on(request, self.config.today()).await
    }

    /// [`Assistant::handle`] with an explicit local date.
    pub async fn handle_on(&self, request: AssistantRequest, today: NaiveDate) -> AssistantResponse {
        let AssistantRequest { user, text, context } = request;
        if !user.is_present() {
            warn!("orchestrator: request without identity");
            return AssistantResponse::failed(NO_IDENTITY);
        }
        let text = text.trim();
        if text.is_empty() && context.intent_override.is_none() {
            warn!(user = user.key().unwrap_or_default(), "orchestrator: empty request");
            return AssistantResponse::failed(EMPTY_TEXT);
        }
        debug!(%text, "orchestrator: request");

        let snapshot = self.snapshots.build(&user, today).await;
        let planned = match &context.intent_override {
            Some(over) => self.confirmed(over, &snapshot),
            None => self.planner.plan(text, &snapshot),
        };
        info!(
            user = user.key().unwrap_or_default(),
            tool = %planned.intent.tool(),
            confidence = planned.confidence,
            "orchestrator: planned"
        );

        let include_trace = context.debug || self.config.debug_trace;
        let trace = if include_trace { planned.trace.clone() } else { Vec::new() };

        let should_execute = context.wants_execution() || self.config.execution_mode == ExecutionMode::Auto;
        if !should_execute {
            return AssistantResponse::NeedsConfirmation {
                intent: planned.intent,
                message: planned.message,
                confidence: planned.confidence,
                editable: planned.editable,
                trace,
            };
        }

        let actions = vec![self.executor.execute(&planned.intent, &snapshot).await];
        let message = response_message(&actions, &planned.message);
        info!(
            succeeded = actions.iter().filter(|a| a.success).count(),
            attempted = actions.len(),
            "orchestrator: executed"
        );
        AssistantResponse::Executed { intent: planned.intent, message, actions, trace }
    }

    fn confirmed(&self, over: &IntentOverride, snapshot: &Snapshot) -> PlannerResult {
        let intent = apply_override(over, snapshot.today, &self.config.default_currency);
        PlannerResult {
            message: confirmation_message(&intent),
            confidence: MAX_CONFIDENCE,
            editable: None,
            trace: vec![TraceEntry::new(
                "override",
                format!("applied {} edited fields", over.fields.len()),
                json!({ "fields": over.fields }),
            )],
            intent,
        }
    }
}

fn confirmation_message(intent: &Intent) -> String {
    match intent {
        Intent::AddExpense(_) => "Adding the expense as edited.".to_string(),
        Intent::AddBudgetEntry(_) => "Adding the budget entry as edited.".to_string(),
        Intent::AddFlowTask(_) => "Scheduling the task as edited.".to_string(),
        Intent::SummarizeState(_) => "Here's where things stand.".to_string(),
    }
}

/// First successful summary, else the first summary, else the plan's message.
pub fn response_message(actions: &[ToolExecution], planned: &str) -> String {
    actions
        .iter()
        .find(|a| a.success)
        .or_else(|| actions.first())
        .map(|a| a.result_summary.clone())
        .unwrap_or_else(|| planned.to_string())
}
