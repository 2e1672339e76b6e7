//! Carries out one intent against the stores.
//!
//! Every executor checks its preconditions before the first write and
//! reports failure as a short sentence; store errors are logged and never
//! surface verbatim.

pub mod expense;
pub mod budget;
pub mod flow;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::AssistantConfig;
use crate::extract::amount::format_money;
use crate::intent::{Intent, ToolName};
use crate::snapshot::Snapshot;
use crate::stores::Stores;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolExecution {
    pub tool: ToolName,
    pub input: Intent,
    pub success: bool,
    pub result_summary: String,
    /// Short failure code such as `no_group` or `store_error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Why an executor stopped, with the sentence shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub code: &'static str,
    pub summary: String,
}

impl Failure {
    pub fn new(code: &'static str, summary: impl Into<String>) -> Self {
        Self { code, summary: summary.into() }
    }
}

pub struct Executor {
    stores: Stores,
    timezone: String,
    default_task_minutes: u32,
}

impl Executor {
    pub fn new(stores: Stores, config: &AssistantConfig) -> Self {
        Self {
            stores,
            timezone: config.timezone.clone(),
            default_task_minutes: config.default_task_minutes,
        }
    }

    pub async fn execute(&self, intent: &Intent, snapshot: &Snapshot) -> ToolExecution {
        let outcome = match intent {
            Intent::AddExpense(input) => expense::add_expense(&self.stores, input, snapshot).await,
            Intent::AddBudgetEntry(input) => budget::add_budget_entry(&self.stores, input, snapshot).await,
            Intent::AddFlowTask(input) => {
                flow::add_flow_task(&self.stores, input, snapshot, &self.timezone, self.default_task_minutes).await
            }
            Intent::SummarizeState(_) => Ok(summarize_state(snapshot)),
        };

        let tool = intent.tool();
        match outcome {
            Ok(summary) => {
                info!(%tool, "executor: done");
                ToolExecution { tool, input: intent.clone(), success: true, result_summary: summary, error: None }
            }
            Err(failure) => {
                warn!(%tool, code = failure.code, "executor: failed");
                ToolExecution {
                    tool,
                    input: intent.clone(),
                    success: false,
                    result_summary: failure.summary,
                    error: Some(failure.code.to_string()),
                }
            }
        }
    }
}

fn count(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("1 {one}")
    } else {
        format!("{n} {many}")
    }
}

/// One-line digest of the snapshot. Makes no store call.
pub fn summarize_state(snapshot: &Snapshot) -> String {
    let mut parts = vec![count(snapshot.groups.len(), "expense group", "expense groups")];
    if let Some(budget) = &snapshot.active_budget {
        parts.push(format!(
            "{} spent in {} this month",
            format_money(budget.spent_minor(), &budget.currency),
            budget.title
        ));
    }
    parts.push(count(snapshot.today_tasks.len(), "task today", "tasks today"));
    parts.push(count(snapshot.recent_items.len(), "recently saved item", "recently saved items"));

    let listed = match parts.as_slice() {
        [init @ .., last] if !init.is_empty() => format!("{} and {}", init.join(", "), last),
        _ => parts.join(""),
    };
    format!("No changes made. You have {listed}.")
}
