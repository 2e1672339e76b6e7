use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::executor::ToolExecution;
use crate::intent::Intent;
use crate::planner::{EditableMessage, TraceEntry};
use crate::stores::UserIdentity;

/// A confirmed intent sent back with the fields the user edited, keyed by
/// the editable field keys (`amount`, `group`, `description`, `date`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentOverride {
    pub intent: Intent,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestContext {
    pub intent_override: Option<IntentOverride>,
    pub auto_execute: bool,
    pub confirm: bool,
    pub execute: bool,
    /// Include the planner trace in the response.
    pub debug: bool,
}

impl RequestContext {
    pub fn wants_execution(&self) -> bool {
        self.auto_execute || self.confirm || self.execute
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantRequest {
    pub user: UserIdentity,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub context: RequestContext,
}

impl AssistantRequest {
    pub fn new(user: UserIdentity, text: impl Into<String>) -> Self {
        Self { user, text: text.into(), context: RequestContext::default() }
    }

    pub fn executing(mut self) -> Self {
        self.context.execute = true;
        self
    }

    pub fn with_override(mut self, intent_override: IntentOverride) -> Self {
        self.context.intent_override = Some(intent_override);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssistantResponse {
    NeedsConfirmation {
        intent: Intent,
        message: String,
        confidence: f32,
        editable: Option<EditableMessage>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        trace: Vec<TraceEntry>,
    },
    Executed {
        intent: Intent,
        message: String,
        actions: Vec<ToolExecution>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        trace: Vec<TraceEntry>,
    },
    Failed {
        error: String,
    },
}

impl AssistantResponse {
    pub fn failed(error: impl Into<String>) -> Self {
        AssistantResponse::Failed { error: error.into() }
    }

    pub fn status(&self) -> &'static str {
        match self {
            AssistantResponse::NeedsConfirmation { .. } => "needs_confirmation",
            AssistantResponse::Executed { .. } => "executed",
            AssistantResponse::Failed { .. } => "failed",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AssistantResponse::NeedsConfirmation { message, .. } | AssistantResponse::Executed { message, .. } => message,
            AssistantResponse::Failed { error } => error,
        }
    }
}
