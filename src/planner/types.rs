use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::intent::Intent;

pub const MIN_CONFIDENCE: f32 = 0.20;
pub const MAX_CONFIDENCE: f32 = 0.92;

/// Heuristic scores never claim certainty in either direction.
pub fn clamp_confidence(raw: f32) -> f32 {
    if raw.is_nan() {
        return MIN_CONFIDENCE;
    }
    raw.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Money,
    Entity,
    Text,
    Date,
    Time,
    Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditableField {
    pub key: String,
    pub label: String,
    pub value: String,
    pub kind: FieldKind,
}

/// A confirmation sentence with `{key}` placeholders the caller can render
/// as editable slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditableMessage {
    pub template: String,
    pub fields: Vec<EditableField>,
}

impl EditableMessage {
    pub fn new(template: impl Into<String>) -> Self {
        Self { template: template.into(), fields: Vec::new() }
    }

    pub fn field(mut self, key: &str, label: &str, value: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(EditableField { key: key.to_string(), label: label.to_string(), value: value.into(), kind });
        self
    }

    /// Template with every placeholder filled from the current values.
    pub fn render(&self) -> String {
        self.fields.iter().fold(self.template.clone(), |acc, f| acc.replace(&format!("{{{}}}", f.key), &f.value))
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.fields.iter().find(|f| f.key == key).map(|f| f.value.as_str())
    }
}

/// One step of planner diagnostics. Never shown to end users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub phase: String,
    pub description: String,
    pub data: Value,
}

impl TraceEntry {
    pub fn new(phase: &str, description: impl Into<String>, data: Value) -> Self {
        Self { phase: phase.to_string(), description: description.into(), data }
    }
}

/// What a deterministic rule or a fallback heuristic proposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeterministicPlan {
    pub intent: Intent,
    pub message: String,
    pub confidence: f32,
    pub editable: Option<EditableMessage>,
    pub trace: Vec<TraceEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerResult {
    pub intent: Intent,
    pub message: String,
    pub confidence: f32,
    pub editable: Option<EditableMessage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<TraceEntry>,
}

impl From<DeterministicPlan> for PlannerResult {
    fn from(plan: DeterministicPlan) -> Self {
        Self {
            intent: plan.intent,
            message: plan.message,
            confidence: clamp_confidence(plan.confidence),
            editable: plan.editable,
            trace: plan.trace,
        }
    }
}
