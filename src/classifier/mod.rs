//! Command detection and tool prediction.
//!
//! Two linear models share one vectorizer: a binary "is this a command"
//! model and a one-vs-rest tool model. Classification is pure and never
//! fails; unrecognized input degrades to "not a command".

pub mod model;
pub mod vectorize;

use std::collections::BTreeMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use model::{ClassifierModel, ModelError};

use crate::intent::ToolName;

pub const DEFAULT_COMMAND_THRESHOLD: f32 = 0.6;

const PACKAGED_COMMAND_MODEL: &str = include_str!("../../data/classifier/command.json");
const PACKAGED_TOOL_MODEL: &str = include_str!("../../data/classifier/tool.json");

static PACKAGED: OnceCell<Arc<Classifier>> = OnceCell::new();

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierSignal {
    pub prob_command: f32,
    pub is_command: bool,
    pub top_intent: Option<String>,
    /// Independent per-class probabilities; these do not sum to 1.
    pub intent_probabilities: Option<BTreeMap<String, f32>>,
}

impl ClassifierSignal {
    fn not_command(prob_command: f32) -> Self {
        Self { prob_command, is_command: false, top_intent: None, intent_probabilities: None }
    }

    /// The predicted tool, when it names one of the planner's rules.
    pub fn top_tool(&self) -> Option<ToolName> {
        self.top_intent.as_deref().and_then(|label| label.parse().ok())
    }
}

#[derive(Debug)]
pub struct Classifier {
    command: ClassifierModel,
    tool: ClassifierModel,
}

impl Classifier {
    pub fn new(command: ClassifierModel, tool: ClassifierModel) -> Result<Self, ModelError> {
        command.validate()?;
        tool.validate()?;
        if command.classes.len() != 1 {
            return Err(ModelError::RowCount {
                classes: 1,
                rows: command.coefficients.len(),
                intercepts: command.intercepts.len(),
            });
        }
        Ok(Self { command, tool })
    }

    pub fn from_json(command: &str, tool: &str) -> Result<Self, ModelError> {
        Self::new(ClassifierModel::from_json(command)?, ClassifierModel::from_json(tool)?)
    }

    /// The models shipped with the crate, parsed on first use and shared.
    pub fn packaged() -> Result<Arc<Self>, ModelError> {
        PACKAGED
            .get_or_try_init(|| Self::from_json(PACKAGED_COMMAND_MODEL, PACKAGED_TOOL_MODEL).map(Arc::new))
            .cloned()
    }

    pub fn classify(&self, text: &str) -> ClassifierSignal {
        self.classify_with_threshold(text, DEFAULT_COMMAND_THRESHOLD)
    }

    pub fn classify_with_threshold(&self, text: &str, threshold: f32) -> ClassifierSignal {
        let vector = vectorize::vectorize(&self.command, text);
        if vector.is_empty() {
            debug!("classifier: no recognized tokens");
            return ClassifierSignal::not_command(0.0);
        }

        let prob_command = self.command.score(0, &vector);
        if prob_command < threshold {
            debug!(prob_command, "classifier: below command threshold");
            return ClassifierSignal::not_command(prob_command);
        }

        let tool_vector = vectorize::vectorize(&self.tool, text);
        let mut probabilities = BTreeMap::new();
        let mut top: Option<(&str, f32)> = None;
        for (row, label) in self.tool.classes.iter().enumerate() {
            let p = self.tool.score(row, &tool_vector);
            probabilities.insert(label.clone(), p);
            // strict comparison keeps the first class on ties
            if top.map_or(true, |(_, best)| p > best) {
                top = Some((label, p));
            }
        }

        debug!(prob_command, top_intent = ?top.map(|t| t.0), "classifier: command detected");
        ClassifierSignal {
            prob_command,
            is_command: true,
            top_intent: top.map(|(label, _)| label.to_string()),
            intent_probabilities: Some(probabilities),
        }
    }
}
