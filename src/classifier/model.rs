use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MODEL_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model artifact is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported model version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
    #[error("invalid n-gram range [{0}, {1}]")]
    NgramRange(usize, usize),
    #[error("idf has {idf} weights but vocabulary has {vocab} entries")]
    IdfLength { idf: usize, vocab: usize },
    #[error("vocabulary index {index} for {token:?} is out of range")]
    VocabularyIndex { token: String, index: usize },
    #[error("expected {classes} coefficient rows and intercepts, found {rows} rows and {intercepts} intercepts")]
    RowCount { classes: usize, rows: usize, intercepts: usize },
    #[error("coefficient row {row} has {found} columns, expected {expected}")]
    RowWidth { row: usize, found: usize, expected: usize },
    #[error("model has no classes")]
    NoClasses,
}

/// A linear model over smoothed tf-idf n-gram vectors.
///
/// Loaded once from a packaged artifact; immutable afterwards so any number
/// of requests may read it concurrently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierModel {
    pub version: u32,
    /// One label per coefficient row.
    pub classes: Vec<String>,
    pub ngram_range: (usize, usize),
    #[serde(default)]
    pub stop_words: Option<HashSet<String>>,
    pub vocabulary: HashMap<String, usize>,
    pub idf: Vec<f32>,
    pub coefficients: Vec<Vec<f32>>,
    pub intercepts: Vec<f32>,
}

impl ClassifierModel {
    /// Parses and validates a model artifact. A malformed artifact fails
    /// here rather than at the first classification.
    pub fn from_json(raw: &str) -> Result<Self, ModelError> {
        let model: ClassifierModel = serde_json::from_str(raw)?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.version != MODEL_VERSION {
            return Err(ModelError::Version { found: self.version, expected: MODEL_VERSION });
        }
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ModelError::NgramRange(min_n, max_n));
        }
        if self.classes.is_empty() {
            return Err(ModelError::NoClasses);
        }
        let width = self.vocabulary.len();
        if self.idf.len() != width {
            return Err(ModelError::IdfLength { idf: self.idf.len(), vocab: width });
        }
        if let Some((token, &index)) = self.vocabulary.iter().find(|&(_, &i)| i >= width) {
            return Err(ModelError::VocabularyIndex { token: token.clone(), index });
        }
        if self.coefficients.len() != self.classes.len() || self.intercepts.len() != self.classes.len() {
            return Err(ModelError::RowCount {
                classes: self.classes.len(),
                rows: self.coefficients.len(),
                intercepts: self.intercepts.len(),
            });
        }
        for (row, coefs) in self.coefficients.iter().enumerate() {
            if coefs.len() != width {
                return Err(ModelError::RowWidth { row, found: coefs.len(), expected: width });
            }
        }
        Ok(())
    }

    /// Logistic score of one class row against a sparse vector.
    pub fn score(&self, row: usize, vector: &[(usize, f32)]) -> f32 {
        let coefs = &self.coefficients[row];
        let z: f32 = vector.iter().map(|&(i, w)| coefs[i] * w).sum::<f32>() + self.intercepts[row];
        sigmoid(z)
    }
}

pub fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TINY: &str = r#"{
        "version": 1,
        "classes": ["command"],
        "ngram_range": [1, 1],
        "vocabulary": {"add": 0, "hello": 1},
        "idf": [1.0, 1.0],
        "coefficients": [[2.0, -2.0]],
        "intercepts": [0.0]
    }"#;

    #[test]
    fn loads_well_formed_artifact() {
        let model = ClassifierModel::from_json(TINY).unwrap();
        assert_eq!(model.classes, vec!["command"]);
        assert!(model.stop_words.is_none());
    }

    #[test]
    fn rejects_row_width_mismatch() {
        let broken = TINY.replace("[[2.0, -2.0]]", "[[2.0]]");
        assert!(matches!(
            ClassifierModel::from_json(&broken),
            Err(ModelError::RowWidth { row: 0, found: 1, expected: 2 })
        ));
    }

    #[test]
    fn rejects_inverted_ngram_range() {
        let broken = TINY.replace("[1, 1]", "[2, 1]");
        assert!(matches!(ClassifierModel::from_json(&broken), Err(ModelError::NgramRange(2, 1))));
    }

    #[test]
    fn rejects_out_of_range_vocabulary_index() {
        let broken = TINY.replace("\"hello\": 1", "\"hello\": 7");
        assert!(matches!(
            ClassifierModel::from_json(&broken),
            Err(ModelError::VocabularyIndex { index: 7, .. })
        ));
    }
}
