//! Classifier boundary and the adapter that scores validated matrices

use crate::error::ScoringError;
use crate::types::dataset::FeatureMatrix;
use crate::types::value::FeatureValue;
use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

/// A loaded binary fraud classifier.
///
/// Rows are contract-ordered coerced values. Implementations must return
/// exactly one entry per row, in row order.
pub trait Classifier: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Predicted label per row: 1 = fraud, 0 = non-fraud
    fn predict(&self, rows: &[Vec<FeatureValue>]) -> Result<Vec<u8>>;

    /// `[p(non-fraud), p(fraud)]` per row
    fn predict_proba(&self, rows: &[Vec<FeatureValue>]) -> Result<Vec<[f64; 2]>>;

    /// Labels and probabilities together.
    ///
    /// Backends that derive both from one model run should override this so
    /// a batch is evaluated once.
    fn predict_with_proba(&self, rows: &[Vec<FeatureValue>]) -> Result<(Vec<u8>, Vec<[f64; 2]>)> {
        Ok((self.predict(rows)?, self.predict_proba(rows)?))
    }
}

/// Labels and fraud probabilities for a batch, aligned with its rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Predictions {
    labels: Vec<u8>,
    /// Fraud probability, percent
    probabilities: Vec<f64>,
}

impl Predictions {
    pub(crate) fn new(labels: Vec<u8>, probabilities: Vec<f64>) -> Self {
        Self {
            labels,
            probabilities,
        }
    }

    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn fraud_count(&self) -> usize {
        self.labels.iter().filter(|&&label| label == 1).count()
    }
}

/// Uniform scoring interface over an injected [`Classifier`].
#[derive(Clone)]
pub struct ClassifierAdapter {
    classifier: Arc<dyn Classifier>,
}

impl ClassifierAdapter {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    /// Score every row of a validated matrix.
    ///
    /// Any classifier failure, or output that is not one binary label and
    /// one probability per row, is an [`ScoringError::Inference`].
    pub fn score(&self, matrix: &FeatureMatrix) -> Result<Predictions, ScoringError> {
        self.score_rows(matrix.rows())
    }

    pub(crate) fn score_rows(&self, rows: &[Vec<FeatureValue>]) -> Result<Predictions, ScoringError> {
        if rows.is_empty() {
            return Ok(Predictions::new(Vec::new(), Vec::new()));
        }

        let (labels, probabilities) = self
            .classifier
            .predict_with_proba(rows)
            .map_err(|e| ScoringError::Inference(format!("{:#}", e)))?;

        if labels.len() != rows.len() || probabilities.len() != rows.len() {
            return Err(ScoringError::Inference(format!(
                "classifier '{}' returned {} labels and {} probabilities for {} rows",
                self.classifier.name(),
                labels.len(),
                probabilities.len(),
                rows.len()
            )));
        }
        if let Some(label) = labels.iter().find(|&&label| label > 1) {
            return Err(ScoringError::Inference(format!(
                "classifier '{}' returned non-binary label {}",
                self.classifier.name(),
                label
            )));
        }

        let mut fraud_probabilities = Vec::with_capacity(rows.len());
        for [_, fraud] in probabilities {
            if !(0.0..=1.0).contains(&fraud) {
                return Err(ScoringError::Inference(format!(
                    "classifier '{}' returned probability {} outside [0, 1]",
                    self.classifier.name(),
                    fraud
                )));
            }
            fraud_probabilities.push(fraud * 100.0);
        }

        debug!(
            classifier = %self.classifier.name(),
            rows = rows.len(),
            "Batch scored"
        );

        Ok(Predictions::new(labels, fraud_probabilities))
    }
}
