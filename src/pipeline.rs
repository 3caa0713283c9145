//! Batch and single-record scoring requests.
//!
//! [`BatchScorer`] owns one instance of every stage and runs a request start
//! to finish on the calling thread: ingest, schema validation, scoring,
//! statistics, artifact, previews. Failures stay typed until the `respond*`
//! methods, which log them and turn them into the one message the user sees.

use crate::config::AppConfig;
use crate::contract::FeatureContract;
use crate::error::ScoringError;
use crate::ingest::UploadReader;
use crate::materializer::ResultMaterializer;
use crate::metrics::ScoringMetrics;
use crate::models::aggregator::FraudAggregator;
use crate::models::classifier::{Classifier, ClassifierAdapter};
use crate::types::dataset::Dataset;
use crate::types::summary::{BatchResponse, BatchSummary, RecordScore};
use crate::types::value::FeatureValue;
use crate::validator::SchemaValidator;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Scores uploads and form records with an injected classifier.
pub struct BatchScorer {
    reader: UploadReader,
    validator: SchemaValidator,
    adapter: ClassifierAdapter,
    aggregator: FraudAggregator,
    materializer: ResultMaterializer,
    metrics: Arc<ScoringMetrics>,
}

impl BatchScorer {
    /// Build a scorer from configuration around an already-loaded classifier.
    pub fn new(contract: FeatureContract, classifier: Arc<dyn Classifier>, config: &AppConfig) -> Self {
        Self {
            reader: UploadReader::new(),
            validator: SchemaValidator::new(contract),
            adapter: ClassifierAdapter::new(classifier),
            aggregator: FraudAggregator::new(config.statistics.rounding),
            materializer: ResultMaterializer::from_config(config),
            metrics: Arc::new(ScoringMetrics::new()),
        }
    }

    /// Replace the artifact writer (e.g. to point it at another directory).
    pub fn with_materializer(mut self, materializer: ResultMaterializer) -> Self {
        self.materializer = materializer;
        self
    }

    pub fn metrics(&self) -> &Arc<ScoringMetrics> {
        &self.metrics
    }

    pub fn contract(&self) -> &FeatureContract {
        self.validator.contract()
    }

    /// Score an uploaded file; `None` means the caller received no file.
    pub fn score_upload(&self, upload: Option<&[u8]>) -> Result<BatchSummary, ScoringError> {
        let bytes = upload.ok_or(ScoringError::NoFile)?;
        let dataset = self.reader.read_bytes(bytes)?;
        self.score_dataset(&dataset)
    }

    /// Score an already-parsed upload.
    ///
    /// Nothing is written unless every step before persistence succeeds.
    pub fn score_dataset(&self, dataset: &Dataset) -> Result<BatchSummary, ScoringError> {
        let started = Instant::now();
        let run_id = Uuid::new_v4();
        info!(
            run_id = %run_id,
            rows = dataset.row_count(),
            columns = dataset.headers().len(),
            "Scoring batch"
        );

        let validated = self.validator.validate(dataset)?;
        if validated.matrix.is_empty() {
            return Err(ScoringError::EmptyDataset);
        }

        let predictions = self.adapter.score(&validated.matrix)?;
        let statistics = self
            .aggregator
            .summarize(&predictions, validated.ground_truth.as_ref())?;

        let merged = ResultMaterializer::merge(&validated.matrix, &predictions);
        let path = self.materializer.persist(&merged, run_id)?;
        let preview = self.materializer.predicted_preview(&merged);
        let original_preview = self.materializer.original_preview(dataset);

        let elapsed = started.elapsed();
        self.metrics
            .record_batch(elapsed, statistics.total, statistics.fraud_count);
        info!(
            run_id = %run_id,
            classifier = %self.adapter.classifier_name(),
            total = statistics.total,
            frauds = statistics.fraud_count,
            fraud_ratio = statistics.fraud_ratio,
            original_frauds = ?statistics.original_fraud_count,
            processing_time_us = elapsed.as_micros(),
            "Batch scored"
        );

        Ok(BatchSummary {
            run_id,
            scored_at: Utc::now(),
            statistics,
            download_link: path.to_string_lossy().replace('\\', "/"),
            preview,
            original_preview,
        })
    }

    /// Request boundary for batch uploads: never fails, always a message.
    pub fn respond(&self, upload: Option<&[u8]>) -> BatchResponse {
        match self.score_upload(upload) {
            Ok(summary) => summary.into(),
            Err(e) => {
                self.metrics.record_failure(e.kind());
                error!(kind = e.kind(), error = ?e, "Batch scoring failed");
                BatchResponse::failure(e.user_message())
            }
        }
    }

    /// Score one record from form input.
    ///
    /// Contract fields absent from the form are scored as empty text.
    pub fn score_record(&self, form: &HashMap<String, String>) -> Result<RecordScore, ScoringError> {
        let row: Vec<FeatureValue> = self
            .contract()
            .feature_names()
            .into_iter()
            .map(|name| FeatureValue::coerce(form.get(name).map(String::as_str).unwrap_or("")))
            .collect();
        debug!(fields = form.len(), "Scoring single record");

        let predictions = self.adapter.score_rows(std::slice::from_ref(&row))?;
        let score = RecordScore {
            label: predictions.labels()[0],
            probability: predictions.probabilities()[0],
        };
        self.metrics.record_record();
        info!(
            label = score.label,
            probability = score.probability,
            "Record scored"
        );
        Ok(score)
    }

    /// Request boundary for form input.
    pub fn respond_record(&self, form: &HashMap<String, String>) -> String {
        match self.score_record(form) {
            Ok(score) => score.message(),
            Err(e) => {
                self.metrics.record_failure(e.kind());
                error!(kind = e.kind(), error = ?e, "Record scoring failed");
                format!("❌ Prediction error: {}", e)
            }
        }
    }
}
