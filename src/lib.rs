//! Fraud Scoring Library
//!
//! Scores uploaded transaction files, and single form records, with a
//! pre-trained binary fraud classifier: schema validation against a fixed
//! feature contract, inference, fraud statistics, an annotated result
//! artifact and bounded HTML previews.

pub mod config;
pub mod contract;
pub mod error;
pub mod ingest;
pub mod materializer;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod sample;
pub mod types;
pub mod validator;

pub use config::AppConfig;
pub use contract::FeatureContract;
pub use error::ScoringError;
pub use ingest::UploadReader;
pub use materializer::ResultMaterializer;
pub use models::classifier::{Classifier, ClassifierAdapter, Predictions};
pub use models::inference::OnnxClassifier;
pub use pipeline::BatchScorer;
pub use types::{AggregateStatistics, BatchResponse, BatchSummary, FeatureValue, RecordScore};
pub use validator::SchemaValidator;
