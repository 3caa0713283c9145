//! Type definitions for the scoring pipeline

pub mod dataset;
pub mod summary;
pub mod value;

pub use dataset::{Dataset, FeatureMatrix, GroundTruth};
pub use summary::{AggregateStatistics, BatchResponse, BatchSummary, RecordScore};
pub use value::FeatureValue;
