//! Classifier boundary, ONNX backend and batch statistics

pub mod aggregator;
pub mod classifier;
pub mod inference;
pub mod loader;

pub use aggregator::FraudAggregator;
pub use classifier::{Classifier, ClassifierAdapter, Predictions};
pub use inference::{FeatureEncoder, OnnxClassifier};
pub use loader::ModelLoader;
