//! Error taxonomy for a scoring request

use thiserror::Error;

/// Every way a scoring request can fail.
///
/// Each variant is terminal for its request; the boundary in
/// [`crate::pipeline`] logs it and turns it into a single user-facing message.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// The caller submitted no file at all
    #[error("no file received")]
    NoFile,

    /// The upload is not parseable as tabular data
    #[error("could not read the uploaded file: {0}")]
    Ingest(String),

    /// Required contract columns are absent from the upload
    #[error("missing columns: {missing:?}")]
    Schema { missing: Vec<String> },

    /// The classifier rejected a schema-valid row
    #[error("inference failed: {0}")]
    Inference(String),

    /// Zero rows left after validation
    #[error("the uploaded file contains no transactions")]
    EmptyDataset,

    /// The result artifact could not be written
    #[error("could not write the result artifact: {0}")]
    Persistence(String),
}

impl ScoringError {
    /// Short, stable name of the error kind (used for metrics and log fields).
    pub fn kind(&self) -> &'static str {
        match self {
            ScoringError::NoFile => "no_file",
            ScoringError::Ingest(_) => "ingest",
            ScoringError::Schema { .. } => "schema",
            ScoringError::Inference(_) => "inference",
            ScoringError::EmptyDataset => "empty_dataset",
            ScoringError::Persistence(_) => "persistence",
        }
    }

    /// Message shown to the person who submitted the request.
    pub fn user_message(&self) -> String {
        format!("❌ Error: {}", self)
    }
}

impl From<csv::Error> for ScoringError {
    fn from(err: csv::Error) -> Self {
        ScoringError::Ingest(err.to_string())
    }
}
