//! CSV ingest for uploaded transaction files

use crate::error::ScoringError;
use crate::types::dataset::Dataset;
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::io::Read;
use tracing::debug;

/// Parses uploads into a [`Dataset`].
#[derive(Debug, Clone)]
pub struct UploadReader {
    delimiter: u8,
}

impl UploadReader {
    /// Reader for comma-separated uploads.
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Parse an in-memory upload.
    pub fn read_bytes(&self, bytes: &[u8]) -> Result<Dataset, ScoringError> {
        self.read(bytes)
    }

    /// Parse a header row plus data rows from any reader.
    ///
    /// Fails with [`ScoringError::Ingest`] on a missing or duplicated header,
    /// ragged rows, or invalid UTF-8.
    pub fn read<R: Read>(&self, source: R) -> Result<Dataset, ScoringError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .delimiter(self.delimiter)
            .from_reader(source);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
            return Err(ScoringError::Ingest("no header row".to_string()));
        }

        let mut seen = HashSet::new();
        if let Some(duplicate) = headers.iter().find(|h| !seen.insert(h.as_str())) {
            return Err(ScoringError::Ingest(format!(
                "duplicate column '{}'",
                duplicate
            )));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        debug!(
            columns = headers.len(),
            rows = rows.len(),
            "Upload parsed"
        );

        Dataset::new(headers, rows)
            .ok_or_else(|| ScoringError::Ingest("row width does not match header".to_string()))
    }
}

impl Default for UploadReader {
    fn default() -> Self {
        Self::new()
    }
}
