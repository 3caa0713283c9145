//! Batch statistics and the summary handed back to the presentation layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fraud counts and percentages for one scored batch.
///
/// `fraud_count + non_fraud_count == total`. The `original_*` fields are
/// `None` when the upload carried no ground-truth column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateStatistics {
    pub total: usize,
    pub fraud_count: usize,
    pub non_fraud_count: usize,
    /// Predicted fraud share, percent, two decimals
    pub fraud_ratio: f64,
    /// Predicted non-fraud share, percent, two decimals
    pub non_fraud_ratio: f64,
    pub original_fraud_count: Option<i64>,
    pub original_ratio: Option<f64>,
}

impl AggregateStatistics {
    /// Human-readable status line for the batch.
    ///
    /// Ratios always show a decimal point (`50.0%`, `66.67%`).
    pub fn message(&self) -> String {
        let mut message = format!(
            "✅ Prediction complete: {} frauds detected out of {} transactions ({:?}%) | Non-frauds: {} ({:?}%)",
            self.fraud_count, self.total, self.fraud_ratio, self.non_fraud_count, self.non_fraud_ratio
        );
        if let (Some(count), Some(ratio)) = (self.original_fraud_count, self.original_ratio) {
            message.push_str(&format!(" | Before prediction: {} frauds ({:?}%)", count, ratio));
        }
        message
    }
}

/// Everything a successful batch produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Request identifier
    pub run_id: Uuid,
    /// When scoring finished
    pub scored_at: DateTime<Utc>,
    pub statistics: AggregateStatistics,
    /// Path of the written artifact, as a download link
    pub download_link: String,
    /// HTML table of the first predicted rows, fraud rows highlighted
    pub preview: String,
    /// HTML table of the first uploaded rows, unmodified
    pub original_preview: String,
}

impl BatchSummary {
    pub fn message(&self) -> String {
        self.statistics.message()
    }
}

/// What the presentation layer embeds in its page.
///
/// Failed requests carry only a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub message: String,
    pub download_link: Option<String>,
    pub preview: Option<String>,
    pub original_preview: Option<String>,
}

impl BatchResponse {
    pub fn failure(message: String) -> Self {
        Self {
            message,
            ..Self::default()
        }
    }
}

impl From<BatchSummary> for BatchResponse {
    fn from(summary: BatchSummary) -> Self {
        Self {
            message: summary.message(),
            download_link: Some(summary.download_link),
            preview: Some(summary.preview),
            original_preview: Some(summary.original_preview),
        }
    }
}

/// Result of scoring one record from form input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecordScore {
    /// 1 = fraud, 0 = non-fraud
    pub label: u8,
    /// Fraud probability, percent
    pub probability: f64,
}

impl RecordScore {
    pub fn message(&self) -> String {
        if self.label == 1 {
            format!(
                "⚠️ Suspicious transaction detected ({:.2}% fraud probability)",
                self.probability
            )
        } else {
            format!(
                "✅ Normal transaction ({:.2}% fraud probability)",
                self.probability
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(original: Option<(i64, f64)>) -> AggregateStatistics {
        AggregateStatistics {
            total: 3,
            fraud_count: 2,
            non_fraud_count: 1,
            fraud_ratio: 66.67,
            non_fraud_ratio: 33.33,
            original_fraud_count: original.map(|(count, _)| count),
            original_ratio: original.map(|(_, ratio)| ratio),
        }
    }

    #[test]
    fn test_message_without_ground_truth() {
        let message = stats(None).message();
        assert!(message.contains("2 frauds detected out of 3 transactions (66.67%)"));
        assert!(message.contains("Non-frauds: 1 (33.33%)"));
        assert!(!message.contains("Before prediction"));
    }

    #[test]
    fn test_message_with_ground_truth() {
        let message = stats(Some((1, 33.33))).message();
        assert!(message.ends_with("| Before prediction: 1 frauds (33.33%)"));
    }

    #[test]
    fn test_whole_ratios_keep_decimal_point() {
        let stats = AggregateStatistics {
            total: 4,
            fraud_count: 2,
            non_fraud_count: 2,
            fraud_ratio: 50.0,
            non_fraud_ratio: 50.0,
            original_fraud_count: Some(0),
            original_ratio: Some(0.0),
        };
        assert_eq!(
            stats.message(),
            "✅ Prediction complete: 2 frauds detected out of 4 transactions (50.0%) \
             | Non-frauds: 2 (50.0%) | Before prediction: 0 frauds (0.0%)"
        );
    }

    #[test]
    fn test_record_score_message() {
        let fraud = RecordScore {
            label: 1,
            probability: 87.456,
        };
        assert_eq!(
            fraud.message(),
            "⚠️ Suspicious transaction detected (87.46% fraud probability)"
        );
        let normal = RecordScore {
            label: 0,
            probability: 3.0,
        };
        assert_eq!(normal.message(), "✅ Normal transaction (3.00% fraud probability)");
    }

    #[test]
    fn test_failure_response() {
        let response = BatchResponse::failure("❌ Error: no file received".to_string());
        assert!(response.download_link.is_none());
        assert!(response.preview.is_none());
    }
}
