//! Fraud statistics for a scored batch

use crate::config::RoundingPolicy;
use crate::error::ScoringError;
use crate::models::classifier::Predictions;
use crate::types::dataset::GroundTruth;
use crate::types::summary::AggregateStatistics;

/// Round to two decimals, exact halves to even (`3.125` -> `3.12`).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Percentage of `count` in `total`, rounded to two decimals.
fn ratio(count: f64, total: usize) -> f64 {
    round2(count / total as f64 * 100.0)
}

/// Turns predictions (and optional ground truth) into batch statistics.
#[derive(Debug, Clone, Default)]
pub struct FraudAggregator {
    rounding: RoundingPolicy,
}

impl FraudAggregator {
    pub fn new(rounding: RoundingPolicy) -> Self {
        Self { rounding }
    }

    pub fn rounding(&self) -> RoundingPolicy {
        self.rounding
    }

    /// Count and ratio the predicted labels.
    ///
    /// An empty batch is an error rather than a division by zero.
    pub fn summarize(
        &self,
        predictions: &Predictions,
        ground_truth: Option<&GroundTruth>,
    ) -> Result<AggregateStatistics, ScoringError> {
        let total = predictions.len();
        if total == 0 {
            return Err(ScoringError::EmptyDataset);
        }

        let fraud_count = predictions.fraud_count();
        let non_fraud_count = total - fraud_count;
        let fraud_ratio = ratio(fraud_count as f64, total);
        let non_fraud_ratio = match self.rounding {
            RoundingPolicy::Asymmetric => round2(100.0 - fraud_ratio),
            RoundingPolicy::Symmetric => ratio(non_fraud_count as f64, total),
        };

        let (original_fraud_count, original_ratio) = match ground_truth {
            Some(truth) => {
                let count = Self::ground_truth_count(truth)?;
                (Some(count), Some(ratio(count as f64, total)))
            }
            None => (None, None),
        };

        Ok(AggregateStatistics {
            total,
            fraud_count,
            non_fraud_count,
            fraud_ratio,
            non_fraud_ratio,
            original_fraud_count,
            original_ratio,
        })
    }

    /// Sum of the ground-truth flags, truncated to an integer.
    ///
    /// Empty cells are skipped; any other non-numeric cell fails the request.
    fn ground_truth_count(truth: &GroundTruth) -> Result<i64, ScoringError> {
        let mut sum = 0.0;
        for (row, cell) in truth.values().iter().enumerate() {
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }
            let flag: f64 = cell.parse().map_err(|_| {
                ScoringError::Ingest(format!(
                    "non-numeric fraud flag '{}' at row {}",
                    cell,
                    row + 1
                ))
            })?;
            if flag.is_finite() {
                sum += flag;
            }
        }
        Ok(sum.trunc() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn predictions(labels: &[u8]) -> Predictions {
        Predictions::new(
            labels.to_vec(),
            labels.iter().map(|&l| if l == 1 { 90.0 } else { 10.0 }).collect(),
        )
    }

    fn truth(values: &[&str]) -> GroundTruth {
        GroundTruth::new(values.iter().map(|v| v.to_string()).collect())
    }

    #[test]
    fn test_three_row_batch() {
        let stats = FraudAggregator::default()
            .summarize(&predictions(&[1, 0, 1]), None)
            .unwrap();

        assert_eq!(stats.total, 3);
        assert_eq!(stats.fraud_count, 2);
        assert_eq!(stats.non_fraud_count, 1);
        assert_eq!(stats.fraud_ratio, 66.67);
        assert_eq!(stats.non_fraud_ratio, 33.33);
        assert!(stats.original_fraud_count.is_none());
        assert!(stats.original_ratio.is_none());
    }

    #[test]
    fn test_counts_and_ratios_consistent() {
        let aggregator = FraudAggregator::default();
        for n in 1..40usize {
            let labels: Vec<u8> = (0..n).map(|i| u8::from(i % 3 == 0)).collect();
            let stats = aggregator.summarize(&predictions(&labels), None).unwrap();

            assert_eq!(stats.fraud_count + stats.non_fraud_count, stats.total);
            assert_eq!(
                stats.fraud_ratio,
                round2(stats.fraud_count as f64 / stats.total as f64 * 100.0)
            );
            assert!((stats.fraud_ratio + stats.non_fraud_ratio - 100.0).abs() <= 0.01 + 1e-9);
        }
    }

    #[test]
    fn test_exact_halves_round_to_even() {
        let mut labels = vec![0u8; 32];
        labels[0] = 1;
        let stats = FraudAggregator::default()
            .summarize(&predictions(&labels), None)
            .unwrap();
        assert_eq!(stats.fraud_ratio, 3.12);
        assert_eq!(stats.non_fraud_ratio, 96.88);

        labels[1..5].fill(1);
        let stats = FraudAggregator::default()
            .summarize(&predictions(&labels), None)
            .unwrap();
        assert_eq!(stats.fraud_ratio, 15.62);

        assert_eq!(round2(1.0 / 800.0 * 100.0), 0.12);
    }

    #[test]
    fn test_symmetric_rounding() {
        let aggregator = FraudAggregator::new(RoundingPolicy::Symmetric);
        let stats = aggregator
            .summarize(&predictions(&[1, 0, 0, 0, 0, 0]), None)
            .unwrap();
        assert_eq!(stats.fraud_ratio, 16.67);
        assert_eq!(stats.non_fraud_ratio, 83.33);
    }

    #[test]
    fn test_empty_batch() {
        let err = FraudAggregator::default()
            .summarize(&predictions(&[]), None)
            .unwrap_err();
        assert!(matches!(err, ScoringError::EmptyDataset));
    }

    #[test]
    fn test_ground_truth_comparison() {
        let stats = FraudAggregator::default()
            .summarize(&predictions(&[1, 0, 1, 0]), Some(&truth(&["1", "", "0", "1.0"])))
            .unwrap();
        assert_eq!(stats.original_fraud_count, Some(2));
        assert_eq!(stats.original_ratio, Some(50.0));
    }

    #[test]
    fn test_ground_truth_all_zero_is_not_unknown() {
        let stats = FraudAggregator::default()
            .summarize(&predictions(&[0, 0]), Some(&truth(&["0", "0"])))
            .unwrap();
        assert_eq!(stats.original_fraud_count, Some(0));
        assert_eq!(stats.original_ratio, Some(0.0));
    }

    #[test]
    fn test_non_numeric_ground_truth() {
        let err = FraudAggregator::default()
            .summarize(&predictions(&[1]), Some(&truth(&["yes"])))
            .unwrap_err();
        assert!(matches!(err, ScoringError::Ingest(msg) if msg.contains("yes")));
    }
}
