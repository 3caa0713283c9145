//! Schema validation of uploads against the feature contract

use crate::contract::{FeatureContract, GROUND_TRUTH_COLUMN};
use crate::error::ScoringError;
use crate::types::dataset::{Dataset, FeatureMatrix, GroundTruth};
use tracing::{debug, info};

/// Outcome of a successful validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedUpload {
    /// Contract columns only, in contract order
    pub matrix: FeatureMatrix,
    /// Ground-truth column, when the upload carried one
    pub ground_truth: Option<GroundTruth>,
    /// Columns that were present but outside the contract
    pub dropped_columns: Vec<String>,
}

/// Checks uploads against a [`FeatureContract`].
pub struct SchemaValidator {
    contract: FeatureContract,
}

impl SchemaValidator {
    pub fn new(contract: FeatureContract) -> Self {
        Self { contract }
    }

    pub fn contract(&self) -> &FeatureContract {
        &self.contract
    }

    /// Restrict and reorder a dataset to the contract.
    ///
    /// Every missing contract column is reported at once. Extra columns are
    /// dropped and the ground-truth column is split off, never scored.
    pub fn validate(&self, dataset: &Dataset) -> Result<ValidatedUpload, ScoringError> {
        let names = self.contract.feature_names();

        let missing: Vec<String> = names
            .iter()
            .filter(|name| dataset.column_index(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            info!(missing = ?missing, "Upload rejected: missing contract columns");
            return Err(ScoringError::Schema { missing });
        }

        let indices: Vec<usize> = names
            .iter()
            .filter_map(|name| dataset.column_index(name))
            .collect();

        let raw = dataset
            .rows()
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();

        let ground_truth = dataset.column(GROUND_TRUTH_COLUMN).map(|column| {
            GroundTruth::new(column.into_iter().map(str::to_string).collect())
        });

        let dropped_columns: Vec<String> = dataset
            .headers()
            .iter()
            .filter(|h| !self.contract.contains(h) && h.as_str() != GROUND_TRUTH_COLUMN)
            .cloned()
            .collect();
        if !dropped_columns.is_empty() {
            debug!(dropped = ?dropped_columns, "Dropping columns outside the contract");
        }

        Ok(ValidatedUpload {
            matrix: FeatureMatrix::from_validated(
                names.iter().map(|name| name.to_string()).collect(),
                raw,
            ),
            ground_truth,
            dropped_columns,
        })
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new(FeatureContract::transactions())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Header and `rows` rows holding every contract column, in reverse
    /// contract order, followed by `extra` columns.
    pub(crate) fn upload(rows: usize, extra: &[&str], without: &[&str]) -> Dataset {
        let mut headers: Vec<String> = FeatureContract::transactions()
            .feature_names()
            .into_iter()
            .rev()
            .filter(|name| !without.contains(name))
            .map(str::to_string)
            .collect();
        headers.extend(extra.iter().map(|name| name.to_string()));

        let data = (0..rows)
            .map(|r| {
                headers
                    .iter()
                    .map(|h| match h.as_str() {
                        GROUND_TRUTH_COLUMN => (r % 2).to_string(),
                        "Gender" => (if r % 2 == 0 { "M" } else { "F" }).to_string(),
                        _ => format!("{}", r + 1),
                    })
                    .collect()
            })
            .collect();
        Dataset::new(headers, data).unwrap()
    }

    #[test]
    fn test_reports_every_missing_column() {
        let dataset = upload(2, &[], &["CardExpiryDate", "ProductID"]);
        let err = SchemaValidator::default().validate(&dataset).unwrap_err();
        match err {
            ScoringError::Schema { missing } => {
                assert_eq!(missing, vec!["CardExpiryDate", "ProductID"])
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_age_and_cif() {
        let dataset = upload(1, &["Notes"], &["Age", "CIF"]);
        let err = SchemaValidator::default().validate(&dataset).unwrap_err();
        assert!(matches!(err, ScoringError::Schema { missing } if missing == vec!["Age", "CIF"]));
    }

    #[test]
    fn test_extra_columns_dropped_and_reordered() {
        let dataset = upload(3, &["Notes", "Channel"], &[]);
        let validated = SchemaValidator::default().validate(&dataset).unwrap();

        let expected: Vec<String> = FeatureContract::transactions()
            .feature_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        assert_eq!(validated.matrix.columns(), expected.as_slice());
        assert_eq!(validated.matrix.row_count(), 3);
        assert!(validated.matrix.raw_rows().iter().all(|row| row.len() == 13));
        assert_eq!(validated.dropped_columns, vec!["Notes", "Channel"]);
        assert!(validated.ground_truth.is_none());
        assert_eq!(validated.matrix.raw_rows()[1][0], "F");
    }

    #[test]
    fn test_ground_truth_split_off() {
        let dataset = upload(4, &[GROUND_TRUTH_COLUMN], &[]);
        let validated = SchemaValidator::default().validate(&dataset).unwrap();

        assert!(!validated
            .matrix
            .columns()
            .iter()
            .any(|c| c == GROUND_TRUTH_COLUMN));
        assert!(validated.dropped_columns.is_empty());
        assert_eq!(
            validated.ground_truth.unwrap().values(),
            &["0", "1", "0", "1"]
        );
    }

    #[test]
    fn test_zero_rows_validate() {
        let dataset = upload(0, &[], &[]);
        let validated = SchemaValidator::default().validate(&dataset).unwrap();
        assert!(validated.matrix.is_empty());
    }

    #[test]
    fn test_revalidation_is_identical() {
        let dataset = upload(5, &["Notes", GROUND_TRUTH_COLUMN], &[]);
        let validator = SchemaValidator::default();
        let first = validator.validate(&dataset).unwrap();
        let second = validator.validate(&dataset).unwrap();
        assert_eq!(first, second);
    }
}
