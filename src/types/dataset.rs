//! Tabular data as it moves through a batch request

use crate::types::value::FeatureValue;

/// A parsed upload: header plus rows of raw cell text.
///
/// Rows are kept exactly as uploaded; every row has one cell per header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Build a dataset from already-split cells.
    ///
    /// Returns `None` when a row's width differs from the header's.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Option<Self> {
        if rows.iter().any(|row| row.len() != headers.len()) {
            return None;
        }
        Some(Self { headers, rows })
    }

    /// Rows built inside the crate whose width is already known to match.
    pub(crate) fn from_parts(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        debug_assert!(rows.iter().all(|row| row.len() == headers.len()));
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Position of a column in the header, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// All cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[index].as_str()).collect())
    }

    /// First `n` rows, same header.
    pub fn head(&self, n: usize) -> Dataset {
        Dataset {
            headers: self.headers.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}

/// Rows restricted to exactly the feature contract, in contract order.
///
/// Only the schema validator builds one, so holding a `FeatureMatrix` means
/// the column set has already been checked.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    raw: Vec<Vec<String>>,
    values: Vec<Vec<FeatureValue>>,
}

impl FeatureMatrix {
    pub(crate) fn from_validated(columns: Vec<String>, raw: Vec<Vec<String>>) -> Self {
        let values = raw
            .iter()
            .map(|row| row.iter().map(|cell| FeatureValue::coerce(cell)).collect())
            .collect();
        Self {
            columns,
            raw,
            values,
        }
    }

    /// Contract column names, in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Cells exactly as uploaded, in contract order.
    pub fn raw_rows(&self) -> &[Vec<String>] {
        &self.raw
    }

    /// Coerced cells, in contract order.
    pub fn rows(&self) -> &[Vec<FeatureValue>] {
        &self.values
    }

    pub fn row_count(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Ground-truth labels split off the upload before scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundTruth {
    values: Vec<String>,
}

impl GroundTruth {
    pub(crate) fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::new(
            vec!["a".to_string(), "b".to_string()],
            vec![
                vec!["1".to_string(), "x".to_string()],
                vec!["2".to_string(), "y".to_string()],
                vec!["3".to_string(), "z".to_string()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let dataset = Dataset::new(
            vec!["a".to_string(), "b".to_string()],
            vec![vec!["1".to_string()]],
        );
        assert!(dataset.is_none());
    }

    #[test]
    fn test_column_access() {
        let dataset = sample();
        assert_eq!(dataset.column_index("b"), Some(1));
        assert_eq!(dataset.column("b").unwrap(), vec!["x", "y", "z"]);
        assert!(dataset.column("c").is_none());
    }

    #[test]
    fn test_head() {
        let dataset = sample();
        assert_eq!(dataset.head(2).row_count(), 2);
        assert_eq!(dataset.head(10).row_count(), 3);
        assert_eq!(dataset.head(0).headers(), dataset.headers());
    }

    #[test]
    fn test_matrix_coerces_once() {
        let matrix = FeatureMatrix::from_validated(
            vec!["Age".to_string(), "Gender".to_string()],
            vec![vec!["31".to_string(), "F".to_string()]],
        );
        assert_eq!(matrix.rows()[0][0], FeatureValue::Numeric(31.0));
        assert_eq!(matrix.rows()[0][1], FeatureValue::Text("F".to_string()));
        assert_eq!(matrix.raw_rows()[0][0], "31");
    }
}
