//! Feature contract for the transaction fraud classifier.
//!
//! The classifier was fitted on a fixed, ordered set of columns. Every batch
//! and every single record is restricted and reordered to this contract
//! before it reaches the model.

/// Semantic type the classifier expects for a feature column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    /// Continuous or integer-coded numeric value
    Numeric,
    /// Categorical value, usually an ID or code that may arrive as text
    Categorical,
}

/// Reserved column carrying a pre-existing fraud determination.
pub const GROUND_TRUTH_COLUMN: &str = "PotentialFraud";

/// Column appended to the result artifact with the predicted label.
pub const PREDICTION_COLUMN: &str = "PredictedFraud";

const FEATURES: [(&str, FeatureKind); 13] = [
    ("Gender", FeatureKind::Categorical),
    ("Age", FeatureKind::Numeric),
    ("HouseTypeID", FeatureKind::Categorical),
    ("ContactAvaliabilityID", FeatureKind::Categorical),
    ("HomeCountry", FeatureKind::Categorical),
    ("AccountNo", FeatureKind::Categorical),
    ("CardExpiryDate", FeatureKind::Categorical),
    ("TransactionAmount", FeatureKind::Numeric),
    ("TransactionCountry", FeatureKind::Categorical),
    ("LargePurchase", FeatureKind::Categorical),
    ("ProductID", FeatureKind::Categorical),
    ("CIF", FeatureKind::Categorical),
    ("TransactionCurrencyCode", FeatureKind::Categorical),
];

/// Immutable, ordered list of the features the classifier was trained on.
///
/// Order matches training order; the classifier adapter relies on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureContract {
    features: Vec<(&'static str, FeatureKind)>,
}

impl FeatureContract {
    /// The transaction contract the shipped model was fitted on.
    pub fn transactions() -> Self {
        Self {
            features: FEATURES.to_vec(),
        }
    }

    /// Number of features in the contract.
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Feature names in training order.
    pub fn feature_names(&self) -> Vec<&'static str> {
        self.features.iter().map(|(name, _)| *name).collect()
    }

    /// Expected kind of a feature, if the name belongs to the contract.
    pub fn kind_of(&self, name: &str) -> Option<FeatureKind> {
        self.features
            .iter()
            .find(|(feature, _)| *feature == name)
            .map(|(_, kind)| *kind)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.kind_of(name).is_some()
    }
}

impl Default for FeatureContract {
    fn default() -> Self {
        Self::transactions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_count() {
        let contract = FeatureContract::transactions();
        assert_eq!(contract.feature_count(), 13);
        assert_eq!(contract.feature_names().len(), 13);
    }

    #[test]
    fn test_training_order() {
        let names = FeatureContract::transactions().feature_names();
        assert_eq!(names[0], "Gender");
        assert_eq!(names[6], "CardExpiryDate");
        assert_eq!(names[12], "TransactionCurrencyCode");
        assert!(names.iter().all(|name| !name.is_empty()));
    }

    #[test]
    fn test_reserved_columns_outside_contract() {
        let contract = FeatureContract::transactions();
        assert!(!contract.contains(GROUND_TRUTH_COLUMN));
        assert!(!contract.contains(PREDICTION_COLUMN));
        assert_eq!(contract.kind_of("Age"), Some(FeatureKind::Numeric));
        assert_eq!(contract.kind_of("CIF"), Some(FeatureKind::Categorical));
    }
}
