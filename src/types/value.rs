//! Typed feature values

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single feature value after best-effort coercion.
///
/// Each raw field is first tried as a number and otherwise kept as text.
/// Categorical IDs therefore arrive as `Numeric` when they look numeric,
/// and free text stays `Text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Numeric(f64),
    Text(String),
}

impl FeatureValue {
    /// Coerce a raw field: numeric if it parses as a float, text otherwise.
    ///
    /// Surrounding whitespace is ignored for the numeric attempt only; the
    /// text fallback keeps the field untouched.
    pub fn coerce(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(number) if !raw.trim().is_empty() => FeatureValue::Numeric(number),
            _ => FeatureValue::Text(raw.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Numeric(number) => Some(*number),
            FeatureValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FeatureValue::Numeric(_) => None,
            FeatureValue::Text(text) => Some(text),
        }
    }

    /// True for a text value that is empty (an empty cell).
    pub fn is_empty(&self) -> bool {
        matches!(self, FeatureValue::Text(text) if text.is_empty())
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Numeric(number) => write!(f, "{}", number),
            FeatureValue::Text(text) => f.write_str(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(FeatureValue::coerce("42"), FeatureValue::Numeric(42.0));
        assert_eq!(FeatureValue::coerce(" 12.5 "), FeatureValue::Numeric(12.5));
        assert_eq!(FeatureValue::coerce("-3e2"), FeatureValue::Numeric(-300.0));
    }

    #[test]
    fn test_text_fallback() {
        assert_eq!(
            FeatureValue::coerce("M"),
            FeatureValue::Text("M".to_string())
        );
        assert_eq!(
            FeatureValue::coerce("2024-11"),
            FeatureValue::Text("2024-11".to_string())
        );
        assert!(FeatureValue::coerce("").is_empty());
        assert!(FeatureValue::coerce("   ").as_f64().is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(FeatureValue::Numeric(25.0).to_string(), "25");
        assert_eq!(FeatureValue::Text("EUR".to_string()).to_string(), "EUR");
    }
}
