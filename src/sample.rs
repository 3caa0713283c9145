//! Synthetic transaction uploads
//!
//! Rows are shaped the way the shipped model expects them: categorical
//! text only from the configured vocabularies, everything else numeric
//! (card expiry as `YYYYMM`).

use crate::contract::{FeatureContract, GROUND_TRUTH_COLUMN};
use rand::rngs::ThreadRng;
use rand::Rng;

const HOME_COUNTRIES: &[&str] = &["FR", "DE", "GB", "ES", "IT"];
const RISKY_COUNTRIES: &[&str] = &["NG", "RU", "BR", "US"];
const CURRENCY_CODES: &[&str] = &["978", "840", "826"];

/// Column used for free text the scorer is expected to drop.
pub const NOTES_COLUMN: &str = "Notes";

/// Transaction generator for testing
pub struct TransactionGenerator {
    rng: ThreadRng,
    account_counter: u64,
}

impl Default for TransactionGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionGenerator {
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            account_counter: 0,
        }
    }

    /// Header of a generated upload.
    pub fn header(contract: &FeatureContract, with_ground_truth: bool) -> Vec<String> {
        let mut header: Vec<String> = contract
            .feature_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        if with_ground_truth {
            header.push(GROUND_TRUTH_COLUMN.to_string());
        }
        header.push(NOTES_COLUMN.to_string());
        header
    }

    /// Contract fields only, in contract order
    pub fn generate(&mut self, suspicious: bool) -> Vec<String> {
        self.account_counter += 1;
        let home = self.random_choice(HOME_COUNTRIES);
        let (amount, country, large) = if suspicious {
            (
                self.rng.gen_range(2000.0..15000.0),
                self.random_choice(RISKY_COUNTRIES),
                "1",
            )
        } else {
            (self.rng.gen_range(5.0..400.0), home, "0")
        };

        vec![
            self.random_choice(&["M", "F"]).to_string(),
            self.rng.gen_range(18..85).to_string(),
            self.rng.gen_range(1..5).to_string(),
            self.rng.gen_range(1..4).to_string(),
            home.to_string(),
            format!("{}", 100_000 + self.account_counter),
            format!(
                "{}{:02}",
                self.rng.gen_range(2026..2031),
                self.rng.gen_range(1..13)
            ),
            format!("{:.2}", amount),
            country.to_string(),
            large.to_string(),
            self.rng.gen_range(1..60).to_string(),
            self.rng.gen_range(5000..9000).to_string(),
            self.random_choice(CURRENCY_CODES).to_string(),
        ]
    }

    /// A full upload row matching [`TransactionGenerator::header`].
    pub fn generate_record(
        &mut self,
        suspicious: bool,
        with_ground_truth: bool,
        index: usize,
    ) -> Vec<String> {
        let mut record = self.generate(suspicious);
        if with_ground_truth {
            record.push(u8::from(suspicious).to_string());
        }
        record.push(format!("generated row {}", index + 1));
        record
    }

    pub fn gen_suspicious(&mut self, fraud_rate: f64) -> bool {
        self.rng.gen_bool(fraud_rate.clamp(0.0, 1.0))
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::models::inference::FeatureEncoder;
    use crate::types::value::FeatureValue;
    use std::path::Path;

    fn shipped_config() -> AppConfig {
        AppConfig::load_from_path(Path::new(env!("CARGO_MANIFEST_DIR")).join("config/config.toml"))
            .unwrap()
    }

    #[test]
    fn test_generated_rows_encode_with_shipped_config() {
        let contract = FeatureContract::transactions();
        let encoder = FeatureEncoder::new(&contract, &shipped_config().model);
        let mut generator = TransactionGenerator::new();

        let rows: Vec<Vec<FeatureValue>> = (0..200)
            .map(|i| {
                generator
                    .generate(i % 2 == 0)
                    .iter()
                    .map(|field| FeatureValue::coerce(field))
                    .collect()
            })
            .collect();

        let encoded = encoder.encode(&rows).unwrap();
        assert_eq!(encoded.len(), 200 * contract.feature_count());
    }

    #[test]
    fn test_card_expiry_is_numeric() {
        let mut generator = TransactionGenerator::new();
        let row = generator.generate(false);
        let index = FeatureContract::transactions()
            .feature_names()
            .iter()
            .position(|&name| name == "CardExpiryDate")
            .unwrap();
        assert!(FeatureValue::coerce(&row[index]).as_f64().is_some());
    }

    #[test]
    fn test_record_matches_header() {
        let contract = FeatureContract::transactions();
        let mut generator = TransactionGenerator::new();
        for with_ground_truth in [false, true] {
            let header = TransactionGenerator::header(&contract, with_ground_truth);
            let record = generator.generate_record(true, with_ground_truth, 0);
            assert_eq!(header.len(), record.len());
            assert_eq!(header.last().map(String::as_str), Some(NOTES_COLUMN));
        }
    }
}
