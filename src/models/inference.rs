//! ONNX-backed fraud classifier

use crate::config::ModelConfig;
use crate::contract::FeatureContract;
use crate::models::classifier::Classifier;
use crate::models::loader::{LoadedModel, ModelLoader};
use crate::types::value::FeatureValue;
use anyhow::{Context, Result};
use ort::memory::Allocator;
use ort::value::{DynMapValueType, DynSequenceValueType, DowncastableTarget};
use std::sync::RwLock;
use tracing::{debug, info};

/// Turns coerced rows into the flat `f32` layout the model expects.
///
/// Numeric values pass through. Text values are encoded as their index in
/// the column's fitted vocabulary; a value outside it cannot be scored.
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    columns: Vec<String>,
    vocabularies: Vec<Option<Vec<String>>>,
}

impl FeatureEncoder {
    pub fn new(contract: &FeatureContract, config: &ModelConfig) -> Self {
        let columns: Vec<String> = contract
            .feature_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let vocabularies = columns
            .iter()
            .map(|column| config.categories_for(column).map(<[String]>::to_vec))
            .collect();
        Self {
            columns,
            vocabularies,
        }
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Row-major `[rows, width]` buffer.
    pub fn encode(&self, rows: &[Vec<FeatureValue>]) -> Result<Vec<f32>> {
        let mut buffer = Vec::with_capacity(rows.len() * self.width());
        for (r, row) in rows.iter().enumerate() {
            if row.len() != self.width() {
                anyhow::bail!(
                    "row {} has {} features, model expects {}",
                    r + 1,
                    row.len(),
                    self.width()
                );
            }
            for (c, value) in row.iter().enumerate() {
                buffer.push(self.encode_value(r, c, value)?);
            }
        }
        Ok(buffer)
    }

    fn encode_value(&self, row: usize, column: usize, value: &FeatureValue) -> Result<f32> {
        match value {
            FeatureValue::Numeric(number) => Ok(*number as f32),
            FeatureValue::Text(text) => {
                let name = &self.columns[column];
                let vocabulary = self.vocabularies[column].as_ref().with_context(|| {
                    format!(
                        "row {}: column '{}' expects a number, got '{}'",
                        row + 1,
                        name,
                        text
                    )
                })?;
                vocabulary
                    .iter()
                    .position(|category| category == text)
                    .map(|index| index as f32)
                    .with_context(|| {
                        format!(
                            "row {}: unknown category '{}' for column '{}'",
                            row + 1,
                            text,
                            name
                        )
                    })
            }
        }
    }
}

/// Binary classifier running an exported model through ONNX Runtime.
pub struct OnnxClassifier {
    /// Loaded model (a run needs exclusive access to the session)
    model: RwLock<LoadedModel>,
    name: String,
    encoder: FeatureEncoder,
    /// Fraud probability at or above which a row is labelled fraud
    decision_threshold: f64,
}

impl OnnxClassifier {
    /// Load the model named in configuration.
    pub fn new(config: &ModelConfig, contract: &FeatureContract) -> Result<Self> {
        let loader = ModelLoader::with_threads(config.onnx_threads)?;
        let model = loader.load_model(&config.path)?;
        let name = model.name.clone();

        info!(
            model = %name,
            features = contract.feature_count(),
            decision_threshold = config.decision_threshold,
            "ONNX classifier ready"
        );

        Ok(Self {
            model: RwLock::new(model),
            name,
            encoder: FeatureEncoder::new(contract, config),
            decision_threshold: config.decision_threshold,
        })
    }

    fn labels(&self, probabilities: &[f64]) -> Vec<u8> {
        probabilities
            .iter()
            .map(|&p| u8::from(p >= self.decision_threshold))
            .collect()
    }

    /// Fraud-class probability for each row.
    fn fraud_probabilities(&self, rows: &[Vec<FeatureValue>]) -> Result<Vec<f64>> {
        use ort::value::Tensor;

        let features = self.encoder.encode(rows)?;
        let shape = vec![rows.len() as i64, self.encoder.width() as i64];
        let input_tensor =
            Tensor::from_array((shape, features)).context("Failed to create input tensor")?;

        let mut model = self
            .model
            .write()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        let model = &mut *model;

        let outputs = model
            .session
            .run(ort::inputs![&model.input_name => input_tensor])?;

        let probabilities =
            Self::extract_probabilities(&outputs, &model.output_name, rows.len(), &self.name)?;

        debug!(model = %self.name, rows = rows.len(), "ONNX inference complete");
        Ok(probabilities)
    }

    /// Handles tensor outputs (`[n, classes]`, `[n]`) and `seq(map(int64, float))`
    fn extract_probabilities(
        outputs: &ort::session::SessionOutputs,
        output_name: &str,
        rows: usize,
        model_name: &str,
    ) -> Result<Vec<f64>> {
        let output = outputs
            .get(output_name)
            .with_context(|| format!("model '{}' produced no '{}' output", model_name, output_name))?;

        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            return Self::probabilities_from_tensor(&dims, data, rows);
        }
        if DynSequenceValueType::can_downcast(&output.dtype()) {
            return Self::probabilities_from_sequence_map(output, rows);
        }
        anyhow::bail!(
            "model '{}' output '{}' is neither a float tensor nor a sequence of maps",
            model_name,
            output_name
        )
    }

    /// seq(map(int64, float)), one map per row (sklearn ZipMap exports)
    fn probabilities_from_sequence_map(
        output: &ort::value::DynValue,
        rows: usize,
    ) -> Result<Vec<f64>> {
        let allocator = Allocator::default();

        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;

        let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;
        if maps.len() != rows {
            anyhow::bail!("expected {} probability maps, got {}", rows, maps.len());
        }

        let mut probabilities = Vec::with_capacity(rows);
        for map_value in &maps {
            let kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;
            let fraud = kv_pairs
                .iter()
                .find(|(class_id, _)| *class_id == 1)
                .map(|(_, prob)| *prob as f64)
                .or_else(|| {
                    kv_pairs
                        .iter()
                        .find(|(class_id, _)| *class_id == 0)
                        .map(|(_, prob)| 1.0 - *prob as f64)
                })
                .ok_or_else(|| anyhow::anyhow!("No probability found in map"))?;
            probabilities.push(fraud);
        }
        Ok(probabilities)
    }

    /// `[n, classes]` takes column 1 when there are two or more classes,
    /// otherwise the single column; `[n]` is already the fraud probability.
    fn probabilities_from_tensor(dims: &[i64], data: &[f32], rows: usize) -> Result<Vec<f64>> {
        let classes = match dims {
            [n, classes] if *n as usize == rows && *classes >= 1 => *classes as usize,
            [n] if *n as usize == rows => 1,
            _ => anyhow::bail!("unexpected probability shape {:?} for {} rows", dims, rows),
        };
        if data.len() < rows * classes {
            anyhow::bail!(
                "probability output holds {} values, expected {}",
                data.len(),
                rows * classes
            );
        }

        Ok((0..rows)
            .map(|row| {
                let offset = row * classes;
                if classes >= 2 {
                    data[offset + 1] as f64
                } else {
                    data[offset] as f64
                }
            })
            .collect())
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, rows: &[Vec<FeatureValue>]) -> Result<Vec<u8>> {
        let probabilities = self.fraud_probabilities(rows)?;
        Ok(self.labels(&probabilities))
    }

    fn predict_proba(&self, rows: &[Vec<FeatureValue>]) -> Result<Vec<[f64; 2]>> {
        let probabilities = self.fraud_probabilities(rows)?;
        Ok(class_pairs(&probabilities))
    }

    fn predict_with_proba(&self, rows: &[Vec<FeatureValue>]) -> Result<(Vec<u8>, Vec<[f64; 2]>)> {
        let probabilities = self.fraud_probabilities(rows)?;
        Ok((self.labels(&probabilities), class_pairs(&probabilities)))
    }
}

fn class_pairs(probabilities: &[f64]) -> Vec<[f64; 2]> {
    probabilities.iter().map(|&p| [1.0 - p, p]).collect()
}
