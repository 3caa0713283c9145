//! Configuration management for the scoring service

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// How the non-fraud percentage is rounded
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoundingPolicy {
    /// `round(100 - fraud_ratio, 2)`, the complement of the rounded fraud ratio
    #[default]
    Asymmetric,
    /// `round(non_fraud / total * 100, 2)`, each ratio rounded on its own
    Symmetric,
}

/// Where concurrent requests put their artifact
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactIsolation {
    /// One fixed path shared by every request; the last writer wins
    #[default]
    Shared,
    /// File name suffixed with the request's run id
    PerRequest,
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub model: ModelConfig,
    #[serde(default)]
    pub artifacts: ArtifactConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
    #[serde(default)]
    pub statistics: StatisticsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Classifier configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Path to the exported ONNX model
    pub path: PathBuf,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
    /// Fraud probability at or above which a row is labelled fraud
    #[serde(default = "default_decision_threshold")]
    pub decision_threshold: f64,
    /// Fitted category vocabularies, per contract column; a text value is
    /// encoded as its position in the list
    #[serde(default)]
    pub categories: HashMap<String, Vec<String>>,
}

impl ModelConfig {
    /// Vocabulary for a column. Keys are matched case-insensitively since
    /// some configuration sources normalise key case.
    pub fn categories_for(&self, column: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, values)| values.as_slice())
    }
}

fn default_onnx_threads() -> usize {
    1
}

fn default_decision_threshold() -> f64 {
    0.5
}

/// Result artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactConfig {
    /// Public directory the artifact is served from
    pub dir: PathBuf,
    /// Artifact file name
    pub file_name: String,
    #[serde(default)]
    pub isolation: ArtifactIsolation,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("static"),
            file_name: "predictions_result.csv".to_string(),
            isolation: ArtifactIsolation::Shared,
        }
    }
}

/// Preview configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewConfig {
    /// Rows shown in each preview table
    pub rows: usize,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self { rows: 10 }
    }
}

/// Batch statistics configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatisticsConfig {
    #[serde(default)]
    pub rounding: RoundingPolicy,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.model.decision_threshold) {
            anyhow::bail!(
                "model.decision_threshold must be within [0, 1], got {}",
                self.model.decision_threshold
            );
        }
        if self.model.onnx_threads == 0 {
            anyhow::bail!("model.onnx_threads must be at least 1");
        }
        if self.artifacts.file_name.trim().is_empty() {
            anyhow::bail!("artifacts.file_name must not be empty");
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig {
                path: PathBuf::from("models/fraud_classifier.onnx"),
                onnx_threads: default_onnx_threads(),
                decision_threshold: default_decision_threshold(),
                categories: HashMap::new(),
            },
            artifacts: ArtifactConfig::default(),
            preview: PreviewConfig::default(),
            statistics: StatisticsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
