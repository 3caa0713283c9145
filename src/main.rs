//! Fraud Scoring - Command Line Entry Point
//!
//! Scores a transaction upload (or one record given as KEY=VALUE pairs) with
//! the configured ONNX classifier and prints the resulting message, artifact
//! link and previews.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fraud_scoring::{
    config::{AppConfig, LoggingConfig},
    contract::FeatureContract,
    models::inference::OnnxClassifier,
    pipeline::BatchScorer,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "fraud-scoring", version, about = "Score transactions for fraud")]
struct Cli {
    /// Configuration file
    #[arg(long, short, default_value = "config/config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score every row of a CSV upload
    Score {
        /// Uploaded transaction file
        file: PathBuf,
        /// Print the whole response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Score a single record given as KEY=VALUE fields
    Record {
        #[arg(value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
}

fn parse_field(arg: &str) -> Result<(String, String), String> {
    arg.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", arg))
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().or_else(|_| {
        tracing_subscriber::EnvFilter::try_new(format!("fraud_scoring={}", logging.level))
    })?;

    if logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from_path(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    init_logging(&config.logging)?;
    info!(config = %cli.config.display(), "Configuration loaded successfully");

    let contract = FeatureContract::transactions();
    let classifier = Arc::new(OnnxClassifier::new(&config.model, &contract)?);
    let scorer = BatchScorer::new(contract, classifier, &config);

    let succeeded = match cli.command {
        Command::Score { file, json } => {
            let upload = if file.exists() {
                let bytes = std::fs::read(&file)
                    .with_context(|| format!("Failed to read {}", file.display()))?;
                Some(bytes)
            } else {
                warn!(path = %file.display(), "Upload not found");
                None
            };

            let response = scorer.respond(upload.as_deref());
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!("{}", response.message);
                if let Some(link) = &response.download_link {
                    println!("Download: {}", link);
                }
                if let Some(preview) = &response.preview {
                    println!("\nPredicted (first rows):\n{}", preview);
                }
                if let Some(original) = &response.original_preview {
                    println!("Original (first rows):\n{}", original);
                }
            }
            response.download_link.is_some()
        }
        Command::Record { fields } => {
            let form: HashMap<String, String> = fields.into_iter().collect();
            match scorer.score_record(&form) {
                Ok(score) => {
                    println!("{}", score.message());
                    true
                }
                Err(e) => {
                    scorer.metrics().record_failure(e.kind());
                    error!(kind = e.kind(), error = ?e, "Record scoring failed");
                    println!("{}", e.user_message());
                    false
                }
            }
        }
    };

    scorer.metrics().print_summary();

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}
