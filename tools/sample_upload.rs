//! Sample Upload Generator
//!
//! Writes a synthetic transaction CSV in the upload format: every contract
//! column, an optional `PotentialFraud` flag and a free-text `Notes` column
//! the scorer is expected to drop.

use anyhow::{Context, Result};
use clap::Parser;
use fraud_scoring::contract::FeatureContract;
use fraud_scoring::sample::TransactionGenerator;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "sample_upload", about = "Generate a synthetic transaction upload")]
struct Args {
    /// Output CSV path
    #[arg(default_value = "sample_upload.csv")]
    output: PathBuf,
    /// Number of transactions
    #[arg(long, default_value_t = 100)]
    count: usize,
    /// Share of suspicious transactions
    #[arg(long, default_value_t = 0.1)]
    fraud_rate: f64,
    /// Include the ground-truth fraud flag
    #[arg(long)]
    with_ground_truth: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sample_upload=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let header = TransactionGenerator::header(&FeatureContract::transactions(), args.with_ground_truth);

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    writer.write_record(&header)?;

    let mut generator = TransactionGenerator::new();
    let mut suspicious_count = 0;

    for i in 0..args.count {
        let suspicious = generator.gen_suspicious(args.fraud_rate);
        if suspicious {
            suspicious_count += 1;
        }
        writer.write_record(generator.generate_record(suspicious, args.with_ground_truth, i))?;
    }
    writer.flush()?;

    info!(
        path = %args.output.display(),
        count = args.count,
        suspicious = suspicious_count,
        "Sample upload written"
    );
    Ok(())
}
