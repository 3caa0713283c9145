//! Opening the exported fraud classifier

use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use tracing::info;

/// Session for the fraud classifier and the names to feed and read.
pub struct LoadedModel {
    /// File stem, used in logs
    pub name: String,
    pub session: Session,
    /// The single float feature input
    pub input_name: String,
    /// Class probability output
    pub output_name: String,
}

/// Opens classifier exports with a fixed thread budget.
pub struct ModelLoader {
    onnx_threads: usize,
}

impl ModelLoader {
    pub fn with_threads(onnx_threads: usize) -> Result<Self> {
        ort::init().commit()?;
        info!(onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Open `path` and resolve its feature input and probability output.
    ///
    /// The export must take exactly one input. Its probability output is the
    /// one whose name mentions "prob" (`probabilities`, `output_probability`),
    /// or the only output if there is just one.
    pub fn load_model<P: AsRef<Path>>(&self, path: P) -> Result<LoadedModel> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Model file not found: {}", path.display());
        }

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "classifier".to_string());

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        let input_names: Vec<&str> = session.inputs.iter().map(|i| i.name.as_str()).collect();
        let output_names: Vec<&str> = session.outputs.iter().map(|o| o.name.as_str()).collect();
        let (input_name, output_name) = resolve_io(&input_names, &output_names)
            .with_context(|| format!("Unsupported model signature in {}", path.display()))?;

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            threads = self.onnx_threads,
            "Model loaded"
        );

        Ok(LoadedModel {
            name,
            session,
            input_name,
            output_name,
        })
    }
}

fn resolve_io(inputs: &[&str], outputs: &[&str]) -> Result<(String, String)> {
    let input = match inputs {
        [input] => input.to_string(),
        _ => anyhow::bail!("expected one feature input, found {:?}", inputs),
    };
    let output = match outputs.iter().find(|name| name.contains("prob")) {
        Some(name) => name.to_string(),
        None => match outputs {
            [only] => only.to_string(),
            _ => anyhow::bail!("no probability output among {:?}", outputs),
        },
    };
    Ok((input, output))
}
