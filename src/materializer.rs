//! Result artifact and preview tables for a scored batch

use crate::config::{AppConfig, ArtifactIsolation};
use crate::contract::PREDICTION_COLUMN;
use crate::error::ScoringError;
use crate::models::classifier::Predictions;
use crate::types::dataset::{Dataset, FeatureMatrix};
use std::fmt::{self, Write as _};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use uuid::Uuid;

/// Inline style applied to every cell of a predicted-fraud row.
pub const FRAUD_ROW_STYLE: &str =
    "background-color: rgba(255, 77, 77, 0.4); color: white; font-weight: bold;";

/// Mode of the written artifact; the directory is served to other users.
#[cfg(unix)]
pub const ARTIFACT_MODE: u32 = 0o644;

/// CSS classes of the original-upload preview table.
pub const ORIGINAL_TABLE_CLASSES: &str = "table table-striped";

/// Writes the annotated dataset and renders the bounded previews.
#[derive(Debug, Clone)]
pub struct ResultMaterializer {
    dir: PathBuf,
    file_name: String,
    isolation: ArtifactIsolation,
    preview_rows: usize,
}

impl ResultMaterializer {
    pub fn new(dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            file_name: file_name.into(),
            isolation: ArtifactIsolation::Shared,
            preview_rows: 10,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.artifacts.dir, config.artifacts.file_name.clone())
            .with_isolation(config.artifacts.isolation)
            .with_preview_rows(config.preview.rows)
    }

    pub fn with_isolation(mut self, isolation: ArtifactIsolation) -> Self {
        self.isolation = isolation;
        self
    }

    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }

    /// Contract columns plus the predicted label, one row per prediction.
    pub fn merge(matrix: &FeatureMatrix, predictions: &Predictions) -> Dataset {
        let mut headers = matrix.columns().to_vec();
        headers.push(PREDICTION_COLUMN.to_string());

        let rows = matrix
            .raw_rows()
            .iter()
            .zip(predictions.labels())
            .map(|(row, label)| {
                let mut row = row.clone();
                row.push(label.to_string());
                row
            })
            .collect();

        Dataset::from_parts(headers, rows)
    }

    /// Where this request's artifact goes.
    ///
    /// With shared isolation every request gets the same path.
    pub fn artifact_path(&self, run_id: Uuid) -> PathBuf {
        match self.isolation {
            ArtifactIsolation::Shared => self.dir.join(&self.file_name),
            ArtifactIsolation::PerRequest => {
                let file = Path::new(&self.file_name);
                let stem = file
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| self.file_name.clone());
                let name = match file.extension() {
                    Some(ext) => format!("{}-{}.{}", stem, run_id, ext.to_string_lossy()),
                    None => format!("{}-{}", stem, run_id),
                };
                self.dir.join(name)
            }
        }
    }

    /// Write the merged dataset as CSV.
    ///
    /// Rows go to a temporary file in the artifact directory that is renamed
    /// over the target, so readers never see a half-written artifact.
    pub fn persist(&self, merged: &Dataset, run_id: Uuid) -> Result<PathBuf, ScoringError> {
        let path = self.artifact_path(run_id);

        fs::create_dir_all(&self.dir).map_err(|e| persistence_error(&path, e))?;
        let mut file =
            NamedTempFile::new_in(&self.dir).map_err(|e| persistence_error(&path, e))?;
        {
            let mut writer = csv::Writer::from_writer(file.as_file_mut());
            writer
                .write_record(merged.headers())
                .map_err(|e| persistence_error(&path, e))?;
            for row in merged.rows() {
                writer
                    .write_record(row)
                    .map_err(|e| persistence_error(&path, e))?;
            }
            writer.flush().map_err(|e| persistence_error(&path, e))?;
        }
        file.as_file_mut()
            .sync_all()
            .map_err(|e| persistence_error(&path, e))?;
        publish_permissions(&file).map_err(|e| persistence_error(&path, e))?;
        file.persist(&path)
            .map_err(|e| persistence_error(&path, e.error))?;

        info!(
            path = %path.display(),
            rows = merged.row_count(),
            columns = merged.headers().len(),
            "Result artifact written"
        );
        Ok(path)
    }

    /// First rows of the predicted data, fraud rows highlighted.
    pub fn predicted_preview(&self, merged: &Dataset) -> String {
        let head = merged.head(self.preview_rows);
        let label_index = head.column_index(PREDICTION_COLUMN);
        render_table(&head, "dataframe", |row| {
            label_index.is_some_and(|i| row[i] == "1")
        })
    }

    /// First rows of the upload exactly as received.
    pub fn original_preview(&self, original: &Dataset) -> String {
        let head = original.head(self.preview_rows);
        debug!(rows = head.row_count(), "Rendering original preview");
        render_table(&head, ORIGINAL_TABLE_CLASSES, |_| false)
    }
}

/// Temporary files are created owner-only; the artifact must not be.
#[cfg(unix)]
fn publish_permissions(file: &NamedTempFile) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.as_file()
        .set_permissions(fs::Permissions::from_mode(ARTIFACT_MODE))
}

#[cfg(not(unix))]
fn publish_permissions(_file: &NamedTempFile) -> std::io::Result<()> {
    Ok(())
}

fn persistence_error(path: &Path, err: impl fmt::Display) -> ScoringError {
    ScoringError::Persistence(format!("{}: {}", path.display(), err))
}

fn render_table(dataset: &Dataset, classes: &str, highlight: impl Fn(&[String]) -> bool) -> String {
    let mut html = String::new();
    let _ = writeln!(html, "<table class=\"{}\">", escape_html(classes));
    html.push_str("  <thead>\n    <tr>");
    for header in dataset.headers() {
        let _ = write!(html, "<th>{}</th>", escape_html(header));
    }
    html.push_str("</tr>\n  </thead>\n  <tbody>\n");
    for row in dataset.rows() {
        html.push_str("    <tr>");
        let style = if highlight(row) {
            format!(" style=\"{}\"", FRAUD_ROW_STYLE)
        } else {
            String::new()
        };
        for cell in row {
            let _ = write!(html, "<td{}>{}</td>", style, escape_html(cell));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("  </tbody>\n</table>\n");
    html
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
