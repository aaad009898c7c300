use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::models::RawRecord;

/// Get the default directory for persisted batches
pub fn default_output_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .context("Could not determine local data directory")?
        .join("post-sentiment")
        .join("batches");

    Ok(data_dir)
}

pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))
}

pub fn batch_filename(now: DateTime<Local>) -> String {
    format!("posts-{}.json", now.format("%Y%m%d-%H%M%S"))
}

/// Load a persisted batch (a JSON array of records)
pub fn load_batch(filepath: &Path) -> Result<Vec<RawRecord>> {
    if !filepath.exists() {
        anyhow::bail!("Batch file not found: {}", filepath.display());
    }

    let content = fs::read_to_string(filepath)
        .with_context(|| format!("Failed to read batch file: {}", filepath.display()))?;

    let values: Vec<serde_json::Value> = serde_json::from_str(&content).with_context(|| {
        format!(
            "Failed to parse batch JSON from {}. The file may be corrupted or not a batch file.",
            filepath.display()
        )
    })?;

    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            RawRecord::from_value(value).with_context(|| {
                format!("Record {} in {} is not a post", index + 1, filepath.display())
            })
        })
        .collect()
}

/// One line per record: 1-based index, a tab, then the record's text.
pub fn render_text_export(records: &[RawRecord]) -> String {
    let mut out = String::new();
    for (index, record) in records.iter().enumerate() {
        let text = record.text().split_whitespace().collect::<Vec<_>>().join(" ");
        out.push_str(&format!("{}\t{}\n", index + 1, text));
    }
    out
}

/// Write the text rendering of a persisted batch, replacing `text_path`.
pub fn export_text(json_path: &Path, text_path: &Path) -> Result<usize> {
    let records = load_batch(json_path)?;
    fs::write(text_path, render_text_export(&records))
        .with_context(|| format!("Failed to write text export: {}", text_path.display()))?;
    Ok(records.len())
}

pub struct BatchFile {
    pub path: PathBuf,
    pub records: usize,
    pub modified: Option<SystemTime>,
}

/// List persisted batches in `dir`, newest first
pub fn list_batch_files(dir: &Path) -> Result<Vec<BatchFile>> {
    let mut files = Vec::new();

    if dir.exists() {
        for entry in fs::read_dir(dir).context("Failed to read output directory")? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                match load_batch(&path) {
                    Ok(records) => {
                        let modified = entry.metadata().and_then(|m| m.modified()).ok();
                        files.push(BatchFile {
                            path,
                            records: records.len(),
                            modified,
                        });
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "skipping unreadable batch");
                    }
                }
            }
        }
    }

    files.sort_by(|a, b| b.modified.cmp(&a.modified));

    Ok(files)
}
