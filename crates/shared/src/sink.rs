use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SinkWriteError;
use crate::models::CollectedBatch;

/// Destination for a full batch. Called once per collection run.
pub trait BatchSink {
    fn persist(&mut self, batch: CollectedBatch) -> Result<(), SinkWriteError>;
}

/// Writes the batch as one JSON array, replacing any existing file.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BatchSink for JsonFileSink {
    fn persist(&mut self, batch: CollectedBatch) -> Result<(), SinkWriteError> {
        let json = serde_json::to_string_pretty(&batch).map_err(|source| {
            SinkWriteError::Serialize {
                path: self.path.clone(),
                source,
            }
        })?;

        fs::write(&self.path, json).map_err(|source| SinkWriteError::Io {
            path: self.path.clone(),
            source,
        })?;

        tracing::info!(path = %self.path.display(), records = batch.len(), "batch persisted");
        Ok(())
    }
}

/// Keeps persisted batches in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    batches: Vec<CollectedBatch>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> &[CollectedBatch] {
        &self.batches
    }
}

impl BatchSink for MemorySink {
    fn persist(&mut self, batch: CollectedBatch) -> Result<(), SinkWriteError> {
        self.batches.push(batch);
        Ok(())
    }
}
