//! Concrete [`Sink`](crate::dataset::Sink) implementations.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::dataset::{DatasetError, Record, Sink};

/// Appends every pushed record to a file as one JSON document per line.
pub struct JsonLinesSink {
    path: PathBuf,
    file: Mutex<tokio::fs::File>,
}

impl JsonLinesSink {
    /// Opens `path` for appending, creating it when missing.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, DatasetError> {
        let path = path.into();
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| DatasetError::io(&path, e))?;
        Ok(JsonLinesSink {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Sink for JsonLinesSink {
    async fn push(
        &self,
        _cancel: &CancellationToken,
        records: &[Record],
    ) -> Result<(), DatasetError> {
        let mut buf = Vec::new();
        for record in records {
            serde_json::to_writer(&mut buf, record).map_err(|e| DatasetError::Push(Box::new(e)))?;
            buf.push(b'\n');
        }

        let mut file = self.file.lock().await;
        file.write_all(&buf)
            .await
            .map_err(|e| DatasetError::Push(Box::new(e)))?;
        file.flush()
            .await
            .map_err(|e| DatasetError::Push(Box::new(e)))
    }
}

/// Logs the size of every pushed chunk and drops the records.
pub struct LogSink {
    label: String,
}

impl LogSink {
    pub fn new(label: impl Into<String>) -> Self {
        LogSink {
            label: label.into(),
        }
    }
}

#[async_trait]
impl Sink for LogSink {
    async fn push(
        &self,
        _cancel: &CancellationToken,
        records: &[Record],
    ) -> Result<(), DatasetError> {
        tracing::info!(sink = %self.label, records = records.len(), "received chunk");
        Ok(())
    }
}

/// Keeps every pushed chunk in memory, in push order.
#[derive(Default)]
pub struct MemorySink {
    chunks: Mutex<Vec<Vec<Record>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chunks received so far.
    pub async fn chunks(&self) -> Vec<Vec<Record>> {
        self.chunks.lock().await.clone()
    }

    /// All received records, flattened.
    pub async fn records(&self) -> Vec<Record> {
        self.chunks.lock().await.iter().flatten().cloned().collect()
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn push(
        &self,
        _cancel: &CancellationToken,
        records: &[Record],
    ) -> Result<(), DatasetError> {
        self.chunks.lock().await.push(records.to_vec());
        Ok(())
    }
}
