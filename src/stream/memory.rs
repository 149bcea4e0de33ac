use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::Loader;
use crate::dataset::{DatasetError, Record};

/// Loader over records already held in memory.
pub struct MemoryLoader {
    label: String,
    records: Vec<Record>,
}

impl MemoryLoader {
    pub fn new(label: impl Into<String>, records: Vec<Record>) -> Self {
        MemoryLoader {
            label: label.into(),
            records,
        }
    }
}

#[async_trait]
impl Loader for MemoryLoader {
    async fn load(&mut self, cancel: &CancellationToken) -> Result<Vec<Record>, DatasetError> {
        if cancel.is_cancelled() {
            return Err(DatasetError::Cancelled);
        }
        Ok(std::mem::take(&mut self.records))
    }

    fn describe(&self) -> String {
        format!("memory:{}", self.label)
    }
}
