use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{DatasetError, Record, Sink};

/// Ordered list of sinks that receives every batch.
///
/// Sinks are pushed to strictly in list order and the first failure stops
/// delivery of that batch: later sinks never see it.
#[derive(Clone, Default)]
pub struct Sinks {
    sinks: Vec<Arc<dyn Sink>>,
}

impl Sinks {
    pub fn new() -> Self {
        Sinks { sinks: Vec::new() }
    }

    pub fn add(&mut self, sink: Arc<dyn Sink>) {
        self.sinks.push(sink);
    }

    pub fn with(mut self, sink: Arc<dyn Sink>) -> Self {
        self.add(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl From<Vec<Arc<dyn Sink>>> for Sinks {
    fn from(sinks: Vec<Arc<dyn Sink>>) -> Self {
        Sinks { sinks }
    }
}

#[async_trait]
impl Sink for Sinks {
    async fn push(
        &self,
        cancel: &CancellationToken,
        records: &[Record],
    ) -> Result<(), DatasetError> {
        for (index, sink) in self.sinks.iter().enumerate() {
            if let Err(err) = sink.push(cancel, records).await {
                tracing::debug!(sink = index, error = %err, "sink rejected batch");
                return Err(err);
            }
        }
        Ok(())
    }
}
