//! Record contracts and the pull → transform → push orchestrator.

pub mod config;
pub mod dataset;
pub mod sinks;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub use config::{ProcConfig, ProcConfigBuilder};
pub use dataset::Dataset;
pub use sinks::Sinks;
pub use types::{BoxError, DatasetError};

/// One unit of data: an open mapping from string keys to JSON values.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Produces batches of records.
///
/// Must return [`DatasetError::Exhausted`] exactly when no more records
/// are available. Any other error is fatal to the run.
#[async_trait]
pub trait Source: Send + Sync {
    async fn pull(
        &self,
        cancel: &CancellationToken,
        batch: usize,
    ) -> Result<Vec<Record>, DatasetError>;
}

/// Converts a batch of records. Output length need not match input length.
#[async_trait]
pub trait Transformer: Send + Sync {
    async fn transform(
        &self,
        cancel: &CancellationToken,
        records: Vec<Record>,
    ) -> Result<Vec<Record>, DatasetError>;
}

/// Accepts batches of transformed records.
#[async_trait]
pub trait Sink: Send + Sync {
    async fn push(&self, cancel: &CancellationToken, records: &[Record])
        -> Result<(), DatasetError>;
}

#[async_trait]
impl<S: Source + ?Sized> Source for Arc<S> {
    async fn pull(
        &self,
        cancel: &CancellationToken,
        batch: usize,
    ) -> Result<Vec<Record>, DatasetError> {
        (**self).pull(cancel, batch).await
    }
}

#[async_trait]
impl<T: Transformer + ?Sized> Transformer for Arc<T> {
    async fn transform(
        &self,
        cancel: &CancellationToken,
        records: Vec<Record>,
    ) -> Result<Vec<Record>, DatasetError> {
        (**self).transform(cancel, records).await
    }
}

#[async_trait]
impl<S: Sink + ?Sized> Sink for Arc<S> {
    async fn push(
        &self,
        cancel: &CancellationToken,
        records: &[Record],
    ) -> Result<(), DatasetError> {
        (**self).push(cancel, records).await
    }
}

#[cfg(test)]
mod tests;
