//! Batch-sized readers over finite, lazily loaded record collections.
//!
//! A [`RecordStream`] wraps one collection (one JSON file, one in-memory
//! vector) and loads it on the first pull. [`MultiStream`] chains an
//! ordered queue of them into one continuous source.

pub mod json;
pub mod memory;
pub mod multi;

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::dataset::{DatasetError, Record, Source};

pub use json::{json_dir_stream, json_file_stream, JsonFile};
pub use memory::MemoryLoader;
pub use multi::MultiStream;

/// Loads the full content of one finite record collection.
///
/// Called at most once per [`RecordStream`], and only when the load
/// succeeded; a failed or cancelled load is attempted again on the next
/// pull.
#[async_trait]
pub trait Loader: Send + Sync {
    async fn load(&mut self, cancel: &CancellationToken) -> Result<Vec<Record>, DatasetError>;

    /// Human readable origin used in log events.
    fn describe(&self) -> String;
}

/// One lazily loaded collection served in batch-sized reads.
///
/// Once the buffer drains the stream is exhausted for good: every later
/// pull returns [`DatasetError::Exhausted`].
pub struct RecordStream<L> {
    loader: L,
    loaded: bool,
    buffer: VecDeque<Record>,
}

impl<L: Loader> RecordStream<L> {
    pub fn new(loader: L) -> Self {
        RecordStream {
            loader,
            loaded: false,
            buffer: VecDeque::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Records still buffered. Zero before the first pull.
    pub fn remaining(&self) -> usize {
        self.buffer.len()
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Returns up to `batch` records, loading the collection first if
    /// needed.
    ///
    /// A load failure is returned as is, never as exhaustion. A `batch` of
    /// zero means nothing more is wanted and yields exhaustion.
    pub async fn pull(
        &mut self,
        cancel: &CancellationToken,
        batch: usize,
    ) -> Result<Vec<Record>, DatasetError> {
        if !self.loaded {
            let records = self.loader.load(cancel).await?;
            tracing::debug!(
                source = %self.loader.describe(),
                records = records.len(),
                "loaded records"
            );
            self.buffer = records.into();
            self.loaded = true;
        }

        if batch == 0 || self.buffer.is_empty() {
            return Err(DatasetError::Exhausted);
        }

        if batch >= self.buffer.len() {
            return Ok(std::mem::take(&mut self.buffer).into());
        }

        Ok(self.buffer.drain(..batch).collect())
    }
}

/// A single [`RecordStream`] usable as a shared [`Source`].
pub struct SingleStream<L> {
    inner: Mutex<RecordStream<L>>,
}

impl<L: Loader> SingleStream<L> {
    pub fn new(loader: L) -> Self {
        SingleStream {
            inner: Mutex::new(RecordStream::new(loader)),
        }
    }
}

#[async_trait]
impl<L: Loader> Source for SingleStream<L> {
    async fn pull(
        &self,
        cancel: &CancellationToken,
        batch: usize,
    ) -> Result<Vec<Record>, DatasetError> {
        let mut stream = self.inner.lock().await;
        stream.pull(cancel, batch).await
    }
}
