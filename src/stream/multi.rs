use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{Loader, RecordStream};
use crate::dataset::{DatasetError, Record, Source};

/// Chains an ordered queue of [`RecordStream`]s into one source.
///
/// Records come out in queue order and, within a stream, in load order.
/// A pull is served by one stream only: when the current stream runs out
/// mid-request the short batch is returned as is and the next pull moves
/// on. Streams that load empty are skipped without reporting exhaustion
/// while later streams remain.
///
/// The cursor is guarded by a single lock held for the whole pull. A pull
/// that fails or is cancelled while loading the next stream leaves both the
/// drained stream and the queue as they were, so a retry resumes from the
/// same place.
pub struct MultiStream<L> {
    cursor: Mutex<Cursor<L>>,
}

struct Cursor<L> {
    queue: VecDeque<RecordStream<L>>,
    current: Option<RecordStream<L>>,
}

enum Step {
    Draining,
    Advancing,
    Exhausted,
}

impl<L: Loader> MultiStream<L> {
    pub fn new(streams: impl IntoIterator<Item = RecordStream<L>>) -> Self {
        MultiStream {
            cursor: Mutex::new(Cursor {
                queue: streams.into_iter().collect(),
                current: None,
            }),
        }
    }

    pub fn from_loaders(loaders: impl IntoIterator<Item = L>) -> Self {
        Self::new(loaders.into_iter().map(RecordStream::new))
    }

    /// Number of streams not yet discarded, the current one included.
    pub async fn total(&self) -> usize {
        let cursor = self.cursor.lock().await;
        cursor.queue.len() + usize::from(cursor.current.is_some())
    }
}

#[async_trait]
impl<L: Loader> Source for MultiStream<L> {
    async fn pull(
        &self,
        cancel: &CancellationToken,
        batch: usize,
    ) -> Result<Vec<Record>, DatasetError> {
        if batch == 0 {
            return Err(DatasetError::Exhausted);
        }
        if cancel.is_cancelled() {
            return Err(DatasetError::Cancelled);
        }

        let mut cursor = self.cursor.lock().await;
        let mut step = if cursor.current.is_some() {
            Step::Draining
        } else {
            Step::Advancing
        };

        loop {
            step = match step {
                Step::Draining => {
                    let Some(current) = cursor.current.as_mut() else {
                        step = Step::Advancing;
                        continue;
                    };
                    let result = current.pull(cancel, batch).await;
                    match result {
                        Err(DatasetError::Exhausted) if cursor.queue.is_empty() => {
                            if let Some(done) = cursor.current.take() {
                                debug!(source = %done.loader().describe(), "source drained");
                            }
                            Step::Exhausted
                        }
                        Err(DatasetError::Exhausted) => Step::Advancing,
                        other => return other,
                    }
                }
                Step::Advancing => {
                    let Some(head) = cursor.queue.front_mut() else {
                        cursor.current = None;
                        step = Step::Exhausted;
                        continue;
                    };
                    // The drained stream and the head both stay put until the
                    // head yields, so a failed or cancelled load leaves the
                    // cursor untouched.
                    let result = head.pull(cancel, batch).await;
                    match result {
                        Ok(records) => {
                            let next = cursor.queue.pop_front();
                            if let Some(done) = std::mem::replace(&mut cursor.current, next) {
                                debug!(source = %done.loader().describe(), "source drained");
                            }
                            if let Some(current) = cursor.current.as_ref() {
                                info!(
                                    source = %current.loader().describe(),
                                    pending = cursor.queue.len(),
                                    "advanced to next source"
                                );
                            }
                            return Ok(records);
                        }
                        Err(DatasetError::Exhausted) => {
                            if let Some(empty) = cursor.queue.pop_front() {
                                debug!(source = %empty.loader().describe(), "skipping empty source");
                            }
                            Step::Advancing
                        }
                        Err(err) => return Err(err),
                    }
                }
                Step::Exhausted => return Err(DatasetError::Exhausted),
            };
        }
    }
}
