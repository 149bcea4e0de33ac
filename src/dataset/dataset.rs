use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::ProcConfig;
use super::sinks::Sinks;
use super::{DatasetError, Sink, Source, Transformer};

/// Drives the pull → transform → re-batch → push cycle.
///
/// A `Dataset` keeps no state between cycles; whatever progress exists
/// lives in its source. A failed cycle loses its pulled batch, there is
/// no replay.
///
/// # Lifecycle
///
/// 1. [`Source::pull`] up to `pull_size` records
/// 2. [`Transformer::transform`] the whole batch
/// 3. split the output into chunks of `push_size`
/// 4. [`Sink::push`] each chunk to every sink, in order
pub struct Dataset {
    name: String,
    source: Arc<dyn Source>,
    transformer: Arc<dyn Transformer>,
    sinks: Sinks,
}

impl Dataset {
    pub fn new(source: Arc<dyn Source>, transformer: Arc<dyn Transformer>, sinks: Sinks) -> Self {
        Dataset {
            name: "dataset".to_string(),
            source,
            transformer,
            sinks,
        }
    }

    /// Sets the name used in log events.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs a single cycle.
    ///
    /// Returns [`DatasetError::Exhausted`] unchanged when the source has
    /// nothing left. Chunks pushed before a push failure stay pushed.
    pub async fn cycle(
        &self,
        cancel: &CancellationToken,
        pull_size: usize,
        push_size: usize,
    ) -> Result<(), DatasetError> {
        let pulled = cancellable(cancel, self.source.pull(cancel, pull_size)).await?;
        debug!(dataset = %self.name, pulled = pulled.len(), "pulled batch");

        let transformed = cancellable(cancel, self.transformer.transform(cancel, pulled)).await?;

        let chunks = rebatch(&transformed, pull_size, push_size);
        let total = chunks.len();
        for (index, chunk) in chunks.into_iter().enumerate() {
            cancellable(cancel, self.sinks.push(cancel, chunk)).await?;
            debug!(
                dataset = %self.name,
                chunk = index + 1,
                of = total,
                records = chunk.len(),
                "pushed chunk"
            );
        }
        Ok(())
    }

    /// Repeats [`Dataset::cycle`] until the source is exhausted, sleeping
    /// `config.interval()` between cycles.
    ///
    /// Exhaustion ends the run with `Ok(())`. Any other error is returned
    /// with its cause intact.
    pub async fn run(
        &self,
        cancel: &CancellationToken,
        config: &ProcConfig,
    ) -> Result<(), DatasetError> {
        let mut cycles = 0usize;
        loop {
            match self
                .cycle(cancel, config.pull_batch(), config.push_batch())
                .await
            {
                Ok(()) => cycles += 1,
                Err(DatasetError::Exhausted) => {
                    info!(dataset = %self.name, cycles, "source exhausted");
                    return Ok(());
                }
                Err(err) => {
                    warn!(dataset = %self.name, cycles, error = %err, "cycle failed");
                    return Err(err);
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(DatasetError::Cancelled),
                _ = tokio::time::sleep(config.interval()) => {}
            }
        }
    }
}

async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, DatasetError>
where
    F: Future<Output = Result<T, DatasetError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DatasetError::Cancelled),
        result = fut => result,
    }
}

/// Splits `records` into the slices handed to the sinks.
///
/// Everything goes out in one call when `push_size` covers the whole
/// batch, when `pull_size < push_size`, or when `push_size` is zero.
/// Otherwise consecutive chunks of `push_size` are produced and the final
/// chunk carries the remainder.
pub(crate) fn rebatch<T>(records: &[T], pull_size: usize, push_size: usize) -> Vec<&[T]> {
    if push_size == 0 || push_size >= records.len() || pull_size < push_size {
        return vec![records];
    }
    records.chunks(push_size).collect()
}
