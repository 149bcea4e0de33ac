//! Runs several independent datasets concurrently.

pub mod settings;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use derive_builder::Builder;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::dataset::{Dataset, DatasetError, ProcConfig};

pub use settings::{DatasetSettings, Driver, Settings};
pub use types::RunnerError;

/// Configuration for concurrent dataset execution
#[derive(Debug, Clone, Builder)]
pub struct Config {
    /// Maximum number of datasets running at the same time
    #[builder(default = "4")]
    pub worker_num: usize,
}

impl Config {
    pub fn new(worker_num: usize) -> Self {
        Config { worker_num }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config { worker_num: 4 }
    }
}

/// A unit of work the manager can schedule.
#[async_trait]
pub trait DatasetRunner: Send + Sync {
    fn name(&self) -> &str;

    async fn run(
        &self,
        config: Arc<ProcConfig>,
        cancel: &CancellationToken,
    ) -> Result<(), DatasetError>;
}

#[async_trait]
impl DatasetRunner for Dataset {
    fn name(&self) -> &str {
        Dataset::name(self)
    }

    async fn run(
        &self,
        config: Arc<ProcConfig>,
        cancel: &CancellationToken,
    ) -> Result<(), DatasetError> {
        Dataset::run(self, cancel, &config).await
    }
}

/// Runs every registered dataset to exhaustion, at most `worker_num` at a
/// time. Datasets share nothing, so one failing does not stop the others.
pub struct DatasetManager {
    runners: Vec<Arc<dyn DatasetRunner>>,
    cfg: Config,
    proc_config: Arc<ProcConfig>,
}

impl DatasetManager {
    pub fn new(cfg: &Config, proc_config: ProcConfig) -> Self {
        DatasetManager {
            runners: Vec::new(),
            cfg: cfg.clone(),
            proc_config: Arc::new(proc_config),
        }
    }

    pub fn add_dataset(&mut self, dataset: Dataset) {
        self.runners.push(Arc::new(dataset));
    }

    pub fn add_runner(&mut self, runner: Arc<dyn DatasetRunner>) {
        self.runners.push(runner);
    }

    pub fn len(&self) -> usize {
        self.runners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runners.is_empty()
    }

    /// Waits for every dataset and reports the failures, if any.
    pub async fn run_all(&self, cancel: &CancellationToken) -> Result<(), RunnerError> {
        let semaphore = Arc::new(Semaphore::new(self.cfg.worker_num.max(1)));
        let mut tasks = JoinSet::new();

        for runner in &self.runners {
            let runner = Arc::clone(runner);
            let config = Arc::clone(&self.proc_config);
            let cancel = cancel.clone();
            let sem = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let _permit = sem
                    .acquire_owned()
                    .await
                    .map_err(|e| RunnerError::WorkerPool(e.to_string()))?;
                tracing::info!(dataset = runner.name(), "dataset started");
                runner
                    .run(config, &cancel)
                    .await
                    .map_err(|source| RunnerError::Dataset {
                        name: runner.name().to_string(),
                        source,
                    })
            });
        }

        let mut errors = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "dataset failed");
                    errors.push(e);
                }
                Err(e) => errors.push(RunnerError::Join(e)),
            }
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(RunnerError::MultipleErrors(errors)),
        }
    }
}

#[cfg(test)]
#[path = "manager_test.rs"]
mod tests;
