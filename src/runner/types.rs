use crate::dataset::DatasetError;

/// Errors that can occur while running several datasets together
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("dataset '{name}' failed")]
    Dataset {
        name: String,
        #[source]
        source: DatasetError,
    },

    #[error("worker pool error: {0}")]
    WorkerPool(String),

    #[error("dataset task panicked or was aborted")]
    Join(#[from] tokio::task::JoinError),

    #[error("{} dataset(s) failed", .0.len())]
    MultipleErrors(Vec<RunnerError>),
}
