use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Boxed error produced by a source, transform or sink implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while pulling, transforming or pushing records.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The source has no more records right now.
    ///
    /// This is not a failure: run loops treat it as normal termination.
    #[error("no more records")]
    Exhausted,

    /// The operation was cancelled via the cancellation token.
    #[error("operation cancelled")]
    Cancelled,

    /// Reading a source file failed.
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A source file held content that is not a JSON array of objects.
    #[error("malformed json in {}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A file stream was requested for something that is not a file.
    #[error("{} is not a file", .0.display())]
    NotAFile(PathBuf),

    /// A source implementation failed.
    ///
    /// Preserves the source error for debugging.
    #[error("source failed")]
    Source(#[source] BoxError),

    /// A transformer failed.
    #[error("transform failed")]
    Transform(#[source] BoxError),

    /// A sink failed to accept a batch.
    #[error("push failed")]
    Push(#[source] BoxError),

    /// A transform subprocess exited unsuccessfully.
    #[error("transform process exited with {status}: {stderr}")]
    Process { status: ExitStatus, stderr: String },

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// The settings file could not be parsed.
    #[error("invalid settings")]
    Settings(#[from] toml::de::Error),
}

impl DatasetError {
    /// Returns true for the exhaustion signal.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, DatasetError::Exhausted)
    }

    /// Returns true when the error came from cancellation.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DatasetError::Cancelled)
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DatasetError::Io {
            path: path.into(),
            source,
        }
    }
}
