//! TOML settings file describing the datasets to run.
//!
//! ```toml
//! workers = 2
//!
//! [config]
//! pull_batch = 200
//! push_batch = 50
//! interval = "2s"
//!
//! [[datasets]]
//! name = "sales"
//! driver = "json-dir"
//! source = "./exports"
//! deep = true
//! output = "./out/sales.jsonl"
//!
//! [datasets.binary]
//! bin = "sales-transform"
//! command = "--currency EUR"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use super::{Config, DatasetManager};
use crate::dataset::{Dataset, DatasetError, ProcConfig, Sink, Sinks, Source, Transformer};
use crate::procs::{BinaryConfig, BinaryTransform, Identity};
use crate::sinks::{JsonLinesSink, LogSink};
use crate::stream::{json_dir_stream, json_file_stream};

/// Where a dataset reads its records from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Driver {
    /// A single file holding a JSON array of objects.
    JsonFile,
    /// A directory of such files.
    JsonDir,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetSettings {
    pub name: String,
    pub driver: Driver,
    pub source: PathBuf,

    /// Walk sub-directories too. Only meaningful for `json-dir`.
    #[serde(default)]
    pub deep: bool,

    /// Transform through an external program instead of passing records
    /// through untouched.
    #[serde(default)]
    pub binary: Option<BinaryConfig>,

    /// JSON-lines file receiving the pushed records. Chunks are only
    /// logged when absent.
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl DatasetSettings {
    pub fn validate(&mut self) -> Result<(), DatasetError> {
        if self.name.trim().is_empty() {
            return Err(DatasetError::Config("dataset name is required".into()));
        }

        let meta = std::fs::metadata(&self.source).map_err(|e| DatasetError::io(&self.source, e))?;
        match self.driver {
            Driver::JsonFile if !meta.is_file() => {
                return Err(DatasetError::Config(format!(
                    "dataset '{}': source {} must be a file",
                    self.name,
                    self.source.display()
                )));
            }
            Driver::JsonDir if !meta.is_dir() => {
                return Err(DatasetError::Config(format!(
                    "dataset '{}': source {} must be a directory",
                    self.name,
                    self.source.display()
                )));
            }
            _ => {}
        }

        if let Some(binary) = self.binary.as_mut() {
            binary.validate()?;
        }
        Ok(())
    }

    /// Opens the source, transform and sinks this entry describes.
    pub async fn build(&self) -> Result<Dataset, DatasetError> {
        let source: Arc<dyn Source> = match self.driver {
            Driver::JsonFile => Arc::new(json_file_stream(&self.source).await?),
            Driver::JsonDir => Arc::new(json_dir_stream(&self.source, self.deep).await?),
        };

        let transformer: Arc<dyn Transformer> = match &self.binary {
            Some(binary) => Arc::new(BinaryTransform::new(binary)),
            None => Arc::new(Identity),
        };

        let sink: Arc<dyn Sink> = match &self.output {
            Some(path) => Arc::new(JsonLinesSink::open(path).await?),
            None => Arc::new(LogSink::new(self.name.clone())),
        };

        Ok(Dataset::new(source, transformer, Sinks::new().with(sink)).with_name(&self.name))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Datasets running at the same time.
    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default)]
    pub config: ProcConfig,

    #[serde(default)]
    pub datasets: Vec<DatasetSettings>,
}

fn default_workers() -> usize {
    Config::default().worker_num
}

impl Settings {
    /// Parses and validates settings.
    pub fn from_toml_str(raw: &str) -> Result<Self, DatasetError> {
        let mut settings: Settings = toml::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DatasetError::io(path, e))?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&mut self) -> Result<(), DatasetError> {
        self.config.validate()?;
        if self.workers == 0 {
            self.workers = default_workers();
        }
        for dataset in &mut self.datasets {
            dataset.validate()?;
        }
        Ok(())
    }

    /// Builds a manager holding one runnable dataset per entry.
    pub async fn into_manager(self) -> Result<DatasetManager, DatasetError> {
        let mut manager = DatasetManager::new(&Config::new(self.workers), self.config);
        for dataset in &self.datasets {
            manager.add_dataset(dataset.build().await?);
        }
        Ok(manager)
    }
}
