use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{Loader, MultiStream, SingleStream};
use crate::dataset::{DatasetError, Record};

/// Loader for one file holding a JSON array of objects, or `null`.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    /// Checks that `path` names an existing file. Content is read on the
    /// first pull.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, DatasetError> {
        let path = path.into();
        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|e| DatasetError::io(&path, e))?;
        if !meta.is_file() {
            return Err(DatasetError::NotAFile(path));
        }
        Ok(JsonFile { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Loader for JsonFile {
    async fn load(&mut self, cancel: &CancellationToken) -> Result<Vec<Record>, DatasetError> {
        let bytes = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DatasetError::Cancelled),
            read = tokio::fs::read(&self.path) => read.map_err(|e| DatasetError::io(&self.path, e))?,
        };

        // a bare `null` document loads as an empty source
        let records: Vec<Record> = serde_json::from_slice::<Option<Vec<Record>>>(&bytes)
            .map_err(|source| DatasetError::Json {
                path: self.path.clone(),
                source,
            })?
            .unwrap_or_default();
        tracing::info!(path = %self.path.display(), records = records.len(), "loaded json file");
        Ok(records)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Opens a single JSON file as a source.
pub async fn json_file_stream(
    path: impl Into<PathBuf>,
) -> Result<SingleStream<JsonFile>, DatasetError> {
    Ok(SingleStream::new(JsonFile::open(path).await?))
}

/// Collects the `*.json` files of `dir` into one source, in path order.
///
/// Only direct children are considered unless `deep` is set, in which case
/// the whole tree is walked. Files are read lazily, one after the other.
pub async fn json_dir_stream(
    dir: impl Into<PathBuf>,
    deep: bool,
) -> Result<MultiStream<JsonFile>, DatasetError> {
    let dir = dir.into();
    let files = find_json_files(dir.clone(), deep).await?;
    tracing::info!(dir = %dir.display(), files = files.len(), deep, "discovered json files");

    Ok(MultiStream::from_loaders(
        files.into_iter().map(|path| JsonFile { path }),
    ))
}

async fn find_json_files(dir: PathBuf, deep: bool) -> Result<Vec<PathBuf>, DatasetError> {
    tokio::task::spawn_blocking::<_, Result<Vec<PathBuf>, DatasetError>>(move || {
        let mut walk = walkdir::WalkDir::new(&dir)
            .min_depth(1)
            .sort_by_file_name();
        if !deep {
            walk = walk.max_depth(1);
        }

        let mut files = Vec::new();
        for entry in walk {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.clone());
                DatasetError::io(path, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            files.push(entry.into_path());
        }
        Ok(files)
    })
    .await
    .map_err(|e| DatasetError::Source(Box::new(e)))?
}
