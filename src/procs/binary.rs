// src/procs/binary.rs

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::dataset::{DatasetError, Record, Transformer};

/// Settings for [`BinaryTransform`].
#[derive(Debug, Clone, Deserialize)]
pub struct BinaryConfig {
    /// Program to execute: a path, or a bare name looked up in `PATH`.
    pub bin: String,

    /// Extra arguments, whitespace separated, passed before any input.
    #[serde(default)]
    pub command: Option<String>,
}

impl BinaryConfig {
    /// Resolves `bin` to an executable file.
    ///
    /// A bare name is searched in `PATH` and rewritten to the match. Paths
    /// with a directory part are checked as given.
    pub fn validate(&mut self) -> Result<(), DatasetError> {
        if self.bin.trim().is_empty() {
            return Err(DatasetError::Config("binary.bin is required".into()));
        }

        let bin = Path::new(&self.bin);
        if bin.is_absolute() || bin.components().count() > 1 {
            if !is_executable(bin) {
                return Err(DatasetError::Config(format!(
                    "binary.bin {} must be an executable file",
                    self.bin
                )));
            }
            return Ok(());
        }

        let found = std::env::var_os("PATH")
            .into_iter()
            .flat_map(|paths| std::env::split_paths(&paths).collect::<Vec<_>>())
            .map(|dir| dir.join(bin))
            .find(|candidate| is_executable(candidate));
        match found {
            Some(path) => {
                self.bin = path.display().to_string();
                Ok(())
            }
            None => Err(DatasetError::Config(format!(
                "binary.bin {} not found in PATH",
                self.bin
            ))),
        }
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Transforms batches by piping them through an external program.
///
/// The batch is written to the child's stdin as a JSON array and the
/// child must print a JSON array of objects on stdout. A non-zero exit
/// fails the batch with the child's stderr attached. Cancelling kills the
/// child.
pub struct BinaryTransform {
    program: PathBuf,
    args: Vec<String>,
}

impl BinaryTransform {
    pub fn new(config: &BinaryConfig) -> Self {
        BinaryTransform {
            program: PathBuf::from(&config.bin),
            args: config
                .command
                .as_deref()
                .map(|cmd| cmd.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
        }
    }

    async fn exec(&self, input: Vec<u8>) -> Result<Vec<Record>, DatasetError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DatasetError::io(&self.program, e))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| DatasetError::Transform("child stdin unavailable".into()))?;
        let write = async move {
            let written = stdin.write_all(&input).await;
            drop(stdin);
            written
        };

        let (written, output) = futures::future::join(write, child.wait_with_output()).await;
        let output = output.map_err(|e| DatasetError::io(&self.program, e))?;

        if !output.status.success() {
            return Err(DatasetError::Process {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        // A child may exit successfully without draining its input.
        if let Err(err) = written {
            if err.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(DatasetError::io(&self.program, err));
            }
        }

        serde_json::from_slice(&output.stdout).map_err(|e| {
            tracing::warn!(
                program = %self.program.display(),
                stderr = %String::from_utf8_lossy(&output.stderr),
                "transform output is not a json array of objects"
            );
            DatasetError::Transform(Box::new(e))
        })
    }
}

#[async_trait]
impl Transformer for BinaryTransform {
    async fn transform(
        &self,
        cancel: &CancellationToken,
        records: Vec<Record>,
    ) -> Result<Vec<Record>, DatasetError> {
        let input = serde_json::to_vec(&records).map_err(|e| DatasetError::Transform(Box::new(e)))?;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DatasetError::Cancelled),
            result = self.exec(input) => result,
        }
    }
}
