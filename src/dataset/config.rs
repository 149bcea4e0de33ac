// src/dataset/config.rs

use derive_builder::Builder;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

use super::types::DatasetError;

/// Records pulled from the source per cycle when unset.
pub const DEFAULT_PULL_BATCH: usize = 500;

/// Records pushed to the sinks per call when unset.
pub const DEFAULT_PUSH_BATCH: usize = 500;

/// Pause between two cycles when unset.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Builder, Deserialize)]
#[builder(setter(into))]
pub struct ProcConfig {
    /// Maximum number of records pulled and transformed per cycle
    #[builder(default = "DEFAULT_PULL_BATCH")]
    #[serde(default = "default_pull_batch")]
    pub(crate) pull_batch: usize,

    /// Maximum number of records handed to the sinks per push call
    #[builder(default = "DEFAULT_PUSH_BATCH")]
    #[serde(default = "default_push_batch")]
    pub(crate) push_batch: usize,

    /// Pause between cycles, written as "5s" or "1m 30s" in settings files
    #[builder(default = "DEFAULT_INTERVAL")]
    #[serde(default = "default_interval", deserialize_with = "parse_interval")]
    pub(crate) interval: Duration,
}

impl ProcConfig {
    #[inline]
    pub fn pull_batch(&self) -> usize {
        self.pull_batch
    }

    #[inline]
    pub fn push_batch(&self) -> usize {
        self.push_batch
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Replaces zero batch sizes with their defaults.
    pub fn validate(&mut self) -> Result<(), DatasetError> {
        if self.pull_batch == 0 {
            self.pull_batch = DEFAULT_PULL_BATCH;
        }
        if self.push_batch == 0 {
            self.push_batch = DEFAULT_PUSH_BATCH;
        }
        Ok(())
    }
}

impl Default for ProcConfig {
    fn default() -> Self {
        ProcConfig {
            pull_batch: DEFAULT_PULL_BATCH,
            push_batch: DEFAULT_PUSH_BATCH,
            interval: DEFAULT_INTERVAL,
        }
    }
}

fn default_pull_batch() -> usize {
    DEFAULT_PULL_BATCH
}

fn default_push_batch() -> usize {
    DEFAULT_PUSH_BATCH
}

fn default_interval() -> Duration {
    DEFAULT_INTERVAL
}

fn parse_interval<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(DEFAULT_INTERVAL);
    }
    humantime::parse_duration(raw).map_err(serde::de::Error::custom)
}
