//! # etl-dataset
//!
//! A recurring batch ETL pipeline built on Tokio: pull a bounded number of
//! records from a source, transform them, and push the results in
//! possibly different-sized chunks to one or more sinks, cycle after
//! cycle, until the source runs dry.
//!
//! ## Features
//!
//! - **Pull → transform → re-batch → push** cycles with independent pull
//!   and push sizes
//! - **Multi-file streaming** over a directory of JSON files, loaded
//!   lazily one file at a time
//! - **Ordered sink fan-out** that stops at the first failing sink
//! - **Graceful cancellation** of every blocking stage
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use etl_dataset::dataset::{Dataset, ProcConfigBuilder, Sinks};
//! use etl_dataset::procs::Identity;
//! use etl_dataset::sinks::JsonLinesSink;
//! use etl_dataset::stream::json_dir_stream;
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! let source = json_dir_stream("./exports", true).await?;
//! let sink = JsonLinesSink::open("./out.jsonl").await?;
//! let dataset = Dataset::new(Arc::new(source), Arc::new(Identity), Sinks::new().with(Arc::new(sink)));
//!
//! let config = ProcConfigBuilder::default()
//!     .pull_batch(100usize)
//!     .push_batch(25usize)
//!     .interval(Duration::from_secs(1))
//!     .build()?;
//! dataset.run(&CancellationToken::new(), &config).await?;
//! ```
//!
//! ## Modules
//!
//! - [`dataset`] - Record contracts and the cycle orchestrator
//! - [`stream`] - Single and multi-source batch readers
//! - [`procs`] - Transformer implementations
//! - [`sinks`] - Sink implementations
//! - [`runner`] - Settings-driven, concurrent execution of many datasets

pub mod dataset;
pub mod procs;
pub mod runner;
pub mod sinks;
pub mod stream;
