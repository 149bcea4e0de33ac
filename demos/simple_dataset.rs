//! Simple dataset example demonstrating the etl-dataset pipeline.
//!
//! This example pulls 20 score records from memory in batches of 8, sums
//! each user's scores, and pushes the results in chunks of 3 to a sink
//! that prints them.
//!
//! Run with: cargo run --example simple_dataset

use async_trait::async_trait;
use etl_dataset::dataset::{Dataset, DatasetError, ProcConfigBuilder, Record, Sink, Sinks};
use etl_dataset::procs::FnTransform;
use etl_dataset::stream::{MemoryLoader, SingleStream};
use serde_json::json;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Sink that prints every chunk it receives
struct StdoutSink;

#[async_trait]
impl Sink for StdoutSink {
    async fn push(
        &self,
        _cancel: &CancellationToken,
        records: &[Record],
    ) -> Result<(), DatasetError> {
        println!("Pushed chunk of {} records:", records.len());
        for record in records {
            println!("  {}", serde_json::Value::Object(record.clone()));
        }
        Ok(())
    }
}

fn score_records() -> Vec<Record> {
    (1..=20)
        .map(|i| {
            let mut rec = Record::new();
            rec.insert("user".into(), json!(format!("user-{}", i)));
            rec.insert("scores".into(), json!([i, i * 2, i * 3]));
            rec
        })
        .collect()
}

fn total_scores(records: Vec<Record>) -> Result<Vec<Record>, DatasetError> {
    Ok(records
        .into_iter()
        .map(|rec| {
            let score: i64 = rec
                .get("scores")
                .and_then(|s| s.as_array())
                .map(|s| s.iter().filter_map(|v| v.as_i64()).sum())
                .unwrap_or(0);
            let mut out = Record::new();
            out.insert("user".into(), rec.get("user").cloned().unwrap_or_default());
            out.insert("score".into(), json!(score));
            out
        })
        .collect())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing for logs
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let dataset = Dataset::new(
        Arc::new(SingleStream::new(MemoryLoader::new("scores", score_records()))),
        Arc::new(FnTransform::new(total_scores)),
        Sinks::new().with(Arc::new(StdoutSink)),
    )
    .with_name("scores");

    let config = ProcConfigBuilder::default()
        .pull_batch(8usize)
        .push_batch(3usize)
        .interval(Duration::from_millis(200))
        .build()?;

    println!("\nRunning dataset:");
    println!("- Pulling 20 records in batches of 8");
    println!("- Summing scores per user");
    println!("- Pushing in chunks of 3\n");

    let cancel = CancellationToken::new();
    dataset.run(&cancel, &config).await?;

    Ok(())
}
