//! Runs every dataset described in a TOML settings file.
//!
//! ```toml
//! workers = 2
//!
//! [config]
//! pull_batch = 100
//! push_batch = 25
//! interval = "1s"
//!
//! [[datasets]]
//! name = "sales"
//! driver = "json-dir"
//! source = "./exports"
//! deep = true
//! output = "./sales.jsonl"
//! ```
//!
//! Run with: cargo run --example json_dir_dataset -- datasets.toml

use etl_dataset::runner::Settings;
use std::error::Error;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "datasets.toml".to_string());

    let settings = Settings::load(&path).await?;
    println!(
        "Loaded {} dataset(s) from {} (workers: {})",
        settings.datasets.len(),
        path,
        settings.workers
    );

    let manager = settings.into_manager().await?;

    let cancel = CancellationToken::new();

    // Set up graceful shutdown
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        println!("\nShutdown signal received...");
        cancel_clone.cancel();
    });

    let start = std::time::Instant::now();
    match manager.run_all(&cancel).await {
        Ok(()) => {
            println!(
                "\n=== All datasets drained in {:.2}s ===",
                start.elapsed().as_secs_f64()
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("\n=== Error running datasets: {} ===", e);
            Err(Box::new(e) as Box<dyn Error>)
        }
    }
}
