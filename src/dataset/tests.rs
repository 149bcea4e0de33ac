use super::*;
use crate::procs::{FnTransform, Identity};
use crate::sinks::MemorySink;
use crate::stream::{MemoryLoader, MultiStream, RecordStream, SingleStream};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn record(id: usize) -> Record {
    let mut rec = Record::new();
    rec.insert("id".to_string(), json!(id));
    rec
}

fn memory_source(n: usize) -> Arc<dyn Source> {
    Arc::new(SingleStream::new(MemoryLoader::new(
        "test",
        (0..n).map(record).collect(),
    )))
}

// Sink that records the size of each chunk it receives
struct ChunkTracker {
    sizes: Arc<tokio::sync::Mutex<Vec<usize>>>,
}

#[async_trait]
impl Sink for ChunkTracker {
    async fn push(
        &self,
        _cancel: &CancellationToken,
        records: &[Record],
    ) -> Result<(), DatasetError> {
        self.sizes.lock().await.push(records.len());
        Ok(())
    }
}

// Sink that fails once it has accepted `fail_after` chunks
struct FailingSink {
    calls: Arc<AtomicUsize>,
    fail_after: usize,
}

#[async_trait]
impl Sink for FailingSink {
    async fn push(
        &self,
        _cancel: &CancellationToken,
        _records: &[Record],
    ) -> Result<(), DatasetError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call >= self.fail_after {
            return Err(DatasetError::Push("upstream rejected batch".into()));
        }
        Ok(())
    }
}

// Sink that counts every call
struct CountingSink {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Sink for CountingSink {
    async fn push(
        &self,
        _cancel: &CancellationToken,
        _records: &[Record],
    ) -> Result<(), DatasetError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// Source that never finishes until cancelled
struct HangingSource;

#[async_trait]
impl Source for HangingSource {
    async fn pull(
        &self,
        _cancel: &CancellationToken,
        _batch: usize,
    ) -> Result<Vec<Record>, DatasetError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Vec::new())
    }
}

fn tracked_dataset(source: Arc<dyn Source>) -> (Dataset, Arc<tokio::sync::Mutex<Vec<usize>>>) {
    let sizes = Arc::new(tokio::sync::Mutex::new(Vec::new()));
    let sinks = Sinks::new().with(Arc::new(ChunkTracker {
        sizes: Arc::clone(&sizes),
    }));
    (Dataset::new(source, Arc::new(Identity), sinks), sizes)
}

#[tokio::test]
async fn test_cycle_splits_into_push_chunks() {
    let (dataset, sizes) = tracked_dataset(memory_source(5));
    let cancel = CancellationToken::new();

    dataset.cycle(&cancel, 5, 2).await.unwrap();
    assert_eq!(*sizes.lock().await, vec![2, 2, 1]);
}

#[tokio::test]
async fn test_cycle_pull_smaller_than_push_is_single_chunk() {
    let (dataset, sizes) = tracked_dataset(memory_source(5));
    let cancel = CancellationToken::new();

    dataset.cycle(&cancel, 2, 5).await.unwrap();
    assert_eq!(*sizes.lock().await, vec![2]);
}

#[tokio::test]
async fn test_cycle_push_one_at_a_time() {
    let (dataset, sizes) = tracked_dataset(memory_source(3));
    let cancel = CancellationToken::new();

    dataset.cycle(&cancel, 3, 1).await.unwrap();
    assert_eq!(*sizes.lock().await, vec![1, 1, 1]);
}

#[tokio::test]
async fn test_cycle_rebatches_transform_output() {
    let sizes = Arc::new(tokio::sync::Mutex::new(Vec::new()));
    let expand = FnTransform::new(|records| {
        Ok(records
            .into_iter()
            .flat_map(|rec| [rec.clone(), rec.clone(), rec])
            .collect())
    });
    let dataset = Dataset::new(
        memory_source(4),
        Arc::new(expand),
        Sinks::new().with(Arc::new(ChunkTracker {
            sizes: Arc::clone(&sizes),
        })),
    );

    // 4 pulled, 12 transformed, pushed in fours
    dataset
        .cycle(&CancellationToken::new(), 4, 4)
        .await
        .unwrap();
    assert_eq!(*sizes.lock().await, vec![4, 4, 4]);
}

#[tokio::test]
async fn test_cycle_preserves_record_order() {
    let sink = Arc::new(MemorySink::new());
    let dataset = Dataset::new(
        memory_source(7),
        Arc::new(Identity),
        Sinks::new().with(sink.clone()),
    );

    dataset
        .cycle(&CancellationToken::new(), 7, 3)
        .await
        .unwrap();

    let ids: Vec<u64> = sink
        .records()
        .await
        .iter()
        .map(|r| r["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, (0..7).collect::<Vec<u64>>());
}

#[tokio::test]
async fn test_cycle_returns_exhaustion_unchanged() {
    let (dataset, sizes) = tracked_dataset(memory_source(0));
    let err = dataset
        .cycle(&CancellationToken::new(), 5, 5)
        .await
        .unwrap_err();

    assert!(err.is_exhausted());
    assert!(sizes.lock().await.is_empty());
}

#[tokio::test]
async fn test_transform_error_prevents_push() {
    let calls = Arc::new(AtomicUsize::new(0));
    let failing = FnTransform::new(|_records| {
        Err(DatasetError::Transform("unexpected shape".into()))
    });
    let dataset = Dataset::new(
        memory_source(3),
        Arc::new(failing),
        Sinks::new().with(Arc::new(CountingSink {
            calls: Arc::clone(&calls),
        })),
    );

    let err = dataset
        .cycle(&CancellationToken::new(), 3, 3)
        .await
        .unwrap_err();
    assert!(matches!(err, DatasetError::Transform(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_push_error_aborts_remaining_chunks() {
    let calls = Arc::new(AtomicUsize::new(0));
    let dataset = Dataset::new(
        memory_source(6),
        Arc::new(Identity),
        Sinks::new().with(Arc::new(FailingSink {
            calls: Arc::clone(&calls),
            fail_after: 1,
        })),
    );

    let err = dataset
        .cycle(&CancellationToken::new(), 6, 2)
        .await
        .unwrap_err();
    assert!(matches!(err, DatasetError::Push(_)));
    // first chunk accepted, second rejected, third never attempted
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_fan_out_stops_at_first_failing_sink() {
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));
    let sinks = Sinks::new()
        .with(Arc::new(FailingSink {
            calls: Arc::clone(&first),
            fail_after: 0,
        }))
        .with(Arc::new(CountingSink {
            calls: Arc::clone(&second),
        }));

    let err = sinks
        .push(&CancellationToken::new(), &[record(1)])
        .await
        .unwrap_err();
    assert!(matches!(err, DatasetError::Push(_)));
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_fan_out_reaches_every_sink_in_order() {
    let order = Arc::new(tokio::sync::Mutex::new(Vec::new()));

    struct Tagged {
        tag: &'static str,
        order: Arc<tokio::sync::Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Sink for Tagged {
        async fn push(
            &self,
            _cancel: &CancellationToken,
            _records: &[Record],
        ) -> Result<(), DatasetError> {
            self.order.lock().await.push(self.tag);
            Ok(())
        }
    }

    let sinks = Sinks::new()
        .with(Arc::new(Tagged {
            tag: "first",
            order: Arc::clone(&order),
        }))
        .with(Arc::new(Tagged {
            tag: "second",
            order: Arc::clone(&order),
        }));
    assert_eq!(sinks.len(), 2);

    sinks
        .push(&CancellationToken::new(), &[record(1)])
        .await
        .unwrap();
    assert_eq!(*order.lock().await, vec!["first", "second"]);
}

#[tokio::test]
async fn test_empty_sinks_accept_everything() {
    let sinks = Sinks::new();
    assert!(sinks.is_empty());
    sinks
        .push(&CancellationToken::new(), &[record(1)])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_cycle_cancelled_during_pull() {
    let (dataset, sizes) = tracked_dataset(Arc::new(HangingSource));
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel_clone.cancel();
    });

    let err = dataset.cycle(&cancel, 5, 5).await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(!err.is_exhausted());
    assert!(sizes.lock().await.is_empty());
}

#[tokio::test]
async fn test_run_until_exhausted() {
    let multi = MultiStream::new(vec![
        RecordStream::new(MemoryLoader::new("a", (0..3).map(record).collect())),
        RecordStream::new(MemoryLoader::new("b", Vec::new())),
        RecordStream::new(MemoryLoader::new("c", (3..5).map(record).collect())),
    ]);
    let sink = Arc::new(MemorySink::new());
    let dataset = Dataset::new(
        Arc::new(multi),
        Arc::new(Identity),
        Sinks::new().with(sink.clone()),
    )
    .with_name("multi");

    let config = ProcConfigBuilder::default()
        .pull_batch(2usize)
        .push_batch(1usize)
        .interval(Duration::from_millis(1))
        .build()
        .unwrap();

    dataset
        .run(&CancellationToken::new(), &config)
        .await
        .unwrap();

    let sizes: Vec<usize> = sink.chunks().await.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![1; 5]);
    assert_eq!(sink.records().await.len(), 5);
}

#[tokio::test]
async fn test_run_returns_fatal_error() {
    let dataset = Dataset::new(
        memory_source(10),
        Arc::new(Identity),
        Sinks::new().with(Arc::new(FailingSink {
            calls: Arc::new(AtomicUsize::new(0)),
            fail_after: 2,
        })),
    );
    let config = ProcConfigBuilder::default()
        .pull_batch(2usize)
        .push_batch(2usize)
        .interval(Duration::from_millis(1))
        .build()
        .unwrap();

    let err = dataset
        .run(&CancellationToken::new(), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, DatasetError::Push(_)));
}

#[tokio::test]
async fn test_run_cancelled_while_sleeping() {
    let (dataset, sizes) = tracked_dataset(memory_source(10));
    let config = ProcConfigBuilder::default()
        .pull_batch(2usize)
        .push_batch(2usize)
        .interval(Duration::from_secs(60))
        .build()
        .unwrap();

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel_clone.cancel();
    });

    let err = dataset.run(&cancel, &config).await.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(*sizes.lock().await, vec![2]);
}
