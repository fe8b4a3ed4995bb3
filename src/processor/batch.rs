//! Bounded-concurrency batch execution
//!
//! Paths are processed in fixed-size chunks; chunk N+1 starts only after every
//! document of chunk N finished. Results come back in input order and one
//! document's failure (or panic) never affects its siblings.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::DocumentProcessor;
use super::result::{BatchResult, ProcessingResult};

pub async fn process_batch(processor: Arc<DocumentProcessor>, paths: &[PathBuf]) -> BatchResult {
    let started = Instant::now();
    let options = processor.options();
    let chunk_size = options.concurrency.max(1);
    let reclaim_every = options.reclaim_every;
    let mut batch = BatchResult::default();

    info!(
        event = "batch.started",
        documents = paths.len(),
        concurrency = chunk_size
    );

    for (index, chunk) in paths.chunks(chunk_size).enumerate() {
        debug!(event = "batch.chunk.started", chunk = index, documents = chunk.len());
        let handles: Vec<_> = chunk
            .iter()
            .map(|path| {
                let processor = Arc::clone(&processor);
                let path = path.clone();
                tokio::spawn(async move { processor.process_path(&path).await })
            })
            .collect();

        for (path, handle) in chunk.iter().zip(handles) {
            let result = handle.await.unwrap_or_else(|err| {
                ProcessingResult::failed(
                    Some(path.clone()),
                    format!("processing task failed: {err}"),
                )
            });
            batch.push(result);

            if reclaim_every > 0 && batch.results.len() % reclaim_every == 0 {
                reclaim_memory(&processor);
            }
        }
    }

    batch.duration_ms = started.elapsed().as_millis();
    info!(
        event = "batch.completed",
        successful = batch.successful_files,
        failed = batch.failed_files,
        elapsed_ms = batch.duration_ms
    );
    batch
}

/// Best-effort: drop stale lookup cache entries
fn reclaim_memory(processor: &DocumentProcessor) {
    let Some(client) = processor.lookup() else {
        return;
    };
    let max_age = Duration::from_secs(processor.options().cache_max_age_secs);
    let pruned = client.reclaim(max_age);
    debug!(
        event = "batch.memory.reclaimed",
        pruned,
        cached = client.cache_len()
    );
}
