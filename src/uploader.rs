//! Batched bulk writer for page name strings.
//!
//! The uploader runs as its own tokio task for the whole ingest run. The
//! ingestor pushes [`PageNameString`]s into an unbounded channel; the task
//! groups them into batches of [`BATCH_SIZE`] and hands each batch to
//! [`NameStore::insert_page_name_strings`], which commits it in one
//! transaction. Dropping the sending side (see [`UploaderHandle::finish`])
//! is the only stop signal: the task then flushes the partial batch and
//! returns its totals.
//!
//! Records are persisted in the order they were sent.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use pagenames_core::models::PageNameString;
use pagenames_core::store::NameStore;

/// Records per committed batch.
pub const BATCH_SIZE: usize = 10_000;

#[derive(Debug, Error)]
pub enum UploadError {
    /// The uploader task has stopped, normally because a batch failed.
    #[error("upload queue is closed")]
    QueueClosed,
}

/// Totals reported by a finished uploader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadStats {
    pub records: u64,
    pub batches: u64,
}

/// Configures and starts the uploader task.
pub struct BatchUploader {
    store: Arc<dyn NameStore>,
    batch_size: usize,
}

impl BatchUploader {
    pub fn new(store: Arc<dyn NameStore>) -> Self {
        Self {
            store,
            batch_size: BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Spawn the uploader task and return the producer-side handle.
    pub fn spawn(self) -> UploaderHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let uploaded = Arc::new(AtomicU64::new(0));
        let worker = Worker {
            store: self.store,
            batch_size: self.batch_size,
            uploaded: uploaded.clone(),
        };
        let task = tokio::spawn(worker.run(rx));

        UploaderHandle { tx, task, uploaded }
    }
}

/// Producer side of a running uploader.
pub struct UploaderHandle {
    tx: mpsc::UnboundedSender<PageNameString>,
    task: JoinHandle<Result<UploadStats>>,
    uploaded: Arc<AtomicU64>,
}

impl UploaderHandle {
    /// Queue a record. Fails only if the uploader task has already stopped.
    pub fn send(&self, record: PageNameString) -> Result<(), UploadError> {
        self.tx.send(record).map_err(|_| UploadError::QueueClosed)
    }

    /// Records committed so far.
    pub fn uploaded(&self) -> u64 {
        self.uploaded.load(Ordering::Relaxed)
    }

    /// Close the queue and wait until every queued record is committed.
    pub async fn finish(self) -> Result<UploadStats> {
        drop(self.tx);
        self.task.await.context("uploader task panicked")?
    }

    /// Stop the task without flushing what is still queued.
    pub fn abort(self) {
        self.task.abort();
    }
}

struct Worker {
    store: Arc<dyn NameStore>,
    batch_size: usize,
    uploaded: Arc<AtomicU64>,
}

impl Worker {
    async fn run(self, mut rx: mpsc::UnboundedReceiver<PageNameString>) -> Result<UploadStats> {
        let mut stats = UploadStats::default();
        let mut batch = Vec::with_capacity(self.batch_size);

        while let Some(record) = rx.recv().await {
            batch.push(record);
            if batch.len() >= self.batch_size {
                self.persist(&mut batch, &mut stats).await?;
            }
        }
        self.persist(&mut batch, &mut stats).await?;

        Ok(stats)
    }

    async fn persist(&self, batch: &mut Vec<PageNameString>, stats: &mut UploadStats) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        self.store
            .insert_page_name_strings(batch)
            .await
            .with_context(|| {
                format!(
                    "bulk load of batch {} ({} records) failed",
                    stats.batches + 1,
                    batch.len()
                )
            })?;

        stats.batches += 1;
        stats.records += batch.len() as u64;
        self.uploaded.store(stats.records, Ordering::Relaxed);
        debug!(batch = stats.batches, records = batch.len(), total = stats.records, "batch committed");
        batch.clear();
        Ok(())
    }
}
