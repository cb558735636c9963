//! Background worker that moves queued value records into the durable store.
//!
//! Records are deduplicated per key and written with one bulk upsert when the
//! batch is full, when the queue has been idle for the flush interval, on an
//! explicit flush and at shutdown. A failed batch is retried with capped
//! exponential backoff until it goes through.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::{
    Result, error::Error, identifiers::StateKey, ports::ValueRepository, records::ValueRecord,
};

/// Tuning of the background writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterSettings {
    /// Pending distinct records that trigger a flush.
    pub batch_size: usize,
    /// Idle time after which pending records are flushed anyway.
    pub flush_interval: Duration,
    /// First back-off after a failed flush.
    pub retry_delay: Duration,
    /// Back-off ceiling.
    pub max_retry_delay: Duration,
}

impl Default for WriterSettings {
    fn default() -> Self {
        Self {
            batch_size: 100,
            flush_interval: Duration::from_millis(500),
            retry_delay: Duration::from_millis(50),
            max_retry_delay: Duration::from_millis(5000),
        }
    }
}

/// Counters published by the writer thread.
#[derive(Debug, Default)]
pub struct WriterStats {
    enqueued: AtomicU64,
    written: AtomicU64,
    batches: AtomicU64,
    failed_attempts: AtomicU64,
}

impl WriterStats {
    /// Records handed to the writer.
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::SeqCst)
    }

    /// Records durably written, after deduplication.
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::SeqCst)
    }

    /// Successful bulk writes.
    pub fn batches(&self) -> u64 {
        self.batches.load(Ordering::SeqCst)
    }

    /// Bulk writes that failed and were retried.
    pub fn failed_attempts(&self) -> u64 {
        self.failed_attempts.load(Ordering::SeqCst)
    }
}

enum Command {
    Write(ValueRecord),
    Flush(Sender<()>),
}

/// Deduplicating batch of records waiting to be written.
///
/// A later write for a key replaces the earlier one in place.
#[derive(Default)]
struct Pending {
    records: Vec<ValueRecord>,
    positions: HashMap<StateKey, usize>,
}

impl Pending {
    fn push(&mut self, record: ValueRecord) {
        match self.positions.get(&record.key) {
            Some(&index) => self.records[index] = record,
            None => {
                self.positions.insert(record.key.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn take(&mut self) -> Vec<ValueRecord> {
        self.positions.clear();
        std::mem::take(&mut self.records)
    }
}

/// Background writer that batches value-record updates into bulk upserts.
///
/// Foreground callers enqueue full records and return immediately. A single
/// thread drains the queue, keeps only the latest record per key, and flushes
/// when the batch is full, when the queue has been idle for the flush
/// interval, on [`flush`](Self::flush), and on shutdown. Failed flushes are
/// retried with capped exponential back-off until they succeed.
pub struct BatchWriter {
    sender: Mutex<Option<Sender<Command>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    stats: Arc<WriterStats>,
}

impl BatchWriter {
    /// Start the writer thread.
    pub fn spawn(repository: Arc<dyn ValueRepository>, settings: WriterSettings) -> Result<Self> {
        if settings.batch_size == 0 {
            return Err(Error::InvalidConfiguration {
                message: "batch_size must be at least 1".to_string(),
            });
        }

        let (sender, receiver) = channel::unbounded();
        let stats = Arc::new(WriterStats::default());
        let worker = Worker {
            repository,
            settings,
            stats: Arc::clone(&stats),
            pending: Pending::default(),
        };

        let handle = thread::Builder::new()
            .name("batch-writer".to_string())
            .spawn(move || worker.run(receiver))
            .map_err(|source| Error::Io {
                operation: "spawn batch writer thread".to_string(),
                source,
            })?;

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            handle: Mutex::new(Some(handle)),
            stats,
        })
    }

    /// Queue a full record for durable replacement.
    pub fn enqueue(&self, record: ValueRecord) -> Result<()> {
        let sender = self.sender.lock();
        let sender = sender.as_ref().ok_or(Error::WriterClosed)?;
        sender
            .send(Command::Write(record))
            .map_err(|_| Error::WriterClosed)?;
        self.stats.enqueued.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Block until everything enqueued so far has been written.
    pub fn flush(&self) -> Result<()> {
        let (ack, done) = channel::bounded(1);
        {
            let sender = self.sender.lock();
            let sender = sender.as_ref().ok_or(Error::WriterClosed)?;
            sender
                .send(Command::Flush(ack))
                .map_err(|_| Error::WriterClosed)?;
        }
        done.recv().map_err(|_| Error::WriterClosed)
    }

    pub fn stats(&self) -> &WriterStats {
        &self.stats
    }

    pub fn is_running(&self) -> bool {
        self.sender.lock().is_some()
    }

    /// Drain the queue, write what is left and stop the thread.
    ///
    /// Calling this more than once is a no-op.
    pub fn shutdown(&self) -> Result<()> {
        drop(self.sender.lock().take());
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            handle.join().map_err(|_| Error::SerializationContext {
                operation: "join batch writer thread".to_string(),
                message: "writer thread panicked".to_string(),
            })?;
            info!(
                "Batch writer stopped: {} records in {} batches, {} failed attempts",
                self.stats.written(),
                self.stats.batches(),
                self.stats.failed_attempts()
            );
        }
        Ok(())
    }
}

impl Drop for BatchWriter {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("Batch writer did not stop cleanly: {e}");
        }
    }
}

struct Worker {
    repository: Arc<dyn ValueRepository>,
    settings: WriterSettings,
    stats: Arc<WriterStats>,
    pending: Pending,
}

impl Worker {
    fn run(mut self, receiver: Receiver<Command>) {
        debug!("Batch writer started with {:?}", self.settings);
        loop {
            match receiver.recv_timeout(self.settings.flush_interval) {
                Ok(Command::Write(record)) => {
                    self.pending.push(record);
                    if self.pending.len() >= self.settings.batch_size {
                        self.flush();
                    }
                }
                Ok(Command::Flush(ack)) => {
                    self.flush();
                    let _ = ack.send(());
                }
                Err(RecvTimeoutError::Timeout) => self.flush(),
                Err(RecvTimeoutError::Disconnected) => {
                    self.flush();
                    break;
                }
            }
        }
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let batch = self.pending.take();
        let mut delay = self.settings.retry_delay;

        loop {
            match self.repository.bulk_upsert(&batch) {
                Ok(()) => {
                    self.stats.batches.fetch_add(1, Ordering::SeqCst);
                    self.stats
                        .written
                        .fetch_add(batch.len() as u64, Ordering::SeqCst);
                    debug!("Flushed {} records", batch.len());
                    return;
                }
                Err(e) => {
                    self.stats.failed_attempts.fetch_add(1, Ordering::SeqCst);
                    warn!(
                        "Bulk write of {} records failed, retrying in {delay:?}: {e}",
                        batch.len()
                    );
                    thread::sleep(delay);
                    delay = (delay * 2).min(self.settings.max_retry_delay);
                }
            }
        }
    }
}
