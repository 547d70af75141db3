//! Background generation of whole height batches.
//!
//! Callers submit cluster lists and poll for completed batches, so a frame loop
//! never blocks on generation. Each job runs on a worker thread that forwards it
//! to the shared [`BatchDispatcher`], which in turn fans it out over the pool.
//! Cancellation is per batch: a cancelled job is skipped if it has not started
//! and its result is discarded if it has.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, SendTimeoutError, Sender, TrySendError, bounded};
use dashmap::DashMap;
use glam::IVec2;
use strata_config::DispatchConfig;
use tracing::{debug, warn};

use crate::density::DensityFunction;
use crate::dispatch::{BatchDispatcher, HeightBatch};
use crate::error::GenerationError;

/// How long a worker waits on a full result channel before re-checking for
/// cancellation.
const RESULT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Handle of a submitted batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchId(pub u64);

/// A finished batch as delivered by [`AsyncBatchGenerator::drain_results`].
#[derive(Debug)]
pub struct CompletedBatch {
    pub id: BatchId,
    /// Heights, or the error the dispatcher raised for this batch.
    pub result: Result<HeightBatch, GenerationError>,
    /// Wall time spent generating, in microseconds.
    pub generation_time_us: u64,
}

struct QueuedBatch {
    id: BatchId,
    clusters: Vec<IVec2>,
    cancelled: Arc<AtomicBool>,
}

/// Queue of height batches serviced by background threads.
pub struct AsyncBatchGenerator {
    job_sender: Sender<QueuedBatch>,
    result_receiver: Receiver<CompletedBatch>,
    /// Cancellation flag of every batch not yet drained.
    active: Arc<DashMap<BatchId, Arc<AtomicBool>>>,
    in_flight: Arc<AtomicU64>,
    next_id: AtomicU64,
}

impl AsyncBatchGenerator {
    /// Start `thread_count` job threads feeding `dispatcher`.
    ///
    /// At most `max_queued` batches wait for a thread; completed batches buffer
    /// in a channel of `result_capacity`.
    pub fn new<F>(
        dispatcher: Arc<BatchDispatcher<F>>,
        thread_count: usize,
        max_queued: usize,
        result_capacity: usize,
    ) -> Result<Self, GenerationError>
    where
        F: DensityFunction + 'static,
    {
        let (job_sender, job_receiver) = bounded::<QueuedBatch>(max_queued.max(1));
        let (result_sender, result_receiver) = bounded::<CompletedBatch>(result_capacity.max(1));
        let in_flight = Arc::new(AtomicU64::new(0));

        for worker in 0..thread_count.max(1) {
            let receiver = job_receiver.clone();
            let sender = result_sender.clone();
            let in_flight = Arc::clone(&in_flight);
            let dispatcher = Arc::clone(&dispatcher);

            std::thread::Builder::new()
                .name(format!("strata-batch-{worker}"))
                .spawn(move || {
                    while let Ok(job) = receiver.recv() {
                        if job.cancelled.load(Ordering::Relaxed) {
                            debug!(id = job.id.0, "skipping cancelled batch");
                            in_flight.fetch_sub(1, Ordering::Relaxed);
                            continue;
                        }

                        let start = Instant::now();
                        let result = dispatcher.generate_batch_heights(&job.clusters);
                        let elapsed = start.elapsed().as_micros() as u64;

                        let completed = CompletedBatch {
                            id: job.id,
                            result,
                            generation_time_us: elapsed,
                        };
                        if !deliver(&sender, completed, &job.cancelled) {
                            debug!(id = job.id.0, "dropped result of cancelled batch");
                        }

                        in_flight.fetch_sub(1, Ordering::Relaxed);
                    }
                })
                .map_err(|e| GenerationError::ThreadPool(e.to_string()))?;
        }

        Ok(Self {
            job_sender,
            result_receiver,
            active: Arc::new(DashMap::new()),
            in_flight,
            next_id: AtomicU64::new(0),
        })
    }

    /// Build a generator sized by the `dispatch` config section.
    ///
    /// Two job threads keep the pool busy while one batch is being collected.
    pub fn from_config<F>(
        dispatcher: Arc<BatchDispatcher<F>>,
        config: &DispatchConfig,
    ) -> Result<Self, GenerationError>
    where
        F: DensityFunction + 'static,
    {
        Self::new(
            dispatcher,
            2,
            config.max_queued_batches,
            config.result_capacity,
        )
    }

    /// Queue a batch. Fails with [`GenerationError::QueueFull`] when no slot is free
    /// and [`GenerationError::WorkersStopped`] once the job threads have exited.
    ///
    /// Request validation happens on the worker; its errors come back through
    /// [`CompletedBatch::result`].
    pub fn submit(&self, clusters: Vec<IVec2>) -> Result<BatchId, GenerationError> {
        let id = BatchId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let cancelled = Arc::new(AtomicBool::new(false));
        self.active.insert(id, Arc::clone(&cancelled));
        self.in_flight.fetch_add(1, Ordering::Relaxed);

        let job = QueuedBatch {
            id,
            clusters,
            cancelled,
        };
        match self.job_sender.try_send(job) {
            Ok(()) => {
                debug!(id = id.0, "batch queued");
                Ok(id)
            }
            Err(err) => {
                let in_flight = self.in_flight.fetch_sub(1, Ordering::Relaxed) - 1;
                self.active.remove(&id);
                let err = rejection(&err, in_flight);
                warn!(id = id.0, "batch rejected: {err}");
                Err(err)
            }
        }
    }

    /// Cancel a queued or running batch. No-op once the batch has been drained.
    pub fn cancel(&self, id: BatchId) {
        if let Some((_, cancelled)) = self.active.remove(&id) {
            cancelled.store(true, Ordering::Relaxed);
        }
    }

    /// Collect every batch completed since the last call.
    ///
    /// Completed batches wait in a channel of `result_capacity`. While it is full,
    /// workers stall on delivery and stop taking new jobs until results are
    /// drained or the waiting batch is cancelled.
    pub fn drain_results(&self) -> Vec<CompletedBatch> {
        let mut results = Vec::new();
        while let Ok(batch) = self.result_receiver.try_recv() {
            self.active.remove(&batch.id);
            results.push(batch);
        }
        results
    }

    /// Batches queued or executing.
    pub fn in_flight_count(&self) -> u64 {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Whether `id` has been submitted and neither drained nor cancelled.
    pub fn is_pending(&self, id: BatchId) -> bool {
        self.active.contains_key(&id)
    }
}

/// Send `completed` unless its batch is cancelled first.
///
/// Blocks while the result channel is full, waking every
/// [`RESULT_POLL_INTERVAL`] to re-check `cancelled`. Returns whether the batch
/// was delivered.
fn deliver(
    sender: &Sender<CompletedBatch>,
    mut completed: CompletedBatch,
    cancelled: &AtomicBool,
) -> bool {
    loop {
        if cancelled.load(Ordering::Relaxed) {
            return false;
        }
        match sender.send_timeout(completed, RESULT_POLL_INTERVAL) {
            Ok(()) => return true,
            Err(SendTimeoutError::Timeout(back)) => completed = back,
            Err(SendTimeoutError::Disconnected(_)) => return false,
        }
    }
}

/// Error reported for a batch the job channel refused.
fn rejection<T>(err: &TrySendError<T>, in_flight: u64) -> GenerationError {
    match err {
        TrySendError::Full(_) => GenerationError::QueueFull(in_flight),
        TrySendError::Disconnected(_) => GenerationError::WorkersStopped,
    }
}
