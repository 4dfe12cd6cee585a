//! Expansion of a container into a stream of [`ReferenceVars`].
//!
//! Small containers are expanded on the calling thread. Larger ones are handed to
//! a distributor thread that deals entries round-robin to a set of worker threads;
//! the workers expand entries into a shared output queue. Entry order across
//! workers is not preserved.
//!
//! The stream always ends with exactly one [`StreamItem::EndOfStream`]. Workers
//! count down a shared latch when they exit (normally, on cancellation, or by
//! unwinding), and the worker that closes the latch publishes the end marker.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use rwi_common::{Result, error::Error};
use rwi_workflow::{
    blocking_queue::{self, Receiver, Sender},
    cancel::CancellationToken,
    countdown::Countdown,
};

use crate::{
    config::MaterializeConfig, container::ReferenceContainer, row::ReferenceRow,
    vars::ReferenceVars,
};

/// An element of a [`ReferenceStream`].
#[derive(Debug, Clone)]
pub enum StreamItem {
    Reference(ReferenceVars),
    EndOfStream,
}

impl StreamItem {
    pub fn is_sentinel(&self) -> bool {
        matches!(self, StreamItem::EndOfStream)
    }

    pub fn into_reference(self) -> Option<ReferenceVars> {
        match self {
            StreamItem::Reference(vars) => Some(vars),
            StreamItem::EndOfStream => None,
        }
    }
}

/// Consumer side of a materialization.
///
/// Iterating yields the expanded references and stops at the end marker.
/// Dropping the stream cancels any threads still feeding it.
pub struct ReferenceStream {
    receiver: Receiver<StreamItem>,
    cancel: CancellationToken,
    skipped: Arc<AtomicUsize>,
    ended: bool,
}

impl ReferenceStream {
    /// Next raw item, end marker included. Returns `None` once every producer
    /// has gone and the queue is drained.
    pub fn next_item(&mut self) -> Option<StreamItem> {
        self.receiver.recv().ok()
    }

    /// Asks the producers to stop early. Items already queued remain readable.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Number of entries dropped because they carried the sentinel key.
    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::Acquire)
    }
}

impl Iterator for ReferenceStream {
    type Item = ReferenceVars;

    fn next(&mut self) -> Option<ReferenceVars> {
        if self.ended {
            return None;
        }
        match self.next_item() {
            Some(StreamItem::Reference(vars)) => Some(vars),
            Some(StreamItem::EndOfStream) | None => {
                self.ended = true;
                None
            }
        }
    }
}

impl Drop for ReferenceStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Turns containers into streams of expanded references.
#[derive(Debug)]
pub struct Materializer {
    config: MaterializeConfig,
    threads_spawned: Arc<AtomicUsize>,
}

impl Materializer {
    pub fn new(config: MaterializeConfig) -> Result<Materializer> {
        config
            .validate()
            .map_err(|e| Error::invalid_operation(format!("materialize: {e}")))?;
        Ok(Materializer {
            config,
            threads_spawned: Default::default(),
        })
    }

    pub fn config(&self) -> &MaterializeConfig {
        &self.config
    }

    /// Total number of threads this materializer has started.
    pub fn threads_spawned(&self) -> usize {
        self.threads_spawned.load(Ordering::Acquire)
    }

    pub fn materialize(&self, container: ReferenceContainer) -> Result<ReferenceStream> {
        let (output, receiver) = blocking_queue::channel();
        let stream = ReferenceStream {
            receiver,
            cancel: CancellationToken::new(),
            skipped: Default::default(),
            ended: false,
        };

        let len = container.len();
        if len <= self.config.inline_threshold {
            log::debug!("materializing {len} references of {} inline", container.term_hash());
            for row in &container {
                if let Some(vars) = expand(row, &stream.skipped) {
                    let _ = output.send(StreamItem::Reference(vars));
                }
            }
            let _ = output.send(StreamItem::EndOfStream);
            return Ok(stream);
        }

        let workers = self.config.worker_count(len);
        log::debug!(
            "materializing {len} references of {} with {workers} workers",
            container.term_hash()
        );
        let shared = Shared {
            output,
            cancel: stream.cancel.clone(),
            skipped: stream.skipped.clone(),
            latch: Arc::new(Countdown::new(workers)),
            threads_spawned: self.threads_spawned.clone(),
        };

        self.threads_spawned.fetch_add(1, Ordering::AcqRel);
        thread::Builder::new()
            .name("rwi-distributor".to_string())
            .spawn(move || distribute(container, workers, shared))
            .map_err(|e| {
                self.threads_spawned.fetch_sub(1, Ordering::AcqRel);
                Error::io("spawn distributor thread", e)
            })?;
        Ok(stream)
    }
}

impl Default for Materializer {
    fn default() -> Self {
        Materializer {
            config: MaterializeConfig::default(),
            threads_spawned: Default::default(),
        }
    }
}

/// State shared by the distributor and its workers.
struct Shared {
    output: Sender<StreamItem>,
    cancel: CancellationToken,
    skipped: Arc<AtomicUsize>,
    latch: Arc<Countdown>,
    threads_spawned: Arc<AtomicUsize>,
}

enum WorkerInput {
    Row(ReferenceRow),
    Stop,
}

fn distribute(container: ReferenceContainer, workers: usize, shared: Shared) {
    let mut inputs = Vec::with_capacity(workers);
    for id in 0..workers {
        let (input, queue) = blocking_queue::channel();
        let worker = Worker {
            id,
            input: queue,
            output: shared.output.clone(),
            cancel: shared.cancel.clone(),
            skipped: shared.skipped.clone(),
            _arrival: Arrival {
                latch: shared.latch.clone(),
                output: shared.output.clone(),
            },
        };
        shared.threads_spawned.fetch_add(1, Ordering::AcqRel);
        // On failure the worker is dropped unstarted, which still counts its arrival.
        if let Err(e) = thread::Builder::new()
            .name(format!("rwi-worker-{id}"))
            .spawn(move || worker.run())
        {
            shared.threads_spawned.fetch_sub(1, Ordering::AcqRel);
            log::warn!("failed to spawn materializer worker {id}: {e}");
        }
        inputs.push(input);
    }

    for (i, row) in container.rows().iter().enumerate() {
        if shared.cancel.is_cancelled() {
            log::debug!("materialization cancelled after {i} of {} entries", container.len());
            break;
        }
        // A worker that is gone has already counted its arrival.
        let _ = inputs[i % workers].send(WorkerInput::Row(*row));
    }
    for input in &inputs {
        let _ = input.send(WorkerInput::Stop);
    }
}

struct Worker {
    id: usize,
    input: Receiver<WorkerInput>,
    output: Sender<StreamItem>,
    cancel: CancellationToken,
    skipped: Arc<AtomicUsize>,
    _arrival: Arrival,
}

impl Worker {
    fn run(self) {
        let mut produced = 0usize;
        while !self.cancel.is_cancelled() {
            let row = match self.input.recv() {
                Ok(WorkerInput::Row(row)) => row,
                Ok(WorkerInput::Stop) | Err(_) => break,
            };
            let Some(vars) = expand(&row, &self.skipped) else {
                continue;
            };
            if self.output.send(StreamItem::Reference(vars)).is_err() {
                break;
            }
            produced += 1;
        }
        log::trace!("materializer worker {} produced {produced} references", self.id);
    }
}

/// Counts one worker exit on drop. The exit that closes the latch ends the stream.
struct Arrival {
    latch: Arc<Countdown>,
    output: Sender<StreamItem>,
}

impl Drop for Arrival {
    fn drop(&mut self) {
        if self.latch.arrive() {
            let _ = self.output.send(StreamItem::EndOfStream);
        }
    }
}

fn expand(row: &ReferenceRow, skipped: &AtomicUsize) -> Option<ReferenceVars> {
    if row.is_sentinel() {
        skipped.fetch_add(1, Ordering::AcqRel);
        log::warn!("skipping reference with sentinel key");
        return None;
    }
    Some(ReferenceVars::from(row))
}
