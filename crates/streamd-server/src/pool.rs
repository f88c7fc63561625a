use std::sync::Mutex;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Sender, TrySendError};
use thiserror::Error;
use tracing::debug;

use crate::config::clamp_threads;

/// Why a submission was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("worker pool is full")]
    Full,

    #[error("worker pool is shut down")]
    ShutDown,
}

pub type Job = Box<dyn FnOnce() + Send + 'static>;

struct Inner {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

/// Fixed-capacity worker pool backing the HTTP request path.
///
/// The queue is a rendezvous channel: a submission succeeds only while a
/// worker is free to take it, so the pool's capacity equals its worker
/// count and overflow fails immediately instead of queueing unboundedly.
/// Shutdown stops accepting work, lets in-flight jobs finish, and joins
/// every worker; it is idempotent.
pub struct WorkerPool {
    inner: Mutex<Inner>,
    worker_count: usize,
}

impl WorkerPool {
    /// Spawn `workers` OS threads (`<= 0` clamps to the bounded default).
    pub fn new(workers: i64) -> Self {
        let worker_count = clamp_threads(workers);
        let (sender, receiver) = bounded::<Job>(0);
        let workers = (0..worker_count)
            .map(|index| {
                let receiver = receiver.clone();
                thread::Builder::new()
                    .name(format!("streamd-worker-{index}"))
                    .spawn(move || {
                        while let Ok(job) = receiver.recv() {
                            job();
                        }
                    })
                    .expect("worker thread spawn failed")
            })
            .collect();
        debug!(workers = worker_count, "worker pool started");
        Self {
            inner: Mutex::new(Inner {
                sender: Some(sender),
                workers,
            }),
            worker_count,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Hand a job to a free worker, failing immediately when none is.
    pub fn submit(&self, job: Job) -> Result<(), PoolError> {
        let inner = self.inner.lock().expect("lock poisoned");
        let sender = inner.sender.as_ref().ok_or(PoolError::ShutDown)?;
        match sender.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(PoolError::Full),
            Err(TrySendError::Disconnected(_)) => Err(PoolError::ShutDown),
        }
    }

    /// Stop accepting work, wait for running jobs, join the workers.
    pub fn shutdown(&self) {
        let (sender, workers) = {
            let mut inner = self.inner.lock().expect("lock poisoned");
            (inner.sender.take(), std::mem::take(&mut inner.workers))
        };
        drop(sender);
        for worker in workers {
            let _ = worker.join();
        }
        debug!("worker pool drained");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
