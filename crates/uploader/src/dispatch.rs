//! Fixed-size pool of fragment upload workers.
//!
//! Workers pull jobs from the shared [`DispatchQueue`], upload them through
//! the [`UploadApi`], and hand failures back to the queue, which decides
//! whether and when the fragment is retried. Upload errors never leave the
//! pool; only an exhausted retry budget aborts the queue.

use std::sync::Arc;

use mediaup_transfer::{ByteProgress, DispatchQueue, UploadSession};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::api::UploadApi;

/// Counters collected by the workers of one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Successful fragment uploads.
    pub uploaded: u64,
    /// Failed attempts that were handed back to the queue.
    pub failed_attempts: u64,
}

impl std::ops::AddAssign for DispatchStats {
    fn add_assign(&mut self, rhs: Self) {
        self.uploaded += rhs.uploaded;
        self.failed_attempts += rhs.failed_attempts;
    }
}

/// Running worker pool for one upload session.
pub struct Dispatcher {
    queue: Arc<DispatchQueue>,
    workers: Vec<JoinHandle<DispatchStats>>,
}

impl Dispatcher {
    /// Spawns `session.parallelism` workers (at least one) draining `queue`.
    pub fn start(
        api: Arc<dyn UploadApi>,
        session: Arc<UploadSession>,
        queue: Arc<DispatchQueue>,
        progress: Arc<ByteProgress>,
    ) -> Self {
        let count = session.parallelism.max(1);
        let workers = (0..count)
            .map(|worker| {
                tokio::spawn(run_worker(
                    worker,
                    Arc::clone(&api),
                    Arc::clone(&session),
                    Arc::clone(&queue),
                    Arc::clone(&progress),
                ))
            })
            .collect();
        debug!(workers = count, "dispatcher started");
        Self { queue, workers }
    }

    /// Number of workers in the pool.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Closes the queue and waits for every worker to exit.
    pub async fn shutdown(self) -> DispatchStats {
        self.queue.close();
        let mut stats = DispatchStats::default();
        for handle in self.workers {
            match handle.await {
                Ok(worker_stats) => stats += worker_stats,
                Err(e) => error!(error = %e, "upload worker panicked"),
            }
        }
        stats
    }
}

async fn run_worker(
    worker: usize,
    api: Arc<dyn UploadApi>,
    session: Arc<UploadSession>,
    queue: Arc<DispatchQueue>,
    progress: Arc<ByteProgress>,
) -> DispatchStats {
    let mut stats = DispatchStats::default();

    while let Some(job) = queue.recv().await {
        let index = job.fragment().index;
        let len = job.fragment().len() as u64;
        let attempt = job.attempt();

        match api.upload_fragment(&session, job.fragment()).await {
            Ok(ack) => {
                debug!(worker, index, attempt, size = ack.size, "fragment uploaded");
                stats.uploaded += 1;
                progress.add(len);
                queue.complete(job);
            }
            Err(e) => {
                warn!(worker, index, attempt, error = %e, "fragment upload failed, requeueing");
                stats.failed_attempts += 1;
                if let Err(e) = queue.fail(job) {
                    error!(worker, index, error = %e, "giving up on fragment");
                    break;
                }
            }
        }
    }

    stats
}
