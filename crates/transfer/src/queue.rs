use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tokio::sync::{Notify, OwnedSemaphorePermit, Semaphore, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::retry::RetryPolicy;
use crate::types::Fragment;
use crate::TransferError;

// ---------------------------------------------------------------------------
// CompletionCounter
// ---------------------------------------------------------------------------

/// Counts fragments that are queued or uploading but not yet acknowledged.
pub struct CompletionCounter {
    in_flight: AtomicUsize,
    acknowledged: AtomicU64,
    zero: Notify,
}

impl Default for CompletionCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionCounter {
    pub fn new() -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            acknowledged: AtomicU64::new(0),
            zero: Notify::new(),
        }
    }

    /// Registers one more unit of outstanding work.
    pub fn add(&self) {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
    }

    /// Marks one unit of work as acknowledged.
    ///
    /// Returns `true` if this call brought the counter to zero. Calls on an
    /// already-zero counter are ignored.
    pub fn done(&self) -> bool {
        let prev = self
            .in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        match prev {
            Ok(prev) => {
                self.acknowledged.fetch_add(1, Ordering::AcqRel);
                if prev == 1 {
                    self.zero.notify_waiters();
                    return true;
                }
                false
            }
            Err(_) => false,
        }
    }

    /// Units of work still outstanding.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Total acknowledgements recorded.
    pub fn acknowledged(&self) -> u64 {
        self.acknowledged.load(Ordering::Acquire)
    }

    /// Resolves once no work is outstanding.
    pub async fn wait_zero(&self) {
        loop {
            let notified = self.zero.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }
}

// ---------------------------------------------------------------------------
// DispatchQueue
// ---------------------------------------------------------------------------

/// A fragment travelling through the queue, with its failed-attempt count.
///
/// The job owns one slot of the queue's capacity until it is dropped, so a
/// requeued fragment never needs a new one.
#[derive(Debug)]
pub struct Job {
    fragment: Fragment,
    failures: u32,
    _slot: OwnedSemaphorePermit,
}

impl Job {
    pub fn fragment(&self) -> &Fragment {
        &self.fragment
    }

    /// Number of failed attempts so far.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Number of the attempt about to be made (1-based).
    pub fn attempt(&self) -> u32 {
        self.failures + 1
    }
}

/// Work queue between the fragment reader and the upload workers.
///
/// At most `capacity` fragments are queued or uploading at once;
/// [`submit`](Self::submit) waits for a free slot. A fragment is held by
/// exactly one worker at a time: it leaves the queue on [`recv`](Self::recv)
/// and only comes back through [`fail`](Self::fail).
/// [`wait_drained`](Self::wait_drained) resolves once every submitted fragment
/// has been [`complete`](Self::complete)d, or when the queue is aborted.
pub struct DispatchQueue {
    tx: mpsc::UnboundedSender<Job>,
    rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Job>>,
    slots: Arc<Semaphore>,
    capacity: usize,
    counter: CompletionCounter,
    policy: RetryPolicy,
    closed: CancellationToken,
    failure: Mutex<Option<TransferError>>,
    submitted: AtomicU64,
}

impl DispatchQueue {
    /// Creates a queue holding at most `capacity` fragments (at least one).
    pub fn new(policy: RetryPolicy, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: tokio::sync::Mutex::new(rx),
            slots: Arc::new(Semaphore::new(capacity)),
            capacity,
            counter: CompletionCounter::new(),
            policy,
            closed: CancellationToken::new(),
            failure: Mutex::new(None),
            submitted: AtomicU64::new(0),
        }
    }

    /// Enqueues a freshly read fragment and counts it as in flight.
    ///
    /// Waits while the queue is full. Fails with [`TransferError::Closed`]
    /// once the queue is closed.
    pub async fn submit(&self, fragment: Fragment) -> Result<(), TransferError> {
        let slot = tokio::select! {
            biased;
            _ = self.closed.cancelled() => return Err(TransferError::Closed),
            slot = Arc::clone(&self.slots).acquire_owned() => {
                slot.map_err(|_| TransferError::Closed)?
            }
        };
        self.counter.add();
        let job = Job {
            fragment,
            failures: 0,
            _slot: slot,
        };
        if self.tx.send(job).is_err() {
            self.counter.done();
            return Err(TransferError::Closed);
        }
        self.submitted.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    /// Takes the next job, waiting while the queue is empty.
    ///
    /// Returns `None` once the queue has been closed.
    pub async fn recv(&self) -> Option<Job> {
        let mut rx = tokio::select! {
            biased;
            _ = self.closed.cancelled() => return None,
            rx = self.rx.lock() => rx,
        };
        tokio::select! {
            biased;
            _ = self.closed.cancelled() => None,
            job = rx.recv() => job,
        }
    }

    /// Records a successful upload of the job's fragment and frees its slot.
    pub fn complete(&self, job: Job) {
        if self.counter.done() {
            debug!(index = job.fragment.index, "last outstanding fragment acknowledged");
        }
    }

    /// Puts a failed job back into the queue according to the retry policy.
    ///
    /// The backoff delay runs on its own task, so the calling worker can take
    /// the next fragment right away. When the attempt budget is spent the
    /// whole queue is aborted and [`TransferError::RetriesExhausted`] is
    /// returned.
    pub fn fail(&self, mut job: Job) -> Result<(), TransferError> {
        job.failures += 1;
        let index = job.fragment.index;
        let attempts = job.failures;

        let Some(delay) = self.policy.delay_after(attempts) else {
            self.abort(TransferError::RetriesExhausted { index, attempts });
            return Err(TransferError::RetriesExhausted { index, attempts });
        };

        debug!(index, attempts, ?delay, "fragment requeued");
        if delay.is_zero() {
            return self.tx.send(job).map_err(|_| TransferError::Closed);
        }

        let tx = self.tx.clone();
        let closed = self.closed.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = closed.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let _ = tx.send(job);
                }
            }
        });
        Ok(())
    }

    /// Stops the queue: pending and future `recv` and `submit` calls return.
    pub fn close(&self) {
        self.closed.cancel();
    }

    /// Closes the queue and records `error` for [`wait_drained`](Self::wait_drained).
    ///
    /// Only the first error is kept.
    pub fn abort(&self, error: TransferError) {
        {
            let mut failure = self.failure.lock().unwrap();
            if failure.is_none() {
                *failure = Some(error);
            }
        }
        self.close();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Waits until every submitted fragment is acknowledged.
    ///
    /// Fails with the abort error if the queue was aborted, or with
    /// [`TransferError::Closed`] if it was closed with work outstanding.
    pub async fn wait_drained(&self) -> Result<(), TransferError> {
        tokio::select! {
            _ = self.counter.wait_zero() => {}
            _ = self.closed.cancelled() => {}
        }
        if let Some(err) = self.failure.lock().unwrap().take() {
            return Err(err);
        }
        if self.counter.in_flight() == 0 {
            Ok(())
        } else {
            Err(TransferError::Closed)
        }
    }

    /// Maximum number of fragments queued or uploading at once.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Fragments submitted so far (first enqueues only).
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Acquire)
    }

    /// Fragments queued or uploading but not yet acknowledged.
    pub fn in_flight(&self) -> usize {
        self.counter.in_flight()
    }

    /// Fragments acknowledged so far.
    pub fn acknowledged(&self) -> u64 {
        self.counter.acknowledged()
    }
}
