use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Receives byte-count progress for one file.
///
/// Implemented by the front end (a terminal progress bar, a test recorder).
pub trait ProgressSink: Send + Sync {
    /// Called once before any bytes are reported.
    fn start(&self, total: u64);

    /// Called with the size of each acknowledged fragment.
    fn advance(&self, bytes: u64);

    /// Called once after the last fragment is acknowledged.
    fn finish(&self);
}

/// Sink that discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn start(&self, _total: u64) {}
    fn advance(&self, _bytes: u64) {}
    fn finish(&self) {}
}

/// Thread-safe byte accumulator shared by the upload workers of one file.
///
/// Forwards every increment to the underlying sink. The running total only
/// grows, and `finish` is forwarded at most once.
pub struct ByteProgress {
    total: u64,
    transferred: AtomicU64,
    finished: AtomicBool,
    sink: Arc<dyn ProgressSink>,
}

impl ByteProgress {
    /// Creates a tracker for `total` bytes and announces it to `sink`.
    pub fn new(total: u64, sink: Arc<dyn ProgressSink>) -> Self {
        sink.start(total);
        Self {
            total,
            transferred: AtomicU64::new(0),
            finished: AtomicBool::new(false),
            sink,
        }
    }

    /// Adds `bytes` to the running total and returns the new total.
    pub fn add(&self, bytes: u64) -> u64 {
        let now = self.transferred.fetch_add(bytes, Ordering::AcqRel) + bytes;
        self.sink.advance(bytes);
        now
    }

    /// Signals completion to the sink.
    pub fn finish(&self) {
        if !self.finished.swap(true, Ordering::AcqRel) {
            self.sink.finish();
        }
    }

    pub fn transferred(&self) -> u64 {
        self.transferred.load(Ordering::Acquire)
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}
