//! Chunked upload primitives: fragment reading, the dispatch queue shared by
//! upload workers, completion accounting, retry policy and progress reporting.

mod chunked;
mod progress;
mod queue;
mod retry;
mod types;

pub use chunked::FragmentReader;
pub use progress::{ByteProgress, NoProgress, ProgressSink};
pub use queue::{CompletionCounter, DispatchQueue, Job};
pub use retry::RetryPolicy;
pub use types::{Fragment, RetryHints, UploadSession};

/// Default fragment size: 4 MiB.
///
/// Used when the service does not negotiate a usable size.
pub const DEFAULT_FRAGMENT_SIZE: usize = 4 * 1024 * 1024;

/// Largest fragment size an upload session may use: 256 MiB.
pub const MAX_FRAGMENT_SIZE: usize = 256 * 1024 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("fragment {index} failed after {attempts} attempts")]
    RetriesExhausted { index: u64, attempts: u32 },

    #[error("dispatch queue closed")]
    Closed,
}
