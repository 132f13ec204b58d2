use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;

/// A contiguous byte range of the source file.
///
/// Content is immutable once read; a retried fragment is re-sent exactly as
/// it was first produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Zero-based sequence index.
    pub index: u64,
    /// Byte offset within the file (`index * fragment_size`).
    pub offset: u64,
    /// Raw fragment bytes.
    pub data: Bytes,
}

impl Fragment {
    /// Length of this fragment in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Offset one past the last byte of this fragment.
    pub fn end(&self) -> u64 {
        self.offset + self.data.len() as u64
    }

    /// `Content-Range` value for this fragment within a file of `total` bytes.
    pub fn content_range(&self, total: u64) -> String {
        let last = self.end().saturating_sub(1);
        format!("bytes {}-{}/{}", self.offset, last, total)
    }
}

/// Retry hints returned by the service during negotiation.
///
/// Advisory only: the local retry policy decides what actually happens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryHints {
    pub retry_count: u32,
    pub retry_window: Duration,
}

/// The negotiated parameters governing one file's upload.
///
/// Created once after negotiation and shared read-only between the
/// orchestrator and the upload workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    /// Local source path.
    pub path: PathBuf,
    /// Name the artifact is registered under.
    pub file_name: String,
    /// Total file size in bytes.
    pub file_size: u64,
    /// Negotiated fragment size in bytes.
    pub fragment_size: usize,
    /// Number of concurrent upload workers.
    pub parallelism: usize,
    /// Opaque token authorizing fragment uploads.
    pub upload_token: String,
    /// Opaque task identifier used by the finalize steps.
    pub task_id: String,
    pub hints: RetryHints,
}

impl UploadSession {
    /// Number of fragments the file splits into.
    pub fn fragment_count(&self) -> u64 {
        if self.fragment_size == 0 {
            return 0;
        }
        self.file_size.div_ceil(self.fragment_size as u64)
    }
}
