//! The remote upload API boundary.
//!
//! `UploadApi` is implemented by [`HttpUploadApi`](crate::HttpUploadApi) for
//! the real service. Keeping the flow behind a trait makes the orchestrator
//! and dispatcher testable with in-memory mocks.

use std::future::Future;
use std::pin::Pin;

use mediaup_transfer::{Fragment, UploadSession};

use crate::error::UploadError;
use crate::types::{FragmentAck, Negotiated};

/// Boxed future returned by [`UploadApi`] operations.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, UploadError>> + Send + 'a>>;

/// The four remote operations of a chunked upload.
///
/// Implementations hold no per-upload state; everything a call needs is in
/// its arguments.
pub trait UploadApi: Send + Sync {
    /// Requests fragment size, parallelism, an upload token and a task id.
    ///
    /// Fails with [`UploadError::Negotiation`].
    fn negotiate<'a>(&'a self, file_name: &'a str, file_size: u64) -> ApiFuture<'a, Negotiated>;

    /// Sends one fragment. Succeeds only when the service confirms it stored
    /// exactly `fragment.len()` bytes.
    ///
    /// Fails with [`UploadError::Transient`]; callers retry.
    fn upload_fragment<'a>(
        &'a self,
        session: &'a UploadSession,
        fragment: &'a Fragment,
    ) -> ApiFuture<'a, FragmentAck>;

    /// Tells the service every fragment has been delivered.
    ///
    /// Fails with [`UploadError::Finalize`] at the signal-ready stage.
    fn signal_ready<'a>(&'a self, session: &'a UploadSession) -> ApiFuture<'a, ()>;

    /// Registers the uploaded blob under `file_name`. Must not be called
    /// twice for the same session.
    ///
    /// Fails with [`UploadError::Finalize`] at the commit stage.
    fn commit<'a>(&'a self, session: &'a UploadSession, file_name: &'a str) -> ApiFuture<'a, ()>;
}
