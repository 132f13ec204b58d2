//! Media upload flow: negotiate, concurrent fragment dispatch, finalize.
//!
//! This crate implements the **business logic** for pushing local files to
//! the remote media service. The network seam is the [`UploadApi`] trait;
//! [`HttpUploadApi`] is the production implementation and tests plug in
//! in-memory ones.
//!
//! # Pipeline
//!
//! 1. **Negotiate** the upload session for the file
//! 2. **Read** fixed-size fragments sequentially on a blocking thread
//! 3. **Dispatch** them to a bounded worker pool, requeueing failures
//! 4. **Await** acknowledgement of every fragment
//! 5. **Finalize**: signal ready, then commit under the file's base name

pub mod api;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod types;

// Re-export primary types for convenience.
pub use api::{ApiFuture, UploadApi};
pub use config::{Credentials, Endpoints, UploaderConfig};
pub use dispatch::{DispatchStats, Dispatcher};
pub use error::{FailureStage, FinalizeStage, UploadError};
pub use http::{ClientError, HttpUploadApi};
pub use orchestrator::UploadOrchestrator;
pub use types::{
    FailedUpload, FileOutcome, FinalizeResult, FragmentAck, Negotiated, UploadStage,
};
