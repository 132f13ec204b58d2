//! Data types for the upload flow.

use std::path::PathBuf;
use std::time::Duration;

use mediaup_transfer::RetryHints;

use crate::error::{FailureStage, UploadError};

/// Upload parameters granted by the service for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiated {
    /// Fragment size in bytes (0 if the service sent none).
    pub fragment_size: usize,
    /// Concurrent fragment uploads allowed (0 if the service sent none).
    pub parallelism: usize,
    pub upload_token: String,
    pub task_id: String,
    pub hints: RetryHints,
}

/// Acknowledgement of one stored fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentAck {
    pub index: u64,
    pub size: u64,
}

/// Lifecycle of one file's upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Idle,
    Negotiating,
    Dispatching,
    AwaitingCompletion,
    Finalizing,
    Done,
    Failed(FailureStage),
}

/// A file that went through the whole pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeResult {
    pub file_name: String,
    pub task_id: String,
    pub file_size: u64,
    pub fragments: u64,
    pub elapsed: Duration,
}

/// A file that was abandoned, with the stage it reached.
#[derive(Debug, thiserror::Error)]
#[error("{stage}: {error}")]
pub struct FailedUpload {
    pub stage: FailureStage,
    #[source]
    pub error: UploadError,
}

impl From<UploadError> for FailedUpload {
    fn from(error: UploadError) -> Self {
        Self {
            stage: error.stage(),
            error,
        }
    }
}

/// Per-file result of a batch.
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub result: Result<FinalizeResult, FailedUpload>,
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_upload_takes_stage_from_error() {
        let failed = FailedUpload::from(UploadError::Negotiation("result code 1".into()));
        assert_eq!(failed.stage, FailureStage::Negotiate);
        assert_eq!(
            failed.to_string(),
            "negotiate: negotiation failed: result code 1"
        );
    }
}
