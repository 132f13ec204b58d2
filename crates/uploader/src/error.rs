//! Upload error types.

use std::fmt;
use std::path::PathBuf;

use mediaup_transfer::TransferError;

/// Finalize sub-step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeStage {
    /// Telling the service every fragment has been delivered.
    SignalReady,
    /// Registering the uploaded blob as a named artifact.
    Commit,
}

impl fmt::Display for FinalizeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignalReady => f.write_str("signal ready"),
            Self::Commit => f.write_str("commit"),
        }
    }
}

/// Lifecycle stage at which a file's upload was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Open,
    Negotiate,
    Read,
    Dispatch,
    SignalReady,
    Commit,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::Negotiate => "negotiate",
            Self::Read => "read",
            Self::Dispatch => "dispatch",
            Self::SignalReady => "finalize/signal-ready",
            Self::Commit => "finalize/commit",
        };
        f.write_str(s)
    }
}

/// Errors produced while uploading a file.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("negotiation failed: {0}")]
    Negotiation(String),

    #[error("fragment {index} upload failed: {reason}")]
    Transient { index: u64, reason: String },

    #[error("{stage} failed: {reason}")]
    Finalize { stage: FinalizeStage, reason: String },

    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl UploadError {
    /// The lifecycle stage this error aborts.
    pub fn stage(&self) -> FailureStage {
        match self {
            Self::Open { .. } => FailureStage::Open,
            Self::Negotiation(_) => FailureStage::Negotiate,
            Self::Transient { .. } | Self::Join(_) => FailureStage::Dispatch,
            Self::Finalize {
                stage: FinalizeStage::SignalReady,
                ..
            } => FailureStage::SignalReady,
            Self::Finalize {
                stage: FinalizeStage::Commit,
                ..
            } => FailureStage::Commit,
            Self::Transfer(TransferError::Io(_)) => FailureStage::Read,
            Self::Transfer(_) => FailureStage::Dispatch,
        }
    }
}
