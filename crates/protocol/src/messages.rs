use serde::{Deserialize, Serialize};

use crate::constants::{UPLOAD_TEMPLATE, VOD_TYPE};
use crate::types::PartConfig;

// ---------------------------------------------------------------------------
// Request bodies (form-encoded)
// ---------------------------------------------------------------------------

/// Asks the member API for upload parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiateRequest {
    pub file_name: String,
    pub size: u64,
    pub template: String,
}

impl NegotiateRequest {
    pub fn new(file_name: impl Into<String>, size: u64) -> Self {
        Self {
            file_name: file_name.into(),
            size,
            template: UPLOAD_TEMPLATE.into(),
        }
    }
}

/// Tells the member API that every fragment has been delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishRequest {
    pub task_id: String,
}

/// Registers the uploaded blob as a named video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    pub video_key: String,
    pub file_name: String,
    pub vod_type: String,
}

impl CommitRequest {
    pub fn new(task_id: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            video_key: task_id.into(),
            file_name: file_name.into(),
            vod_type: VOD_TYPE.into(),
        }
    }
}

/// Query string of a fragment upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentQuery {
    pub fragment_id: u64,
    pub upload_token: String,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Generic member API result (`result == 0` means success).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResult {
    pub result: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error_msg: String,
}

impl ApiResult {
    pub fn is_success(&self) -> bool {
        self.result == 0
    }

    /// Human-readable reason for a non-success result.
    pub fn reason(&self) -> String {
        if self.error_msg.is_empty() {
            format!("result code {}", self.result)
        } else {
            format!("result code {}: {}", self.result, self.error_msg)
        }
    }
}

/// Response of the negotiate endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiateResponse {
    pub result: i64,
    #[serde(default, rename = "error_msg", skip_serializing_if = "String::is_empty")]
    pub error_msg: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub task_id: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub upload_config: PartConfig,
}

impl NegotiateResponse {
    /// Status part of the response.
    pub fn status(&self) -> ApiResult {
        ApiResult {
            result: self.result,
            error_msg: self.error_msg.clone(),
        }
    }
}

/// Response of the fragment endpoint.
///
/// The media cloud reports a positive `result` on success together with the
/// number of bytes it stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FragmentReceipt {
    pub result: i64,
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub checksum: String,
}

impl FragmentReceipt {
    /// Returns `true` when the receipt confirms `expected_len` bytes.
    pub fn acknowledges(&self, expected_len: usize) -> bool {
        self.result > 0 && self.size == expected_len as u64
    }
}
