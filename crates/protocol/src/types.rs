use serde::{Deserialize, Serialize};

/// Upload parameters handed out by the negotiate endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartConfig {
    /// Fragment size in bytes.
    #[serde(default)]
    pub part_size: i64,
    /// Number of fragments the service accepts concurrently.
    #[serde(default)]
    pub parallel: i32,
    /// Suggested retry count per fragment (advisory).
    #[serde(default)]
    pub retry_count: i32,
    /// Suggested retry window in seconds (advisory).
    #[serde(default)]
    pub retry_duration_seconds: i32,
}
