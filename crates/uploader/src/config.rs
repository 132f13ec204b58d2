//! Explicit configuration handed to the upload client and orchestrator.

use std::fmt;
use std::time::Duration;

use mediaup_protocol::constants;
use mediaup_transfer::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Member account credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// User token (`acPasstoken`).
    pub token: String,
    /// User identifier (`auth_key`).
    pub uid: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>, uid: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            uid: uid.into(),
        }
    }

    /// Both parts are present.
    pub fn is_complete(&self) -> bool {
        !self.token.is_empty() && !self.uid.is_empty()
    }

    /// Cookie header value carrying the session credentials.
    pub fn cookie(&self) -> String {
        format!("acPasstoken={}; auth_key={}; ", self.token, self.uid)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("uid", &self.uid)
            .finish()
    }
}

/// Remote endpoints of the upload API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub negotiate: String,
    pub fragment: String,
    pub finish: String,
    pub commit: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            negotiate: constants::NEGOTIATE_URL.into(),
            fragment: constants::FRAGMENT_URL.into(),
            finish: constants::FINISH_URL.into(),
            commit: constants::COMMIT_URL.into(),
        }
    }
}

impl Endpoints {
    /// All four endpoints under one base URL (`/negotiate`, `/fragment`,
    /// `/finish`, `/commit`).
    pub fn under(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            negotiate: format!("{base}/negotiate"),
            fragment: format!("{base}/fragment"),
            finish: format!("{base}/finish"),
            commit: format!("{base}/commit"),
        }
    }
}

/// Everything the upload pipeline needs, passed at construction.
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    pub credentials: Credentials,
    pub endpoints: Endpoints,
    /// Timeout applied to every remote call.
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Overrides the negotiated fragment size.
    pub fragment_size: Option<usize>,
    /// Overrides the negotiated worker count.
    pub parallelism: Option<usize>,
}

impl UploaderConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            endpoints: Endpoints::default(),
            timeout: constants::REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
            fragment_size: None,
            parallelism: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_format() {
        let c = Credentials::new("tok", "42");
        assert_eq!(c.cookie(), "acPasstoken=tok; auth_key=42; ");
        assert!(c.is_complete());
        assert!(!Credentials::new("", "42").is_complete());
    }

    #[test]
    fn debug_redacts_token() {
        let c = Credentials::new("very-secret", "42");
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("very-secret"));
        assert!(dbg.contains("42"));
    }

    #[test]
    fn endpoints_under_base() {
        let e = Endpoints::under("http://127.0.0.1:8080/");
        assert_eq!(e.negotiate, "http://127.0.0.1:8080/negotiate");
        assert_eq!(e.commit, "http://127.0.0.1:8080/commit");
    }

    #[test]
    fn default_config() {
        let cfg = UploaderConfig::new(Credentials::new("t", "u"));
        assert_eq!(cfg.timeout, Duration::from_secs(10));
        assert_eq!(cfg.endpoints, Endpoints::default());
        assert!(cfg.retry.max_attempts.is_none());
        assert!(cfg.fragment_size.is_none());
    }
}
