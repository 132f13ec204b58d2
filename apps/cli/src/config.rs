//! Optional on-disk configuration.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/mediaup/config.toml`
//! - Windows: `%APPDATA%/mediaup/config.toml`
//!
//! Every key is optional; absent keys keep the built-in defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use mediaup_transfer::RetryPolicy;
use mediaup_uploader::{Credentials, Endpoints, UploaderConfig};
use serde::{Deserialize, Serialize};

/// Settings read from the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Timeout for every remote call, in seconds.
    pub timeout_secs: Option<u64>,

    /// Fragment size in bytes, overriding the negotiated one.
    pub fragment_size: Option<usize>,

    /// Concurrent fragment uploads, overriding the negotiated count.
    pub parallelism: Option<usize>,

    pub retry: RetrySection,

    pub endpoints: Endpoints,
}

/// `[retry]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    /// Attempts per fragment; 0 or absent retries forever.
    pub max_attempts: Option<u32>,
    pub initial_backoff_ms: Option<u64>,
    pub max_backoff_ms: Option<u64>,
}

impl RetrySection {
    fn policy(&self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        let initial = self
            .initial_backoff_ms
            .map_or(defaults.initial_backoff, Duration::from_millis);
        let max = self
            .max_backoff_ms
            .map_or(defaults.max_backoff, Duration::from_millis);
        defaults
            .with_backoff(initial, max)
            .with_max_attempts(self.max_attempts.unwrap_or(0))
    }
}

impl FileConfig {
    /// Loads `explicit` if given, else the default location when it exists.
    ///
    /// An explicitly named file must exist; the default one is optional.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Self::read(path);
        }
        match config_path() {
            Some(path) if path.is_file() => Self::read(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn read(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Layers these settings over the uploader defaults.
    pub fn into_uploader_config(self, credentials: Credentials) -> UploaderConfig {
        let mut config = UploaderConfig::new(credentials);
        config.endpoints = self.endpoints;
        if let Some(secs) = self.timeout_secs.filter(|&s| s > 0) {
            config.timeout = Duration::from_secs(secs);
        }
        config.retry = self.retry.policy();
        config.fragment_size = self.fragment_size.filter(|&n| n > 0);
        config.parallelism = self.parallelism.filter(|&n| n > 0);
        config
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|appdata| {
            PathBuf::from(appdata)
                .join("mediaup")
                .join("config.toml")
        })
    }

    #[cfg(not(target_os = "windows"))]
    {
        std::env::var_os("HOME").map(|home| {
            PathBuf::from(home)
                .join(".config")
                .join("mediaup")
                .join("config.toml")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> Credentials {
        Credentials::new("tok", "42")
    }

    #[test]
    fn empty_file_keeps_defaults() {
        let config = FileConfig::parse("").unwrap();
        assert_eq!(config, FileConfig::default());

        let uploader = config.into_uploader_config(creds());
        assert_eq!(uploader.timeout, Duration::from_secs(10));
        assert_eq!(uploader.retry, RetryPolicy::default());
        assert_eq!(uploader.endpoints, Endpoints::default());
        assert!(uploader.fragment_size.is_none());
        assert!(uploader.parallelism.is_none());
    }

    #[test]
    fn full_file() {
        let config = FileConfig::parse(
            r#"
            timeout_secs = 30
            fragment_size = 1048576
            parallelism = 8

            [retry]
            max_attempts = 5
            initial_backoff_ms = 100
            max_backoff_ms = 2000

            [endpoints]
            negotiate = "http://127.0.0.1:9000/negotiate"
            "#,
        )
        .unwrap();

        let uploader = config.into_uploader_config(creds());
        assert_eq!(uploader.timeout, Duration::from_secs(30));
        assert_eq!(uploader.fragment_size, Some(1_048_576));
        assert_eq!(uploader.parallelism, Some(8));
        assert_eq!(uploader.retry.max_attempts, Some(5));
        assert_eq!(uploader.retry.initial_backoff, Duration::from_millis(100));
        assert_eq!(uploader.retry.max_backoff, Duration::from_secs(2));
        assert_eq!(uploader.endpoints.negotiate, "http://127.0.0.1:9000/negotiate");
        // Unnamed endpoints keep the production URL.
        assert_eq!(uploader.endpoints.commit, Endpoints::default().commit);
    }

    #[test]
    fn zero_values_mean_unset() {
        let config = FileConfig::parse(
            r#"
            timeout_secs = 0
            fragment_size = 0
            parallelism = 0

            [retry]
            max_attempts = 0
            "#,
        )
        .unwrap();

        let uploader = config.into_uploader_config(creds());
        assert_eq!(uploader.timeout, Duration::from_secs(10));
        assert!(uploader.fragment_size.is_none());
        assert!(uploader.parallelism.is_none());
        assert!(uploader.retry.max_attempts.is_none());
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(FileConfig::parse("timeout_secs = \"soon\"").is_err());
    }

    #[test]
    fn explicit_path_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mediaup.toml");
        std::fs::write(&path, "parallelism = 2\n").unwrap();

        let config = FileConfig::load(Some(&path)).unwrap();
        assert_eq!(config.parallelism, Some(2));
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }
}
