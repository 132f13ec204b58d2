//! mediaup command-line entry point.

mod config;
mod progress;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use mediaup_uploader::{
    Credentials, FailedUpload, FinalizeResult, HttpUploadApi, UploadApi, UploadOrchestrator,
    UploaderConfig,
};
use tracing_subscriber::EnvFilter;

use crate::config::FileConfig;
use crate::progress::BarProgress;

/// Upload media files to the member video service in parallel fragments.
#[derive(Parser, Debug)]
#[command(name = "mediaup")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Your user token (a.k.a. acPasstoken)
    #[arg(long, env = "MEDIAUP_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Your user id (a.k.a. auth_key)
    #[arg(long, env = "MEDIAUP_UID")]
    pub uid: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Config file (defaults to ~/.config/mediaup/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Fragment size in bytes, overriding the server's choice
    #[arg(long)]
    pub fragment_size: Option<usize>,

    /// Concurrent fragment uploads, overriding the server's choice
    #[arg(short, long)]
    pub parallelism: Option<usize>,

    /// Files to upload, one after another
    pub files: Vec<PathBuf>,
}

impl Cli {
    /// Credentials from flags or environment, if both parts are present.
    fn credentials(&self) -> Option<Credentials> {
        let token = self.token.as_deref().unwrap_or_default();
        let uid = self.uid.as_deref().unwrap_or_default();
        let credentials = Credentials::new(token, uid);
        credentials.is_complete().then_some(credentials)
    }

    /// Applies flag overrides on top of the file configuration.
    fn apply(&self, mut config: UploaderConfig) -> UploaderConfig {
        if let Some(size) = self.fragment_size.filter(|&n| n > 0) {
            config.fragment_size = Some(size);
        }
        if let Some(parallel) = self.parallelism.filter(|&n| n > 0) {
            config.parallelism = Some(parallel);
        }
        config
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    tracing::debug!(
        token_present = cli.token.is_some(),
        uid_present = cli.uid.is_some(),
        files = cli.files.len(),
        "arguments parsed"
    );

    let Some(credentials) = cli.credentials() else {
        println!("token or uid is missing");
        println!();
        let _ = Cli::command().print_help();
        std::process::exit(2);
    };

    let file_config = FileConfig::load(cli.config.as_deref())?;
    let config = cli.apply(file_config.into_uploader_config(credentials));

    let rt = tokio::runtime::Runtime::new()?;
    let summary = rt.block_on(run(config, &cli.files))?;
    println!("{summary}");
    Ok(())
}

/// Logs go to stderr; stdout carries the per-file report.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "info,mediaup=debug,mediaup_uploader=debug,mediaup_transfer=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Uploads every file in order and reports each outcome.
async fn run(config: UploaderConfig, files: &[PathBuf]) -> anyhow::Result<Summary> {
    let api: Arc<dyn UploadApi> = Arc::new(HttpUploadApi::new(&config)?);
    let orchestrator = UploadOrchestrator::new(api, &config);
    let mut summary = Summary::default();

    for path in files {
        println!("Local: {}", path.display());
        let bar = Arc::new(BarProgress::new(&display_name(path)));
        let result = orchestrator.upload_file(path, bar.clone()).await;
        if result.is_err() {
            bar.abandon();
        }
        println!("{}", outcome_line(path, &result));
        summary.record(&result);
    }

    Ok(summary)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn outcome_line(path: &Path, result: &Result<FinalizeResult, FailedUpload>) -> String {
    match result {
        Ok(done) => format!("OK: {} (task {})", done.file_name, done.task_id),
        Err(failed) => format!(
            "FAILED [{}]: {}: {}",
            failed.stage,
            path.display(),
            failed.error
        ),
    }
}

/// Batch totals.
#[derive(Debug, Default, PartialEq, Eq)]
struct Summary {
    succeeded: usize,
    failed: usize,
}

impl Summary {
    fn record(&mut self, result: &Result<FinalizeResult, FailedUpload>) {
        match result {
            Ok(_) => self.succeeded += 1,
            Err(_) => self.failed += 1,
        }
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} succeeded, {} failed", self.succeeded, self.failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use mediaup_uploader::{FinalizeStage, UploadError};

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_flags_and_files() {
        let cli = Cli::try_parse_from([
            "mediaup", "--token", "tok", "--uid", "42", "-v", "-p", "4", "a.mp4", "b.mp4",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.files, vec![PathBuf::from("a.mp4"), PathBuf::from("b.mp4")]);
        assert_eq!(cli.credentials(), Some(Credentials::new("tok", "42")));

        let config = cli.apply(UploaderConfig::new(Credentials::new("tok", "42")));
        assert_eq!(config.parallelism, Some(4));
        assert!(config.fragment_size.is_none());
    }

    #[test]
    fn partial_credentials_are_missing() {
        let cli = Cli::try_parse_from(["mediaup", "--token", "tok", "--uid", "", "a.mp4"]).unwrap();
        assert!(cli.credentials().is_none());
    }

    #[test]
    fn flags_override_file_config() {
        let file = FileConfig::parse("fragment_size = 1024\nparallelism = 2\n").unwrap();
        let cli =
            Cli::try_parse_from(["mediaup", "--fragment-size", "4096", "x.bin"]).unwrap();

        let config = cli.apply(file.into_uploader_config(Credentials::new("t", "u")));
        assert_eq!(config.fragment_size, Some(4096));
        assert_eq!(config.parallelism, Some(2));
    }

    #[test]
    fn unknown_flag_is_rejected() {
        assert!(Cli::try_parse_from(["mediaup", "--frobnicate"]).is_err());
    }

    #[test]
    fn report_lines() {
        let path = Path::new("/videos/clip.mp4");
        let ok: Result<FinalizeResult, FailedUpload> = Ok(FinalizeResult {
            file_name: "clip.mp4".into(),
            task_id: "t-1".into(),
            file_size: 10,
            fragments: 1,
            elapsed: Duration::from_secs(1),
        });
        assert_eq!(outcome_line(path, &ok), "OK: clip.mp4 (task t-1)");

        let failed: Result<FinalizeResult, FailedUpload> = Err(FailedUpload::from(
            UploadError::Finalize {
                stage: FinalizeStage::Commit,
                reason: "quota".into(),
            },
        ));
        let line = outcome_line(path, &failed);
        assert!(line.starts_with("FAILED [finalize/commit]: /videos/clip.mp4: "));
        assert!(line.contains("quota"));

        let mut summary = Summary::default();
        summary.record(&ok);
        summary.record(&failed);
        summary.record(&ok);
        assert_eq!(summary.to_string(), "2 succeeded, 1 failed");
    }

    #[test]
    fn display_name_is_base_name() {
        assert_eq!(display_name(Path::new("/a/b/movie.mkv")), "movie.mkv");
    }
}
