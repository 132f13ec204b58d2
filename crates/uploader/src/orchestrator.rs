//! Per-file upload lifecycle.
//!
//! Drives one file through negotiate, dispatch, completion and finalize.
//! Batches are processed strictly one file at a time; a failed file is
//! reported and the batch moves on.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use mediaup_transfer::{
    ByteProgress, DispatchQueue, FragmentReader, MAX_FRAGMENT_SIZE, NoProgress, ProgressSink,
    RetryPolicy, TransferError, UploadSession,
};
use tracing::{Instrument, debug, error, info, info_span};

use crate::api::UploadApi;
use crate::config::UploaderConfig;
use crate::dispatch::Dispatcher;
use crate::error::UploadError;
use crate::types::{FailedUpload, FileOutcome, FinalizeResult, Negotiated, UploadStage};

/// Queue slots per upload worker; bounds how far the reader runs ahead.
const SLOTS_PER_WORKER: usize = 2;

/// Uploads files one after another through an [`UploadApi`].
pub struct UploadOrchestrator {
    api: Arc<dyn UploadApi>,
    retry: RetryPolicy,
    fragment_size: Option<usize>,
    parallelism: Option<usize>,
}

impl UploadOrchestrator {
    /// Creates an orchestrator using the retry and sizing settings of `config`.
    pub fn new(api: Arc<dyn UploadApi>, config: &UploaderConfig) -> Self {
        Self {
            api,
            retry: config.retry.clone(),
            fragment_size: config.fragment_size,
            parallelism: config.parallelism,
        }
    }

    /// Uploads every path in order, without progress reporting.
    ///
    /// Returns one outcome per path, in input order.
    pub async fn upload_all<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<FileOutcome> {
        let mut outcomes = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let result = self.upload_file(path, Arc::new(NoProgress)).await;
            outcomes.push(FileOutcome {
                path: path.to_path_buf(),
                result,
            });
        }
        outcomes
    }

    /// Runs the full lifecycle for one file.
    pub async fn upload_file(
        &self,
        path: &Path,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<FinalizeResult, FailedUpload> {
        let span = info_span!("upload", file = %path.display());
        let mut run = FileRun {
            stage: UploadStage::Idle,
        };

        match self.run(&mut run, path, sink).instrument(span.clone()).await {
            Ok(result) => {
                run.enter(UploadStage::Done);
                Ok(result)
            }
            Err(e) => {
                let failed = FailedUpload::from(e);
                span.in_scope(|| {
                    error!(
                        stage = %failed.stage,
                        reached = ?run.stage,
                        error = %failed.error,
                        "upload failed"
                    );
                });
                run.enter(UploadStage::Failed(failed.stage));
                Err(failed)
            }
        }
    }

    async fn run(
        &self,
        run: &mut FileRun,
        path: &Path,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<FinalizeResult, UploadError> {
        let started = Instant::now();
        let open_err = |source| UploadError::Open {
            path: path.to_path_buf(),
            source,
        };

        let metadata = tokio::fs::metadata(path).await.map_err(open_err)?;
        if !metadata.is_file() {
            return Err(open_err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "not a regular file",
            )));
        }
        let file_size = metadata.len();
        let file_name = artifact_name(path);

        // Negotiate.
        run.enter(UploadStage::Negotiating);
        let negotiated = self.api.negotiate(&file_name, file_size).await?;
        let session = Arc::new(self.build_session(path, file_name, file_size, negotiated)?);
        info!(
            size = session.file_size,
            fragment_size = session.fragment_size,
            fragments = session.fragment_count(),
            parallelism = session.parallelism,
            task_id = %session.task_id,
            "session negotiated"
        );
        debug!(
            retry_count = session.hints.retry_count,
            retry_window = ?session.hints.retry_window,
            "server retry hints"
        );

        // Read & dispatch.
        run.enter(UploadStage::Dispatching);
        let reader = FragmentReader::open(&session.path, session.fragment_size).map_err(|e| {
            match e {
                TransferError::Io(source) => open_err(source),
                other => other.into(),
            }
        })?;

        self.deliver(run, session, reader, sink, started).await
    }

    /// Dispatches every fragment of `reader`, waits until all are
    /// acknowledged, then finalizes the session.
    async fn deliver<R>(
        &self,
        run: &mut FileRun,
        session: Arc<UploadSession>,
        reader: FragmentReader<R>,
        sink: Arc<dyn ProgressSink>,
        started: Instant,
    ) -> Result<FinalizeResult, UploadError>
    where
        R: Read + Send + 'static,
    {
        let queue = Arc::new(DispatchQueue::new(
            self.retry.clone(),
            session.parallelism.saturating_mul(SLOTS_PER_WORKER),
        ));
        debug!(slots = queue.capacity(), "dispatch queue ready");
        let progress = Arc::new(ByteProgress::new(session.file_size, sink));
        let dispatcher = Dispatcher::start(
            Arc::clone(&self.api),
            Arc::clone(&session),
            Arc::clone(&queue),
            Arc::clone(&progress),
        );

        let produced = match feed(reader, Arc::clone(&queue)).await {
            Ok(count) => count,
            Err(e) => {
                // A closed queue means the dispatcher aborted; report its cause.
                let err = if matches!(e, UploadError::Transfer(TransferError::Closed)) {
                    queue
                        .wait_drained()
                        .await
                        .err()
                        .map(UploadError::from)
                        .unwrap_or(e)
                } else {
                    e
                };
                queue.close();
                dispatcher.shutdown().await;
                return Err(err);
            }
        };
        debug!(fragments = produced, "all fragments enqueued");

        // Await completion.
        run.enter(UploadStage::AwaitingCompletion);
        let drained = queue.wait_drained().await;
        let stats = dispatcher.shutdown().await;
        drained?;
        progress.finish();
        debug!(
            uploaded = stats.uploaded,
            failed_attempts = stats.failed_attempts,
            bytes = progress.transferred(),
            "all fragments acknowledged"
        );

        // Finalize.
        run.enter(UploadStage::Finalizing);
        self.api.signal_ready(&session).await?;
        self.api.commit(&session, &session.file_name).await?;

        let elapsed = started.elapsed();
        info!(task_id = %session.task_id, ?elapsed, "upload finalized");

        Ok(FinalizeResult {
            file_name: session.file_name.clone(),
            task_id: session.task_id.clone(),
            file_size: session.file_size,
            fragments: produced,
            elapsed,
        })
    }

    /// Validates the negotiated grant and applies local overrides.
    fn build_session(
        &self,
        path: &Path,
        file_name: String,
        file_size: u64,
        negotiated: Negotiated,
    ) -> Result<UploadSession, UploadError> {
        let fragment_size = self
            .fragment_size
            .filter(|&n| n > 0)
            .unwrap_or(negotiated.fragment_size);
        if fragment_size == 0 {
            return Err(UploadError::Negotiation("no usable fragment size".into()));
        }
        if fragment_size > MAX_FRAGMENT_SIZE {
            return Err(UploadError::Negotiation(format!(
                "fragment size {fragment_size} exceeds the {MAX_FRAGMENT_SIZE} byte limit"
            )));
        }

        let parallelism = self
            .parallelism
            .filter(|&n| n > 0)
            .unwrap_or(negotiated.parallelism);
        if parallelism == 0 {
            return Err(UploadError::Negotiation("no usable parallelism".into()));
        }

        if negotiated.upload_token.is_empty() || negotiated.task_id.is_empty() {
            return Err(UploadError::Negotiation(
                "response is missing the upload token or task id".into(),
            ));
        }

        Ok(UploadSession {
            path: path.to_path_buf(),
            file_name,
            file_size,
            fragment_size,
            parallelism,
            upload_token: negotiated.upload_token,
            task_id: negotiated.task_id,
            hints: negotiated.hints,
        })
    }
}

/// Stage tracking for one file.
struct FileRun {
    stage: UploadStage,
}

impl FileRun {
    fn enter(&mut self, stage: UploadStage) {
        debug!(from = ?self.stage, to = ?stage, "stage transition");
        self.stage = stage;
    }
}

/// Reads fragments one at a time on the blocking pool and submits each.
///
/// The reader keeps exclusive access to the file; workers only ever see the
/// fragments it produces. Submission waits for a free queue slot, so at most
/// the queue's capacity plus the fragment being read are held in memory.
async fn feed<R>(
    mut reader: FragmentReader<R>,
    queue: Arc<DispatchQueue>,
) -> Result<u64, UploadError>
where
    R: Read + Send + 'static,
{
    let mut produced = 0;
    loop {
        let (returned, next) = tokio::task::spawn_blocking(move || {
            let next = reader.next_fragment();
            (reader, next)
        })
        .await?;
        reader = returned;

        let Some(fragment) = next? else {
            break;
        };
        queue.submit(fragment).await?;
        produced += 1;
    }
    Ok(produced)
}

/// Name the artifact is registered under: the path's final component.
fn artifact_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
