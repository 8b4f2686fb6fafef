//! Sequential execution of a transfer queue.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use super::progress::ProgressReporter;
use super::task::{TransferQueue, TransferStatus, TransferTask};
use crate::error::{ErrorKind, SyncError};
use crate::session::Session;

/// What happens when a single transfer fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// The first failure aborts the run.
    #[default]
    FailFast,
    /// Failed fetches and writes are recorded and the run moves on.
    ContinueOnError,
}

/// Result of one task.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    /// Subproduct name of the task.
    pub name: String,
    /// File the task wrote or would have written.
    pub destination: PathBuf,
    /// Terminal status.
    pub status: TransferStatus,
    /// Bytes written during this run.
    pub bytes_transferred: u64,
    /// Failure class and message when `status` is `Failed`.
    pub error: Option<(ErrorKind, String)>,
}

/// Tallies of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferSummary {
    /// Files fetched and written.
    pub downloaded: usize,
    /// Files already present with the expected size.
    pub skipped: usize,
    /// Tasks that failed under [`ErrorPolicy::ContinueOnError`].
    pub failed: usize,
    /// Total bytes written.
    pub bytes: u64,
}

impl TransferSummary {
    /// Counts outcomes by status.
    #[must_use]
    pub fn from_outcomes(outcomes: &[TransferOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut acc, outcome| {
            match outcome.status {
                TransferStatus::Done => acc.downloaded += 1,
                TransferStatus::Skipped => acc.skipped += 1,
                TransferStatus::Failed => acc.failed += 1,
                _ => {}
            }
            acc.bytes = acc.bytes.saturating_add(outcome.bytes_transferred);
            acc
        })
    }
}

/// Drains a [`TransferQueue`] one task at a time.
pub struct Transferrer<'a> {
    session: &'a Session,
    progress: &'a dyn ProgressReporter,
    policy: ErrorPolicy,
}

impl<'a> Transferrer<'a> {
    /// Creates a fail-fast transferrer.
    #[must_use]
    pub fn new(session: &'a Session, progress: &'a dyn ProgressReporter) -> Self {
        Self {
            session,
            progress,
            policy: ErrorPolicy::FailFast,
        }
    }

    /// Sets the error policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Runs every task in queue order.
    ///
    /// A destination that already exists with exactly the expected size is
    /// skipped without a request. Anything else is fetched and written from
    /// the start.
    ///
    /// # Errors
    ///
    /// A destination stat failure other than "not found" is always returned.
    /// Fetch and write failures are returned under [`ErrorPolicy::FailFast`]
    /// and recorded in the outcome otherwise.
    #[instrument(skip_all, fields(tasks = queue.len(), policy = ?self.policy))]
    pub async fn run(&self, queue: &mut TransferQueue) -> Result<Vec<TransferOutcome>, SyncError> {
        let mut outcomes = Vec::with_capacity(queue.len());

        for task in queue.tasks_mut() {
            let destination = task.destination();
            task.reset_progress();

            if already_present(task, &destination).await? {
                task.set_status(TransferStatus::Skipped);
                info!(path = %destination.display(), "already downloaded, skipping");
                outcomes.push(outcome(task, destination, None));
                continue;
            }

            info!(
                url = %task.url,
                path = %destination.display(),
                status = %task.status(),
                "downloading"
            );
            match self.transfer(task, &destination).await {
                Ok(()) => {
                    task.set_status(TransferStatus::Done);
                    info!(
                        path = %destination.display(),
                        bytes = task.bytes_transferred(),
                        "download complete"
                    );
                    outcomes.push(outcome(task, destination, None));
                }
                Err(error) => {
                    task.set_status(TransferStatus::Failed);
                    if self.policy == ErrorPolicy::FailFast {
                        return Err(error);
                    }
                    warn!(path = %destination.display(), error = %error, "download failed, continuing");
                    let detail = (error.kind(), error.to_string());
                    outcomes.push(outcome(task, destination, Some(detail)));
                }
            }
        }

        Ok(outcomes)
    }

    async fn transfer(&self, task: &mut TransferTask, destination: &Path) -> Result<(), SyncError> {
        let response = self.session.fetch(&task.url).await?;
        let total = response.content_length();
        if total.is_none() {
            debug!(url = %task.url, "no content length, progress shows bytes only");
        }

        let mut file = File::create(destination)
            .await
            .map_err(|e| SyncError::io(destination, e))?;
        task.set_status(TransferStatus::Downloading);

        let label = destination
            .file_name()
            .map_or_else(|| task.name.clone(), |n| n.to_string_lossy().into_owned());
        self.progress.start(&label, total);
        let result = self.stream_body(task, &mut file, response, destination).await;
        self.progress.finish();
        drop(file);

        if result.is_err() {
            debug!(path = %destination.display(), "removing partial file");
            let _ = tokio::fs::remove_file(destination).await;
        }
        result
    }

    async fn stream_body(
        &self,
        task: &mut TransferTask,
        file: &mut File,
        response: reqwest::Response,
        destination: &Path,
    ) -> Result<(), SyncError> {
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| SyncError::network(task.url.as_str(), e))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| SyncError::io(destination, e))?;
            let len = chunk.len() as u64;
            task.add_bytes(len);
            self.progress.advance(len);
        }
        file.flush().await.map_err(|e| SyncError::io(destination, e))
    }
}

/// Stats the destination and records `NewFile` when it is absent.
async fn already_present(
    task: &mut TransferTask,
    destination: &Path,
) -> Result<bool, SyncError> {
    match tokio::fs::metadata(destination).await {
        Ok(meta) if meta.is_file() && meta.len() == task.expected_size => Ok(true),
        Ok(meta) => {
            debug!(
                path = %destination.display(),
                on_disk = meta.len(),
                expected = task.expected_size,
                "size differs, fetching again"
            );
            Ok(false)
        }
        Err(e) if e.kind() == IoErrorKind::NotFound => {
            task.set_status(TransferStatus::NewFile);
            Ok(false)
        }
        Err(e) => Err(SyncError::io(destination, e)),
    }
}

fn outcome(
    task: &TransferTask,
    destination: PathBuf,
    error: Option<(ErrorKind, String)>,
) -> TransferOutcome {
    TransferOutcome {
        name: task.name.clone(),
        destination,
        status: task.status(),
        bytes_transferred: task.bytes_transferred(),
        error,
    }
}
