//! Transfer task and queue types.

use std::fmt;
use std::path::{Path, PathBuf};

/// Lifecycle of a transfer task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    /// Planned, not yet looked at.
    Queued,
    /// Destination did not exist.
    NewFile,
    /// Destination already has the expected size; nothing fetched.
    Skipped,
    /// Body is being streamed to disk.
    Downloading,
    /// Body fully written.
    Done,
    /// Stat, request or write failed.
    Failed,
}

impl TransferStatus {
    /// Returns the display label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::NewFile => "new file",
            Self::Skipped => "skipped",
            Self::Downloading => "downloading",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One planned file download.
#[derive(Debug, Clone)]
pub struct TransferTask {
    /// Subproduct display name; also the file stem.
    pub name: String,
    /// Product directory the file goes into.
    pub destination_dir: PathBuf,
    /// Lower-cased format name used as file extension.
    pub extension: String,
    /// Source URL.
    pub url: String,
    /// Size in bytes announced by the order API.
    pub expected_size: u64,
    status: TransferStatus,
    bytes_transferred: u64,
}

impl TransferTask {
    /// Creates a queued task.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        destination_dir: impl Into<PathBuf>,
        extension: impl Into<String>,
        url: impl Into<String>,
        expected_size: u64,
    ) -> Self {
        Self {
            name: name.into(),
            destination_dir: destination_dir.into(),
            extension: extension.into(),
            url: url.into(),
            expected_size,
            status: TransferStatus::Queued,
            bytes_transferred: 0,
        }
    }

    /// Full destination path: `<dir>/<name>.<extension>`.
    #[must_use]
    pub fn destination(&self) -> PathBuf {
        self.destination_dir
            .join(format!("{}.{}", self.name, self.extension))
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> TransferStatus {
        self.status
    }

    /// Bytes written to the destination by the current run.
    #[must_use]
    pub fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred
    }

    pub(crate) fn set_status(&mut self, status: TransferStatus) {
        self.status = status;
    }

    pub(crate) fn add_bytes(&mut self, count: u64) {
        self.bytes_transferred = self.bytes_transferred.saturating_add(count);
    }

    pub(crate) fn reset_progress(&mut self) {
        self.bytes_transferred = 0;
    }
}

/// Ordered transfer tasks. Append-only while planning, drained in order.
#[derive(Debug, Clone, Default)]
pub struct TransferQueue {
    tasks: Vec<TransferTask>,
}

impl TransferQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a task.
    pub fn push(&mut self, task: TransferTask) {
        self.tasks.push(task);
    }

    /// Number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True when nothing was planned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks in queue order.
    #[must_use]
    pub fn tasks(&self) -> &[TransferTask] {
        &self.tasks
    }

    /// True if some task already targets `path`.
    #[must_use]
    pub fn contains_destination(&self, path: &Path) -> bool {
        self.tasks.iter().any(|task| task.destination() == path)
    }

    pub(crate) fn tasks_mut(&mut self) -> &mut [TransferTask] {
        &mut self.tasks
    }
}

impl<'a> IntoIterator for &'a TransferQueue {
    type Item = &'a TransferTask;
    type IntoIter = std::slice::Iter<'a, TransferTask>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}
