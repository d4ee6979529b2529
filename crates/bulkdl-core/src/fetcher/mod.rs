//! Bounded fetch of one download task.
//!
//! Every body GET holds one permit of a shared semaphore. The permit is
//! released as soon as the body is read (or the GET fails / times out), before
//! the file is written, so slow disks never hold network slots.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::error::{FetchError, TaskError};
use crate::plan::DownloadTask;
use crate::storage;
use crate::transport::HttpTransport;

/// Per-task lifecycle. `Pending → Fetching → Writing → Done`, or `→ Failed`
/// from `Fetching` or `Writing`. No retries, no backward transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Fetching,
    Writing,
    Done,
    Failed,
}

/// Fetched body plus the task that owns it, alive only until the write.
#[derive(Debug)]
pub struct FetchedFile {
    pub task: DownloadTask,
    pub bytes: Vec<u8>,
}

impl FetchedFile {
    /// Persists the body under the task's filename in `dir`.
    async fn write_to(self, dir: &Path) -> TaskOutcome {
        let FetchedFile { task, bytes } = self;
        let len = bytes.len() as u64;
        let result = storage::write_file(dir, &task.filename, bytes)
            .await
            .map(|path| CompletedFile { path, bytes: len });

        match &result {
            Ok(done) => {
                tracing::debug!(filename = %task.filename, path = %done.path.display(), state = ?TaskState::Done, "task state")
            }
            Err(e) => {
                tracing::warn!(filename = %task.filename, error = %e, state = ?TaskState::Failed, "write failed")
            }
        }
        TaskOutcome { task, result }
    }
}

/// A file that reached disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedFile {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Terminal result of one task.
#[derive(Debug)]
pub struct TaskOutcome {
    pub task: DownloadTask,
    pub result: Result<CompletedFile, TaskError>,
}

impl TaskOutcome {
    pub fn state(&self) -> TaskState {
        if self.result.is_ok() {
            TaskState::Done
        } else {
            TaskState::Failed
        }
    }
}

/// Fetches tasks under a shared concurrency limit and persists them.
#[derive(Clone)]
pub struct BoundedFetcher {
    transport: Arc<dyn HttpTransport>,
    limiter: Arc<Semaphore>,
    dest_dir: PathBuf,
    request_timeout: Duration,
}

impl BoundedFetcher {
    /// `max_concurrent` is clamped to at least 1.
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        max_concurrent: usize,
        dest_dir: impl Into<PathBuf>,
        request_timeout: Duration,
    ) -> Self {
        let permits = max_concurrent.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            transport,
            limiter: Arc::new(Semaphore::new(permits)),
            dest_dir: dest_dir.into(),
            request_timeout,
        }
    }

    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    /// Permits currently free (equals the limit when idle).
    pub fn available_slots(&self) -> usize {
        self.limiter.available_permits()
    }

    /// Runs one task to `Done` or `Failed`. Never panics on I/O or network errors.
    pub async fn fetch(&self, task: DownloadTask) -> TaskOutcome {
        tracing::debug!(filename = %task.filename, url = %task.source_url, state = ?TaskState::Fetching, "task state");
        let bytes = match self.fetch_body(&task).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(filename = %task.filename, error = %e, state = ?TaskState::Failed, "download failed");
                return TaskOutcome {
                    task,
                    result: Err(e.into()),
                };
            }
        };

        tracing::debug!(filename = %task.filename, len = bytes.len(), state = ?TaskState::Writing, "task state");
        FetchedFile { task, bytes }.write_to(&self.dest_dir).await
    }

    /// GET the task's body while holding one limiter slot.
    async fn fetch_body(&self, task: &DownloadTask) -> Result<Vec<u8>, FetchError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| FetchError::Connection {
                url: task.source_url.clone(),
                message: "concurrency limiter closed".to_string(),
            })?;

        match tokio::time::timeout(
            self.request_timeout,
            self.transport.get_bytes(&task.source_url),
        )
        .await
        {
            Ok(res) => res,
            Err(_) => Err(FetchError::Timeout {
                url: task.source_url.clone(),
                after: self.request_timeout,
            }),
        }
    }
}
