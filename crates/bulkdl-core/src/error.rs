//! Error taxonomy for a run.
//!
//! Listing and planning errors abort the whole run; fetch and write errors are
//! scoped to one task and recorded in the report.

use std::path::PathBuf;
use std::time::Duration;

use crate::url_model::FilenameError;

/// A single HTTP GET failed (listing page or file body).
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Server answered with a non-2xx status.
    #[error("GET {url} returned HTTP {status}")]
    Http { url: String, status: u16 },
    /// The HTTP client reported an error (DNS, TLS, connection reset, body read).
    #[error("GET {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// Transport-level failure without an underlying client error (used by non-reqwest transports).
    #[error("GET {url} failed: {message}")]
    Connection { url: String, message: String },
    /// No complete response within the per-request timeout.
    #[error("GET {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },
}

impl FetchError {
    /// HTTP status if the server responded with an error code.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure of one download task. Never aborts sibling tasks.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// Local filesystem failure (permissions, disk full, ...).
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A raw link could not be turned into a download task.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("malformed link {link}: {source}")]
    MalformedLink {
        link: String,
        #[source]
        source: FilenameError,
    },
}

/// Fatal errors that stop a run before any file is fetched.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("failed to fetch listing page {url}")]
    Listing {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error(transparent)]
    Planning(#[from] PlanError),
}
