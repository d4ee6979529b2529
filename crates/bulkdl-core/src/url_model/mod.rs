//! URL modeling: filename derivation and the direct-download rewrite.
//!
//! Filenames come from a pluggable [`FilenameDeriver`]. The default
//! [`SharedFolderDeriver`] reproduces the shared-folder service's fixed URL
//! shape; [`LastSegmentDeriver`] is the general fallback. Both sanitize their
//! output for the local filesystem.

mod path;
mod sanitize;

use serde::{Deserialize, Serialize};

pub use path::{last_path_segment, positional_piece};
pub use sanitize::sanitize_filename;

/// Query flag that makes the hosting service serve a preview page.
const PREVIEW_FLAG: &str = "dl=0";
/// Query flag that makes the hosting service serve raw bytes.
const DIRECT_FLAG: &str = "dl=1";

/// Why a filename could not be derived from a link.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilenameError {
    #[error("expected at least {needed} '/'-separated pieces, found {found}")]
    TooFewSegments { found: usize, needed: usize },
    #[error("link has no usable path segment")]
    Empty,
}

/// Strategy for turning a raw listing link into a local filename.
pub trait FilenameDeriver: Send + Sync {
    fn derive_filename(&self, url: &str) -> Result<String, FilenameError>;
}

/// Positional rule for shared-folder links of the shape
/// `https://host/sh/<folder>/<key>/<name>?dl=0`.
///
/// Drops the last `strip_chars` characters of the link (the `?dl=0` tail),
/// splits on `'/'` and takes piece `segment_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedFolderDeriver {
    pub segment_index: usize,
    pub strip_chars: usize,
}

impl Default for SharedFolderDeriver {
    fn default() -> Self {
        Self {
            segment_index: 6,
            strip_chars: PREVIEW_FLAG.len() + 1,
        }
    }
}

impl FilenameDeriver for SharedFolderDeriver {
    fn derive_filename(&self, url: &str) -> Result<String, FilenameError> {
        let (piece, found) = positional_piece(url, self.strip_chars, self.segment_index);
        let piece = piece.ok_or(FilenameError::TooFewSegments {
            found,
            needed: self.segment_index + 1,
        })?;
        non_empty(sanitize_filename(piece))
    }
}

/// Uses the last path segment of an absolute URL, ignoring the query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LastSegmentDeriver;

impl FilenameDeriver for LastSegmentDeriver {
    fn derive_filename(&self, url: &str) -> Result<String, FilenameError> {
        let segment = last_path_segment(url).ok_or(FilenameError::Empty)?;
        non_empty(sanitize_filename(&segment))
    }
}

fn non_empty(name: String) -> Result<String, FilenameError> {
    if name.is_empty() {
        Err(FilenameError::Empty)
    } else {
        Ok(name)
    }
}

/// Config-level selector for the deriver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeriverKind {
    #[default]
    SharedFolder,
    LastSegment,
}

impl DeriverKind {
    pub fn into_deriver(self) -> Box<dyn FilenameDeriver> {
        match self {
            DeriverKind::SharedFolder => Box::new(SharedFolderDeriver::default()),
            DeriverKind::LastSegment => Box::new(LastSegmentDeriver),
        }
    }
}

/// Rewrites every `dl=0` to `dl=1` so the link serves raw content.
///
/// Links already carrying `dl=1` (or no flag at all) are returned unchanged.
pub fn direct_download_url(link: &str) -> String {
    link.replace(PREVIEW_FLAG, DIRECT_FLAG)
}
