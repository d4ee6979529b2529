//! Local file persistence for fetched bodies.
//!
//! Each write goes to its own uniquely named `.part` file in the destination
//! directory and is then persisted over the final name, so a failed write never
//! leaves a truncated file where a finished one is expected. Concurrent writes
//! to the same name never share a temp file: the last one to persist wins.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::TaskError;

/// Temporary file suffix used before the final persist.
pub const TEMP_SUFFIX: &str = ".part";
/// Prefix of temp files; short and fixed so long filenames stay under NAME_MAX.
const TEMP_PREFIX: &str = ".bulkdl-";

/// Writes `bytes` to `dir/filename`, creating `dir` (recursively) if missing.
///
/// Returns the final path. A [`TaskError::Write`] names the path that failed.
pub async fn write_file(dir: &Path, filename: &str, bytes: Vec<u8>) -> Result<PathBuf, TaskError> {
    let dir = dir.to_path_buf();
    let final_path = dir.join(filename);
    let target = final_path.clone();
    let joined = tokio::task::spawn_blocking(move || write_blocking(&dir, &target, &bytes)).await;

    match joined {
        Ok(res) => res,
        Err(e) => Err(TaskError::Write {
            path: final_path,
            source: io::Error::new(io::ErrorKind::Other, e),
        }),
    }
}

fn write_blocking(dir: &Path, final_path: &Path, bytes: &[u8]) -> Result<PathBuf, TaskError> {
    std::fs::create_dir_all(dir).map_err(|source| TaskError::Write {
        path: dir.to_path_buf(),
        source,
    })?;

    let to_final = |source: io::Error| TaskError::Write {
        path: final_path.to_path_buf(),
        source,
    };
    // Dropping the temp file on any error below removes it.
    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
        .map_err(to_final)?;
    tmp.write_all(bytes).map_err(to_final)?;
    tmp.persist(final_path).map_err(|e| to_final(e.error))?;
    Ok(final_path.to_path_buf())
}
