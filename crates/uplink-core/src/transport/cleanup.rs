//! Remote-root cleanup: delete plain files at `/`, never directories.

use std::path::{Path, PathBuf};

use crate::control::CancelToken;
use crate::error::{PhaseFailure, TransferError};

use super::{RemoteFileEntry, SftpConnection};

/// Deletes every plain file at the fixed remote root, one at a time.
///
/// `progress` receives `(deleted_so_far, total_files)`: once as `(0, total)`
/// before the first delete and once after each delete. Dot entries and
/// anything classified as a directory are skipped and never counted. A
/// failed delete aborts with the offending filename attached.
pub fn cleanup_root(
    conn: &SftpConnection,
    path: &str,
    cancel: &CancelToken,
    progress: impl FnMut(u64, u64),
) -> Result<(), PhaseFailure> {
    super::validate_remote_root(path)?;

    cancel.checkpoint()?;
    let entries = conn
        .sftp()
        .readdir(Path::new(path))
        .map_err(|e| TransferError::DirReadFailure {
            path: path.to_string(),
            detail: e.to_string(),
        })?;

    let listing: Vec<(PathBuf, Option<u32>)> = entries
        .into_iter()
        .map(|(p, stat)| (p, stat.perm))
        .collect();
    let files = files_to_delete(&listing);

    let deleted = delete_files(
        &files,
        cancel,
        |name| {
            let full = Path::new(path).join(name);
            conn.sftp()
                .unlink(&full)
                .map_err(|e| TransferError::DeleteFailure {
                    name: name.to_string(),
                    detail: e.to_string(),
                })
        },
        progress,
    )?;

    tracing::debug!(deleted, "remote root cleanup finished");
    Ok(())
}

/// Filters a raw listing down to deletable plain files. Dot entries are
/// dropped; entries without permission bits count as directories.
fn files_to_delete(listing: &[(PathBuf, Option<u32>)]) -> Vec<RemoteFileEntry> {
    listing
        .iter()
        .filter_map(|(path, perm)| {
            let name = path.file_name()?.to_str()?.to_string();
            if name == "." || name == ".." {
                return None;
            }
            Some(RemoteFileEntry::from_listing(name, *perm))
        })
        .filter(|entry| !entry.is_directory)
        .collect()
}

/// Runs the delete loop over `files`, checking the cancel token before each
/// delete. Reports `(0, total)` up front, then `(deleted, total)` after
/// every delete; a delete error aborts immediately.
fn delete_files(
    files: &[RemoteFileEntry],
    cancel: &CancelToken,
    mut delete: impl FnMut(&str) -> Result<(), TransferError>,
    mut progress: impl FnMut(u64, u64),
) -> Result<u64, PhaseFailure> {
    let total = files.len() as u64;
    progress(0, total);

    let mut deleted = 0u64;
    for entry in files {
        cancel.checkpoint()?;
        delete(&entry.name)?;
        deleted += 1;
        progress(deleted, total);
    }
    Ok(deleted)
}
