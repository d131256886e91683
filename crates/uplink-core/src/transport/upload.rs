//! Chunked upload of one local file to the remote root.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::control::CancelToken;
use crate::error::{PhaseFailure, TransferError};

use super::name::sanitize_remote_name;
use super::{SftpConnection, REMOTE_ROOT};

/// Fixed upload chunk size (1 MiB).
pub const UPLOAD_CHUNK_SIZE: usize = 1024 * 1024;

/// Streams `local_path` to `<root>/<sanitized name>` in fixed-size chunks.
///
/// `progress` receives `(bytes_sent, total_bytes)` after every successful
/// chunk write. The remote handle is closed explicitly; a close that fails
/// after all bytes were written is still reported, so the server side never
/// keeps a half-open handle unnoticed. Returns the sanitized remote name
/// actually used.
pub fn upload_file(
    conn: &SftpConnection,
    local_path: &Path,
    remote_name: &str,
    cancel: &CancelToken,
    mut progress: impl FnMut(u64, u64),
) -> Result<String, PhaseFailure> {
    let display = local_path.display().to_string();
    let total = local_file_size(local_path)?;

    let local = File::open(local_path).map_err(|e| TransferError::LocalFileUnreadable {
        path: display.clone(),
        source: e,
    })?;

    let name = sanitize_remote_name(remote_name);
    let remote_path = Path::new(REMOTE_ROOT).join(&name);

    cancel.checkpoint()?;
    let mut remote =
        conn.sftp()
            .create(&remote_path)
            .map_err(|e| TransferError::RemoteOpenFailure {
                name: name.clone(),
                detail: e.to_string(),
            })?;

    let sent = stream_chunks(
        &name,
        &display,
        UPLOAD_CHUNK_SIZE,
        local,
        &mut remote,
        total,
        cancel,
        &mut progress,
    )?;

    // Drop would swallow the close status; the SFTP CLOSE must be checked.
    remote
        .close()
        .map_err(|e| TransferError::RemoteCloseFailure {
            name: name.clone(),
            detail: e.to_string(),
        })?;

    tracing::debug!(bytes = sent, name = %name, "upload complete");
    Ok(name)
}

/// Pumps `local` into `remote` in `chunk_size` pieces, reporting
/// `(bytes_sent, total)` after each chunk and checking the cancel token
/// before each write. A chunk write that completes for fewer bytes than
/// requested is a fatal write failure; there is no partial-chunk retry and
/// no resume. The final flush maps to a close failure since the remote
/// handle is no longer usable afterwards.
#[allow(clippy::too_many_arguments)]
fn stream_chunks(
    name: &str,
    local_display: &str,
    chunk_size: usize,
    mut local: impl Read,
    mut remote: impl Write,
    total: u64,
    cancel: &CancelToken,
    progress: &mut impl FnMut(u64, u64),
) -> Result<u64, PhaseFailure> {
    let mut buf = vec![0u8; chunk_size];
    let mut sent: u64 = 0;
    loop {
        let n = local
            .read(&mut buf)
            .map_err(|e| TransferError::LocalFileUnreadable {
                path: local_display.to_string(),
                source: e,
            })?;
        if n == 0 {
            break;
        }
        cancel.checkpoint()?;
        let written = remote
            .write(&buf[..n])
            .map_err(|e| TransferError::RemoteWriteFailure {
                name: name.to_string(),
                detail: e.to_string(),
            })?;
        if written < n {
            return Err(TransferError::RemoteWriteFailure {
                name: name.to_string(),
                detail: format!("short write: {} of {} bytes", written, n),
            }
            .into());
        }
        sent += n as u64;
        progress(sent, total);
    }

    remote
        .flush()
        .map_err(|e| TransferError::RemoteCloseFailure {
            name: name.to_string(),
            detail: e.to_string(),
        })?;
    Ok(sent)
}

/// Validates the local file and returns its byte size. Fails fast, before
/// any remote handle is opened.
pub fn local_file_size(path: &Path) -> Result<u64, TransferError> {
    let display = path.display().to_string();
    let meta = std::fs::metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => TransferError::LocalFileMissing(display.clone()),
        _ => TransferError::LocalFileUnreadable {
            path: display.clone(),
            source: e,
        },
    })?;
    if !meta.is_file() {
        return Err(TransferError::InvalidLocalFile(display));
    }
    Ok(meta.len())
}
