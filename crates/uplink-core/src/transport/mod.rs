//! SFTP transfer transport: connection setup, remote-root cleanup, chunked upload.
//!
//! Lowest layer of the pipeline. Knows nothing about phases or progress
//! windows; it reports raw `(done, total)` pairs and checks the cancel token
//! before every network round trip.

mod cleanup;
mod connect;
pub mod host;
pub mod name;
mod upload;

pub use cleanup::cleanup_root;
pub use connect::SftpConnection;
pub use upload::{local_file_size, upload_file, UPLOAD_CHUNK_SIZE};

use crate::config::SettingsSnapshot;
use crate::error::TransferError;

/// The only remote path cleanup is allowed to touch.
pub const REMOTE_ROOT: &str = "/";

/// One entry from a remote directory listing.
#[derive(Debug, Clone)]
pub struct RemoteFileEntry {
    pub name: String,
    pub is_directory: bool,
}

impl RemoteFileEntry {
    /// Classifies an entry from its name and optional permission bits.
    /// Missing permission information counts as a directory, so cleanup
    /// skips the entry rather than deleting something it cannot classify.
    pub fn from_listing(name: String, perm: Option<u32>) -> Self {
        const S_IFMT: u32 = 0o170000;
        const S_IFDIR: u32 = 0o040000;
        let is_directory = match perm {
            Some(p) => (p & S_IFMT) == S_IFDIR,
            None => true,
        };
        Self { name, is_directory }
    }
}

/// Validates connection-relevant settings before any network call.
pub fn validate_settings(settings: &SettingsSnapshot) -> Result<(), TransferError> {
    if settings.port == 0 {
        return Err(TransferError::InvalidPort(settings.port));
    }
    if settings.username.trim().is_empty() {
        return Err(TransferError::EmptyUsername);
    }
    Ok(())
}

/// Rejects any cleanup target other than the fixed remote root.
pub fn validate_remote_root(path: &str) -> Result<(), TransferError> {
    if path != REMOTE_ROOT {
        return Err(TransferError::InvalidRemotePath(path.to_string()));
    }
    Ok(())
}
