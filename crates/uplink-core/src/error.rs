//! Closed failure taxonomy shared by transport, API client, and coordinator.
//!
//! Every variant carries a human-readable message that is surfaced verbatim
//! in the `Failed` state and the status log. Cancellation is not here; see
//! [`crate::control::Cancelled`].

use thiserror::Error;

use crate::control::Cancelled;

/// Everything that can make a run fail, classified.
#[derive(Debug, Error)]
pub enum TransferError {
    // Validation (checked before any network call).
    #[error("invalid host: {0}")]
    InvalidHost(String),
    #[error("port must be between 1 and 65535, got {0}")]
    InvalidPort(u16),
    #[error("username must not be empty")]
    EmptyUsername,
    #[error("remote cleanup is limited to \"/\", got {0:?}")]
    InvalidRemotePath(String),
    #[error("not a usable local file: {0}")]
    InvalidLocalFile(String),

    // Local I/O.
    #[error("local file not found: {0}")]
    LocalFileMissing(String),
    #[error("cannot read local file {path}: {source}")]
    LocalFileUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot determine size of local file: {0}")]
    LocalSizeUnknown(String),

    // Connectivity.
    #[error("DNS lookup for {host} failed: {detail}")]
    DnsFailure { host: String, detail: String },
    #[error("could not connect to {addr}: {detail}")]
    ConnectFailure { addr: String, detail: String },
    #[error("protocol handshake with {host} failed: {detail}")]
    HandshakeFailure { host: String, detail: String },
    #[error("authentication failed for user {username}: {detail}")]
    AuthFailure { username: String, detail: String },

    // File-transfer protocol.
    #[error("file-transfer subsystem failed to start: {0}")]
    SubsystemFailure(String),
    #[error("could not read remote directory {path}: {detail}")]
    DirReadFailure { path: String, detail: String },
    #[error("could not delete remote file {name}: {detail}")]
    DeleteFailure { name: String, detail: String },
    #[error("could not open remote file {name}: {detail}")]
    RemoteOpenFailure { name: String, detail: String },
    #[error("write to remote file {name} failed: {detail}")]
    RemoteWriteFailure { name: String, detail: String },
    #[error("remote file {name} did not close cleanly: {detail}")]
    RemoteCloseFailure { name: String, detail: String },

    // Processing API.
    #[error("invalid API URL {url}: {detail}")]
    InvalidApiUrl { url: String, detail: String },
    #[error("malformed HTTP response: {0}")]
    InvalidResponse(String),
    #[error("server returned HTTP {0}")]
    HttpStatus(u32),
    #[error("could not decode server response: {0}")]
    Decode(String),
    #[error("server reported an error: {}", message.as_deref().unwrap_or("no details given"))]
    ServerError { message: Option<String> },
    #[error("processing finished but no result URL was returned")]
    DoneWithoutUrl,
    #[error("timed out waiting for remote processing to finish")]
    PollTimeout,

    // Anything unclassified is wrapped, never dropped.
    #[error("unexpected error: {0}")]
    Other(String),
}

/// Result of one pipeline phase. Keeps user cancellation apart from the
/// taxonomy so it can never be misreported as a failure.
#[derive(Debug)]
pub enum PhaseFailure {
    Cancelled,
    Error(TransferError),
}

impl From<Cancelled> for PhaseFailure {
    fn from(_: Cancelled) -> Self {
        PhaseFailure::Cancelled
    }
}

impl From<TransferError> for PhaseFailure {
    fn from(e: TransferError) -> Self {
        PhaseFailure::Error(e)
    }
}
