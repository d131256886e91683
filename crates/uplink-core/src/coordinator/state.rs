//! Job state: the closed sum type every consumer matches exhaustively.

use std::path::PathBuf;

use crate::progress::Phase;

/// Lifecycle of the single job slot.
///
/// `Idle` is both the initial state and the only state reachable from
/// cancel/reset. `Done` and `Failed` are terminal until an explicit reset,
/// retry, or a newly accepted file.
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    /// Nothing accepted, nothing running.
    Idle,
    /// A file has been accepted and is waiting for `start`.
    Ready { file: PathBuf },
    /// The pipeline is in flight.
    Running {
        phase: Phase,
        /// Global progress in [0, 1]; non-decreasing within a run.
        progress: f64,
        /// Sanitized remote filename shown to the user.
        filename: String,
    },
    /// Terminal: remote processing finished.
    Done { result_url: String },
    /// Terminal: the run failed with a classified, user-facing message.
    Failed { message: String },
}

impl JobState {
    /// True while a pipeline run is in flight.
    pub fn is_running(&self) -> bool {
        matches!(self, JobState::Running { .. })
    }
}
