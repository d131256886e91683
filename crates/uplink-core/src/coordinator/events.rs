//! Events a pipeline run sends back to the coordinator.
//!
//! All state mutation happens in the coordinator; the run only reports.
//! Every envelope carries the generation its run was started under so the
//! coordinator can drop events from a superseded run.

use crate::error::TransferError;
use crate::progress::Phase;

#[derive(Debug)]
pub struct Envelope {
    pub generation: u64,
    pub event: JobEvent,
}

#[derive(Debug)]
pub enum JobEvent {
    /// A phase reported raw progress counts.
    Progress { phase: Phase, done: u64, total: u64 },
    /// A phase finished; global progress snaps to the window's upper bound.
    PhaseDone { phase: Phase },
    /// A poll attempt is about to fire (1-based).
    PollTick { attempt: u32 },
    /// The run settled: result URL on success, classified error on failure.
    /// A cancelled run sends nothing; the coordinator has already moved on.
    Finished(Result<String, TransferError>),
}
