//! The four-phase background run: cleanup, upload, trigger, poll.
//!
//! Runs on a blocking worker (ssh2 and curl are synchronous) and reports
//! everything through the event channel. The SFTP connection is released on
//! every exit path; a cancelled run unwinds silently.

use std::path::PathBuf;

use tokio::sync::mpsc::UnboundedSender;

use crate::api::{self, ApiClient};
use crate::config::SettingsSnapshot;
use crate::control::CancelToken;
use crate::error::PhaseFailure;
use crate::progress::Phase;
use crate::transport::{self, SftpConnection};

use super::events::{Envelope, JobEvent};

/// Everything one run needs; moved onto the blocking worker.
pub(super) struct RunContext {
    pub generation: u64,
    pub settings: SettingsSnapshot,
    pub local_path: PathBuf,
    /// Sanitized remote filename, fixed at start.
    pub remote_name: String,
    pub cancel: CancelToken,
    pub events: UnboundedSender<Envelope>,
}

impl RunContext {
    fn send(&self, event: JobEvent) {
        let _ = self.events.send(Envelope {
            generation: self.generation,
            event,
        });
    }
}

/// Runs all four phases in order and reports the outcome.
pub(super) fn run(ctx: RunContext) {
    match run_phases(&ctx) {
        Ok(url) => ctx.send(JobEvent::Finished(Ok(url))),
        Err(PhaseFailure::Error(e)) => {
            tracing::warn!(error = %e, "pipeline run failed");
            ctx.send(JobEvent::Finished(Err(e)));
        }
        Err(PhaseFailure::Cancelled) => {
            tracing::debug!("pipeline run cancelled, unwinding silently");
        }
    }
}

fn run_phases(ctx: &RunContext) -> Result<String, PhaseFailure> {
    // Validation and local I/O fail fast, before any network call.
    transport::local_file_size(&ctx.local_path)?;

    // Phases 1 and 2 share one SFTP connection. Close it before the HTTP
    // phases; an unwind (error or cancellation) closes it via Drop.
    let conn = SftpConnection::open(&ctx.settings, &ctx.cancel)?;
    let transferred = transfer_phases(ctx, &conn);
    conn.close();
    transferred?;

    // Phase 3: trigger remote processing.
    ctx.cancel.checkpoint()?;
    let client = ApiClient::new(&ctx.settings.api_base_url, &ctx.settings.api_token)?;
    let started = client.start(&ctx.remote_name)?;
    ctx.send(JobEvent::PhaseDone {
        phase: Phase::Triggering,
    });
    tracing::info!(job_id = %started.job_id, "remote processing started");

    // Phase 4: poll until the server settles.
    let status_url = api::resolve_status_url(client.base(), &started);
    let result_url = api::poll::poll_until_done(
        || client.poll_status(&status_url),
        api::poll::POLL_INTERVAL,
        api::poll::POLL_MAX_ATTEMPTS,
        &ctx.cancel,
        |attempt| ctx.send(JobEvent::PollTick { attempt }),
    )?;
    Ok(result_url)
}

fn transfer_phases(ctx: &RunContext, conn: &SftpConnection) -> Result<(), PhaseFailure> {
    transport::cleanup_root(conn, transport::REMOTE_ROOT, &ctx.cancel, |done, total| {
        ctx.send(JobEvent::Progress {
            phase: Phase::Cleaning,
            done,
            total,
        });
    })?;
    ctx.send(JobEvent::PhaseDone {
        phase: Phase::Cleaning,
    });

    transport::upload_file(
        conn,
        &ctx.local_path,
        &ctx.remote_name,
        &ctx.cancel,
        |sent, total| {
            ctx.send(JobEvent::Progress {
                phase: Phase::Uploading,
                done: sent,
                total,
            });
        },
    )?;
    ctx.send(JobEvent::PhaseDone {
        phase: Phase::Uploading,
    });
    Ok(())
}
