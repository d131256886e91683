//! Job coordinator: owns the single job slot and is the only writer of its
//! state.
//!
//! A `start` launches the four-phase pipeline on a blocking worker; the run
//! reports through an event channel the coordinator drains (`pump` for
//! non-blocking use, `run_to_completion` to await the outcome). Starting a
//! new run, cancelling, or resetting bumps the run generation, so events
//! from a superseded run can never overwrite current state.

mod events;
mod pipeline;
mod state;

pub use events::{Envelope, JobEvent};
pub use state::JobState;

use std::path::{Path, PathBuf};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::api::poll::POLL_MAX_ATTEMPTS;
use crate::config::SettingsSnapshot;
use crate::control::CancelToken;
use crate::progress::{poll_increment, Phase};
use crate::transport::name::sanitize_remote_name;

use self::pipeline::RunContext;

/// Handle to the in-flight run.
struct ActiveRun {
    cancel: CancelToken,
    // Kept so the worker is not detached invisibly; never awaited, the
    // run signals completion through the event channel instead.
    _handle: tokio::task::JoinHandle<()>,
}

pub struct JobCoordinator {
    state: JobState,
    status_log: Vec<String>,
    last_accepted_file: Option<PathBuf>,
    last_settings: Option<SettingsSnapshot>,
    generation: u64,
    active: Option<ActiveRun>,
    events_tx: UnboundedSender<Envelope>,
    events_rx: UnboundedReceiver<Envelope>,
}

impl JobCoordinator {
    /// Must be created inside a tokio runtime; runs are spawned with
    /// `spawn_blocking`.
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            state: JobState::Idle,
            status_log: Vec::new(),
            last_accepted_file: None,
            last_settings: None,
            generation: 0,
            active: None,
            events_tx,
            events_rx,
        }
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    /// Append-only, ordered, user-facing status log.
    pub fn status_log(&self) -> &[String] {
        &self.status_log
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_running()
    }

    /// File a `retry` would re-run, if any.
    pub fn last_accepted_file(&self) -> Option<&Path> {
        self.last_accepted_file.as_deref()
    }

    /// Settings of the most recent run; presentation layers can prefill a
    /// retry with these.
    pub fn last_settings(&self) -> Option<&SettingsSnapshot> {
        self.last_settings.as_ref()
    }

    /// Accepts a file for the next run. Rejected while a run is in flight.
    pub fn accept_file(&mut self, path: &Path) {
        if self.is_busy() {
            self.log(format!("{}: ignored, job running", display_name(path)));
            return;
        }
        self.log(format!("accepted {}", display_name(path)));
        self.last_accepted_file = Some(path.to_path_buf());
        self.state = JobState::Ready {
            file: path.to_path_buf(),
        };
    }

    /// Starts the four-phase pipeline for `path` with a settings snapshot
    /// captured for the whole run. No-op while a run is in flight.
    pub fn start(&mut self, path: &Path, settings: SettingsSnapshot) {
        if self.is_busy() {
            self.log("start ignored, job running");
            return;
        }
        self.begin_run(path.to_path_buf(), settings);
    }

    /// Re-runs the whole pipeline with the last accepted file and freshly
    /// supplied settings. Without a previous file this is a logged no-op
    /// back to `Idle`; no network call is made.
    pub fn retry(&mut self, settings: SettingsSnapshot) {
        if self.is_busy() {
            self.log("retry ignored, job running");
            return;
        }
        let Some(path) = self.last_accepted_file.clone() else {
            self.log("retry not possible, no file accepted yet");
            self.state = JobState::Idle;
            return;
        };
        self.begin_run(path, settings);
    }

    /// Cooperatively cancels the active run and returns to `Idle`.
    /// Cancellation is never reported as an error.
    pub fn cancel(&mut self) {
        self.abandon_active_run();
        self.state = JobState::Idle;
        self.log("cancelled");
    }

    /// Cancels any active run and clears back to `Idle`. The last accepted
    /// file is kept so `retry` still works afterwards.
    pub fn reset_to_idle(&mut self) {
        self.abandon_active_run();
        self.state = JobState::Idle;
        self.log("reset");
    }

    /// Applies all events already queued by the active run. Non-blocking.
    pub fn pump(&mut self) {
        while let Ok(envelope) = self.events_rx.try_recv() {
            self.apply(envelope);
        }
    }

    /// Awaits and applies events until the active run settles. Returns
    /// immediately when no run is active.
    pub async fn run_to_completion(&mut self) {
        while self.active.is_some() {
            let Some(envelope) = self.events_rx.recv().await else {
                return;
            };
            self.apply(envelope);
        }
    }

    fn begin_run(&mut self, path: PathBuf, settings: SettingsSnapshot) {
        self.abandon_active_run();

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let remote_name = sanitize_remote_name(filename);

        self.last_accepted_file = Some(path.clone());
        self.last_settings = Some(settings.clone());
        self.state = JobState::Running {
            phase: Phase::Cleaning,
            progress: 0.0,
            filename: remote_name.clone(),
        };
        self.log(format!("starting upload of {}", remote_name));

        let cancel = CancelToken::new();
        let ctx = RunContext {
            generation: self.generation,
            settings,
            local_path: path,
            remote_name,
            cancel: cancel.clone(),
            events: self.events_tx.clone(),
        };
        let handle = tokio::task::spawn_blocking(move || pipeline::run(ctx));
        self.active = Some(ActiveRun {
            cancel,
            _handle: handle,
        });
    }

    /// Signals the active run (if any) to stop and bumps the generation so
    /// its late events are dropped. The worker unwinds on its own, releasing
    /// its connection; it is not awaited.
    fn abandon_active_run(&mut self) {
        if let Some(run) = self.active.take() {
            run.cancel.cancel();
        }
        self.generation += 1;
    }

    fn apply(&mut self, envelope: Envelope) {
        if envelope.generation != self.generation {
            tracing::debug!(
                generation = envelope.generation,
                "dropping event from superseded run"
            );
            return;
        }
        match envelope.event {
            JobEvent::Progress { phase, done, total } => {
                let value = phase.window().of_counts(done, total);
                self.set_running(phase, value);
            }
            JobEvent::PhaseDone { phase } => {
                // Snap to the window's upper bound; the next phase becomes
                // current. Polling's end arrives as `Finished` instead.
                let value = phase.window().hi;
                let next = phase.next().unwrap_or(phase);
                self.set_running(next, value);
            }
            JobEvent::PollTick { attempt } => {
                let window = Phase::Polling.window();
                let value = window.lo
                    + f64::from(attempt.saturating_sub(1)) * poll_increment(POLL_MAX_ATTEMPTS);
                self.set_running(Phase::Polling, value);
            }
            JobEvent::Finished(Ok(url)) => {
                self.active = None;
                self.state = JobState::Done {
                    result_url: url.clone(),
                };
                self.log(format!("done: {}", url));
            }
            JobEvent::Finished(Err(e)) => {
                self.active = None;
                let message = e.to_string();
                self.state = JobState::Failed {
                    message: message.clone(),
                };
                self.log(message);
            }
        }
    }

    /// Updates phase and progress; progress never moves backwards within a
    /// run. Phase changes get a status-log line.
    fn set_running(&mut self, phase: Phase, value: f64) {
        let logged = if let JobState::Running {
            phase: current,
            progress,
            ..
        } = &mut self.state
        {
            let entered = (*current != phase).then_some(phase);
            *current = phase;
            if value > *progress {
                *progress = value;
            }
            entered
        } else {
            None
        };
        if let Some(phase) = logged {
            self.log(phase.label());
        }
    }

    fn log(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::info!("{}", line);
        self.status_log.push(line);
    }

    /// Test seam: start a run whose body is supplied by the caller instead
    /// of the real pipeline.
    #[cfg(test)]
    fn start_with<F>(&mut self, path: PathBuf, body: F)
    where
        F: FnOnce(RunContext) + Send + 'static,
    {
        if self.is_busy() {
            self.log("start ignored, job running");
            return;
        }
        self.abandon_active_run();
        let remote_name = sanitize_remote_name(
            path.file_name().and_then(|n| n.to_str()).unwrap_or_default(),
        );
        self.last_accepted_file = Some(path.clone());
        self.state = JobState::Running {
            phase: Phase::Cleaning,
            progress: 0.0,
            filename: remote_name.clone(),
        };
        self.log(format!("starting upload of {}", remote_name));
        let cancel = CancelToken::new();
        let ctx = RunContext {
            generation: self.generation,
            settings: SettingsSnapshot::default(),
            local_path: path,
            remote_name,
            cancel: cancel.clone(),
            events: self.events_tx.clone(),
        };
        let handle = tokio::task::spawn_blocking(move || body(ctx));
        self.active = Some(ActiveRun {
            cancel,
            _handle: handle,
        });
    }
}

impl Default for JobCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}
