//! Phases, phase windows, and progress mapping.
//!
//! Each pipeline phase owns a fixed slice of the global 0..1 progress range.
//! Mapping is pure: a sub-phase ratio (or a raw numerator/total pair) is
//! scaled into the phase's window. There is no hidden state.

/// Pipeline phases in fixed traversal order. No skipping, no reordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Cleaning,
    Uploading,
    Triggering,
    Polling,
}

impl Phase {
    /// The slice of global progress assigned to this phase.
    pub fn window(self) -> Window {
        match self {
            Phase::Cleaning => Window { lo: 0.0, hi: 0.10 },
            Phase::Uploading => Window { lo: 0.10, hi: 0.85 },
            Phase::Triggering => Window { lo: 0.85, hi: 0.90 },
            Phase::Polling => Window { lo: 0.90, hi: 1.0 },
        }
    }

    /// The phase that follows this one.
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Cleaning => Some(Phase::Uploading),
            Phase::Uploading => Some(Phase::Triggering),
            Phase::Triggering => Some(Phase::Polling),
            Phase::Polling => None,
        }
    }

    /// Short status-log label.
    pub fn label(self) -> &'static str {
        match self {
            Phase::Cleaning => "cleaning remote folder",
            Phase::Uploading => "uploading",
            Phase::Triggering => "starting remote processing",
            Phase::Polling => "waiting for remote processing",
        }
    }
}

/// Fixed fractional bounds of one phase within global progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub lo: f64,
    pub hi: f64,
}

impl Window {
    /// Maps a sub-phase ratio into this window. Ratios are clamped to [0, 1].
    pub fn at(self, ratio: f64) -> f64 {
        self.lo + ratio.clamp(0.0, 1.0) * (self.hi - self.lo)
    }

    /// Maps a raw `(done, total)` pair. `total == 0` counts as complete:
    /// nothing to do finishes the window immediately.
    pub fn of_counts(self, done: u64, total: u64) -> f64 {
        let ratio = if total == 0 {
            1.0
        } else {
            done as f64 / total as f64
        };
        self.at(ratio)
    }
}

/// Progress added per poll attempt while the server still reports
/// `processing`. Sized so the polling phase approaches but never reaches
/// 0.99 before the attempt cap.
pub fn poll_increment(max_attempts: u32) -> f64 {
    (0.99 - Phase::Polling.window().lo) / max_attempts as f64
}
