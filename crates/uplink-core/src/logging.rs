//! Logging bootstrap.
//!
//! Runs append to a plain-text log under the XDG state directory so a
//! failed transfer can still be inspected after the CLI exits. When the
//! state directory is unusable the caller falls back to stderr-only init.

use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "uplink.log";

/// Where the log lives: `<XDG state home>/uplink/uplink.log`.
pub fn log_path() -> Result<PathBuf> {
    let dirs = xdg::BaseDirectories::with_prefix("uplink")?;
    Ok(dirs.get_state_home().join(LOG_FILE_NAME))
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,uplink=debug"))
}

/// Per-event writer handle. Falls back to stderr when the file handle
/// cannot be cloned, so a log line is never dropped silently.
enum LogTarget {
    File(fs::File),
    Stderr,
}

impl io::Write for LogTarget {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogTarget::File(f) => f.write(buf),
            LogTarget::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogTarget::File(f) => f.flush(),
            LogTarget::Stderr => io::stderr().lock().flush(),
        }
    }
}

struct LogFile(fs::File);

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogTarget;

    fn make_writer(&'a self) -> Self::Writer {
        self.0
            .try_clone()
            .map(LogTarget::File)
            .unwrap_or(LogTarget::Stderr)
    }
}

/// Initializes file logging. Returns Err when the log file cannot be set
/// up; callers should then use [`init_logging_stderr`] instead.
pub fn init_logging() -> Result<()> {
    let path = log_path()?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating log directory {}", dir.display()))?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(default_filter())
        .with_writer(BoxMakeWriter::new(LogFile(file)))
        .with_ansi(false)
        .init();

    tracing::info!("logging to {}", path.display());
    Ok(())
}

/// Stderr-only init for when the log file is unavailable.
pub fn init_logging_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(default_filter())
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}
