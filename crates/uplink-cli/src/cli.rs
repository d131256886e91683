use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use uplink_core::config::{self, SettingsSnapshot};
use uplink_core::coordinator::{JobCoordinator, JobState};

/// Top-level CLI for the uplink transfer orchestrator.
#[derive(Debug, Parser)]
#[command(name = "uplink")]
#[command(about = "uplink: upload one file and wait for remote processing", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Upload a file, trigger remote processing, and wait for the result URL.
    Send {
        /// Local file to upload.
        file: PathBuf,
    },

    /// Show the resolved configuration (secrets redacted).
    Config,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Send { file } => send(file).await,
            CliCommand::Config => show_config(),
        }
    }
}

async fn send(file: PathBuf) -> Result<()> {
    let settings = config::load_or_init()?;
    run_job(file, settings, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

/// Drives one full job: accept, start, then drain events until the run
/// settles. `shutdown` resolving cancels cooperatively; the future is
/// created once and re-polled across ticks so a signal arriving between
/// iterations is never missed.
async fn run_job(
    file: PathBuf,
    settings: SettingsSnapshot,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let mut coordinator = JobCoordinator::new();
    coordinator.accept_file(&file);
    coordinator.start(&file, settings);

    tokio::pin!(shutdown);

    let mut printed = 0usize;
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                coordinator.cancel();
                for line in &coordinator.status_log()[printed..] {
                    println!("{}", line);
                }
                return Ok(());
            }
            _ = tokio::time::sleep(Duration::from_millis(200)) => {}
        }

        coordinator.pump();

        let log = coordinator.status_log();
        for line in &log[printed..] {
            println!("{}", line);
        }
        printed = log.len();

        match coordinator.state() {
            JobState::Done { result_url } => {
                println!("result: {}", result_url);
                return Ok(());
            }
            JobState::Failed { message } => {
                anyhow::bail!("{}", message);
            }
            JobState::Running { progress, .. } => {
                tracing::debug!("running, progress {:.1}%", progress * 100.0);
            }
            JobState::Idle | JobState::Ready { .. } => {
                // Cancelled (or never started); the log already says why.
                return Ok(());
            }
        }
    }
}

fn show_config() -> Result<()> {
    let path = config::config_path()?;
    let settings = config::load_or_init()?;
    println!("config file: {}", path.display());
    println!("host:         {}", settings.host);
    println!("port:         {}", settings.port);
    println!("username:     {}", settings.username);
    println!("password:     {}", redact(&settings.password));
    println!("api_base_url: {}", settings.api_base_url);
    println!("api_token:    {}", redact(&settings.api_token));
    Ok(())
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "(unset)"
    } else {
        "********"
    }
}
