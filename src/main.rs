//! neuroscroll: pipeline controller and scene sequencer for the brain
//! foundation-model demo
//!
//! Drives the demo narrative from the terminal:
//! - Access gate checked once at start
//! - Hero walkthrough auto-playing through its scenes
//! - Upload → model → task → processing → results pipeline
//! - Stdin navigation keys for the walkthrough (interactive mode)
//!
//! All processing is simulated on timers and all results are canned.

mod config;
mod events;
mod gate;
mod hero;
mod lifecycle;
mod pipeline;
mod runtime;
mod sequencer;
mod timing;

use std::path::PathBuf;
#[cfg(test)]
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::events::DemoEvent;
use crate::gate::AccessGate;
use crate::hero::HeroCue;
use crate::lifecycle::ShutdownSignal;
use crate::pipeline::{Modality, Task};
use crate::runtime::{Command, DemoApp, InputListener};

#[derive(Debug, Parser)]
#[command(name = "neuroscroll", version, about = "Brain foundation-model demo walkthrough")]
struct Cli {
    /// Uploaded data file; only its name is used to detect the modality
    #[arg(long)]
    file: Option<PathBuf>,

    /// Prediction task (mci-ad, mdd-dx, ocd-dx, treatment)
    #[arg(long)]
    task: Option<Task>,

    /// Access code for the demo
    #[arg(long, default_value = "")]
    code: String,

    /// Read navigation keys from stdin and keep running until interrupted
    #[arg(long)]
    interactive: bool,
}

/// When a run that is not interactive has nothing left to show
#[derive(Debug, Clone, Copy)]
struct ExitPolicy {
    interactive: bool,
    has_task: bool,
    autoplay: bool,
}

impl ExitPolicy {
    /// Whether `event` ends the run
    ///
    /// With a task the run ends once results are shown. Without one it ends
    /// when the hero hands off, or after the intro when the hero is not
    /// auto-playing and so never hands off.
    fn is_done(&self, event: &DemoEvent) -> bool {
        if self.interactive {
            return false;
        }
        match event {
            DemoEvent::ResultsReady { .. } => true,
            _ if self.has_task => false,
            DemoEvent::SceneHandoff => self.autoplay,
            DemoEvent::HeroCue {
                cue: HeroCue::SequenceComplete,
            } => !self.autoplay,
            _ => false,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!(version = env!("CARGO_PKG_VERSION"), "neuroscroll starting");

    let config = Config::load().context("failed to load configuration")?;
    info!(
        auto_advance_ms = config.auto_advance.as_millis() as u64,
        autoplay = config.autoplay,
        steps = config.processing_steps.len(),
        "configuration loaded"
    );

    let mut gate = AccessGate::new(config.access_code.clone());
    if !gate.try_unlock(&cli.code) {
        bail!("access code rejected");
    }

    let policy = ExitPolicy {
        interactive: cli.interactive,
        has_task: cli.task.is_some(),
        autoplay: config.autoplay,
    };

    // Runtime -> observers
    let (event_tx, mut event_rx) = broadcast::channel::<DemoEvent>(256);
    // Observers -> runtime
    let (command_tx, command_rx) = mpsc::channel(32);

    let runtime = tokio::spawn(DemoApp::new(config, event_tx).run(command_rx));

    for command in [Command::MountHero, Command::PlayIntro, Command::StartHeadline] {
        command_tx.send(command).await.context("runtime stopped")?;
    }

    if cli.interactive {
        InputListener::new(command_tx.clone())
            .spawn()
            .context("failed to start input listener")?;
    }

    if let Some(file) = &cli.file {
        let modality = Modality::detect(file);
        if modality.model().is_none() {
            warn!(file = %file.display(), "unrecognised file type, no model selected");
        }
        command_tx.send(Command::SetModality(modality)).await?;
    }

    if let Some(task) = cli.task {
        command_tx.send(Command::SetTask(Some(task))).await?;
        command_tx.send(Command::StartProcessing).await?;
    }

    let shutdown = ShutdownSignal::new();

    info!("demo running");

    tokio::select! {
        _ = async {
            loop {
                let event = match event_rx.recv().await {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "event receiver lagged");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };

                match &event {
                    DemoEvent::HeadlineChanged { .. }
                    | DemoEvent::ProcessingProgress { .. }
                    | DemoEvent::ResultsCountUp { .. } => debug!(%event, "demo event"),
                    DemoEvent::ModalityDetected {
                        modality,
                        model: Some(model),
                    } => info!(%modality, %model, about = model.description(), "model selected"),
                    DemoEvent::ResultsReady { .. } => {
                        if let Err(e) = print_results(&command_tx).await {
                            error!(?e, "failed to fetch results");
                        }
                    }
                    DemoEvent::SceneHandoff => {
                        info!("hero handed off to the upload section");
                        if command_tx.send(Command::UnmountHero).await.is_err() {
                            break;
                        }
                    }
                    _ => info!(%event, "demo event"),
                }

                if policy.is_done(&event) {
                    break;
                }
            }
        } => {
            info!("demo finished");
        }

        result = shutdown.wait() => {
            match result {
                Ok(signal) => info!(signal, "shutdown signal received"),
                Err(e) => error!(?e, "failed to listen for shutdown signals"),
            }
        }
    }

    info!("shutting down...");
    log_final_state(&command_tx).await;

    // The input listener may still hold a sender, so stop the runtime explicitly
    let _ = command_tx.send(Command::Shutdown).await;
    drop(command_tx);
    if let Err(e) = runtime.await {
        error!(?e, "runtime task failed");
    }

    info!("neuroscroll stopped");

    Ok(())
}

/// Fetch the result record and print it as JSON on stdout
async fn print_results(command_tx: &mpsc::Sender<Command>) -> Result<()> {
    let (reply_tx, reply_rx) = oneshot::channel();
    command_tx.send(Command::Results(reply_tx)).await?;

    match reply_rx.await? {
        Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        None => warn!("processing finished without a task; no results to show"),
    }
    Ok(())
}

async fn log_final_state(command_tx: &mpsc::Sender<Command>) {
    let (reply_tx, reply_rx) = oneshot::channel();
    if command_tx.send(Command::Snapshot(reply_tx)).await.is_err() {
        return;
    }
    if let Ok(snapshot) = reply_rx.await {
        info!(
            stage = %snapshot.stage,
            modality = %snapshot.modality,
            task = ?snapshot.task,
            "final pipeline state"
        );
    }
}
