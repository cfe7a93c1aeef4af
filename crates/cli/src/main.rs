// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `warden`: run the proxy engine under supervision from a terminal.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod color;
mod display;
mod logging;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use warden_core::{Notification, ProxyStatus};
use warden_supervisor::{Supervisor, SupervisorConfig, SupervisorHandle};

use crate::output::OutputFormat;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("WARDEN_GIT_HASH"), ")");

#[derive(Parser)]
#[command(name = "warden", version = VERSION, styles = color::styles())]
#[command(about = "Supervise the proxy engine over stdio JSON-RPC")]
struct Cli {
    /// Write diagnostics to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the engine and stream its notifications until interrupted
    Run(RunArgs),
    /// Print the resolved supervisor configuration
    Config {
        /// TOML settings file
        #[arg(long)]
        settings: Option<PathBuf>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Proxy configuration (JSON object) sent with `start`
    #[arg(long, short)]
    config: PathBuf,

    /// Engine executable (default: next to this binary)
    #[arg(long)]
    engine: Option<PathBuf>,

    /// TOML settings file
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Restart the engine after it fails instead of exiting
    #[arg(long)]
    restart_on_failure: bool,

    /// Consecutive failed runs to restart before giving up
    #[arg(long, default_value_t = 5, requires = "restart_on_failure")]
    max_restarts: u32,

    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = match logging::init(cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("warden: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    let result = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt.block_on(dispatch(cli.command)),
        Err(e) => Err(anyhow::Error::new(e).context("starting runtime")),
    };
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("warden: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(command: Command) -> anyhow::Result<ExitCode> {
    match command {
        Command::Run(args) => run(args).await,
        Command::Config { settings } => {
            let config = SupervisorConfig::load(settings.as_deref())?;
            println!("{config:#?}");
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run(args: RunArgs) -> anyhow::Result<ExitCode> {
    let proxy_config = read_proxy_config(&args.config)?;
    let mut config = SupervisorConfig::load(args.settings.as_deref())?;
    if let Some(engine) = args.engine {
        config.engine_path = engine;
    }
    info!(engine = %config.engine_path.display(), "launching");

    let handle = Supervisor::spawn(config);
    let mut events = handle.subscribe();
    let started = handle.start(proxy_config).await?;

    let mut failed = !started;
    let mut restarts = RestartBudget::new(if args.restart_on_failure { args.max_restarts } else { 0 });
    if started {
        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(notification) => {
                        output::print_notification(args.format, &notification)?;
                        let Notification::StatusChanged { status } = notification else {
                            continue;
                        };
                        match status {
                            ProxyStatus::Running => restarts.reset(),
                            ProxyStatus::Error if restarts.take() => spawn_restart(&handle),
                            ProxyStatus::Error => {
                                if args.restart_on_failure {
                                    warn!(restarts = args.max_restarts, "engine keeps failing, giving up");
                                }
                                failed = true;
                                break;
                            }
                            _ => {}
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => warn!(skipped, "notifications dropped"),
                    Err(RecvError::Closed) => break,
                },
                _ = &mut shutdown => {
                    info!("interrupted, stopping engine");
                    break;
                }
            }
        }
    }

    handle.stop().await?;
    flush(&mut events, args.format)?;
    handle.shutdown().await?;
    if let Some(error) = handle.last_error().filter(|_| failed) {
        eprintln!("warden: {error}");
    }
    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

fn read_proxy_config(path: &std::path::Path) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: Value = serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    anyhow::ensure!(value.is_object(), "{}: proxy configuration must be a JSON object", path.display());
    Ok(value)
}

/// Restarts left before a failing engine is given up on. Reaching `Running`
/// refills it.
#[derive(Debug)]
struct RestartBudget {
    max: u32,
    used: u32,
}

impl RestartBudget {
    fn new(max: u32) -> Self {
        Self { max, used: 0 }
    }

    fn take(&mut self) -> bool {
        if self.used >= self.max {
            return false;
        }
        self.used += 1;
        true
    }

    fn reset(&mut self) {
        self.used = 0;
    }
}

fn spawn_restart(handle: &SupervisorHandle) {
    let handle = handle.clone();
    tokio::spawn(async move {
        match handle.restart().await {
            Ok(true) => info!("engine restarted"),
            Ok(false) => warn!("restart did not start the engine"),
            Err(e) => warn!(error = %e, "restart failed"),
        }
    });
}

/// Print notifications already queued.
fn flush(
    events: &mut tokio::sync::broadcast::Receiver<Notification>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    while let Ok(notification) = events.try_recv() {
        output::print_notification(format, &notification)?;
    }
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
