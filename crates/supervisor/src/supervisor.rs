// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The owner task and its handle.
//!
//! Every input is serialized through one `select!` loop. Stdout is decoded
//! at most `line_budget` lines per turn; leftover lines are drained on a
//! later turn so stop requests and heartbeat ticks stay responsive while the
//! engine floods. While lines are pending, stdout is not read, so the pipe
//! fills and the engine blocks on write. An exit is applied only once the
//! output it left behind has been decoded under the same budget.

use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, error, info, warn, Instrument};
use warden_core::{LogRecord, Notification, ProxyStatus, Statistics};
use warden_wire::{Encoder, LineFramer, Method};

use crate::config::SupervisorConfig;
use crate::error::SupervisorError;
use crate::heartbeat::{Beat, Heartbeat};
use crate::observer::{self, Watchers};
use crate::process::{EngineProcess, ExitKind, ProcessEvent};
use crate::state::EngineState;
use crate::stderr::StderrCapture;

/// How long to wait for the reader tasks to hand over the last output of an
/// exited engine.
const EXIT_DRAIN: Duration = Duration::from_millis(250);

const REQUEST_QUEUE: usize = 32;

enum Request {
    Start { config: Value, reply: oneshot::Sender<bool> },
    Stop { reply: oneshot::Sender<bool> },
    Restart { reply: oneshot::Sender<bool> },
    Shutdown { reply: oneshot::Sender<()> },
}

struct PendingRestart {
    at: Instant,
    config: Value,
    reply: oneshot::Sender<bool>,
}

/// Supervises one engine process. Construct with [`Supervisor::spawn`].
pub struct Supervisor {
    config: SupervisorConfig,
    state: EngineState,
    encoder: Encoder,
    framer: LineFramer,
    stderr: StderrCapture,
    heartbeat: Heartbeat,
    engine: Option<EngineProcess>,
    drain_pending: bool,
    /// Failure message of an exited engine whose output is still draining.
    exited: Option<String>,
    last_start_config: Option<Value>,
    restart: Option<PendingRestart>,
    requests: mpsc::Receiver<Request>,
}

impl Supervisor {
    /// Start the owner task on the current tokio runtime.
    pub fn spawn(config: SupervisorConfig) -> SupervisorHandle {
        let (supervisor, handle) = Supervisor::new(config);
        let span = tracing::info_span!("supervisor", engine = %supervisor.config.engine_path.display());
        tokio::spawn(supervisor.run().instrument(span));
        handle
    }

    fn new(config: SupervisorConfig) -> (Self, SupervisorHandle) {
        let (tx, rx) = mpsc::channel(REQUEST_QUEUE);
        let (observers, watchers) = observer::channel(config.notification_capacity);
        let supervisor = Supervisor {
            state: EngineState::new(observers),
            encoder: Encoder::new(),
            framer: LineFramer::with_max_line(config.max_line_bytes),
            stderr: StderrCapture::new(config.max_stderr_bytes),
            heartbeat: Heartbeat::new(config.heartbeat_interval, config.max_missed_heartbeats),
            engine: None,
            drain_pending: false,
            exited: None,
            last_start_config: None,
            restart: None,
            requests: rx,
            config,
        };
        (supervisor, SupervisorHandle { requests: tx, watchers })
    }

    async fn run(mut self) {
        loop {
            tokio::select! {
                request = self.requests.recv() => match request {
                    Some(Request::Shutdown { reply }) => {
                        self.cancel_restart();
                        self.stop().await;
                        let _ = reply.send(());
                        break;
                    }
                    Some(request) => self.handle_request(request).await,
                    None => {
                        debug!("all handles dropped");
                        self.cancel_restart();
                        self.stop().await;
                        break;
                    }
                },
                event = next_process_event(&mut self.engine, !self.drain_pending) => {
                    self.on_process_event(event).await;
                }
                _ = self.heartbeat.tick() => self.on_heartbeat().await,
                _ = restart_due(&self.restart) => self.on_restart_due().await,
                _ = stderr_due(self.stderr.due()) => self.flush_stderr(),
                _ = std::future::ready(()), if self.drain_pending => self.drain_lines(),
            }
        }
        debug!("supervisor task exiting");
    }

    async fn handle_request(&mut self, request: Request) {
        match request {
            Request::Start { config, reply } => {
                self.cancel_restart();
                let ok = self.start(config).await;
                let _ = reply.send(ok);
            }
            Request::Stop { reply } => {
                self.cancel_restart();
                let ok = self.stop().await;
                let _ = reply.send(ok);
            }
            Request::Restart { reply } => {
                self.cancel_restart();
                self.stop().await;
                let config = self.last_start_config.clone().unwrap_or_else(|| json!({}));
                let at = Instant::now() + self.config.restart_delay;
                debug!(delay_ms = self.config.restart_delay.as_millis() as u64, "restart scheduled");
                self.restart = Some(PendingRestart { at, config, reply });
            }
            Request::Shutdown { reply } => {
                let _ = reply.send(());
            }
        }
    }

    async fn start(&mut self, config: Value) -> bool {
        let status = self.state.status();
        if !status.can_start() {
            debug!(%status, "start ignored");
            return false;
        }
        let config = match config {
            Value::Null => json!({}),
            Value::Object(_) => config,
            _ => {
                self.state.report_error("proxy configuration must be a JSON object");
                return false;
            }
        };
        self.finish_exit();
        // An engine left alive in Error (e.g. it rejected `start`) goes first.
        if self.engine.is_some() {
            self.send_command(Method::Stop, &json!({})).await;
            self.shutdown_engine().await;
            self.state.pending.clear();
        }

        self.state.clear_error();
        self.state.set_status(ProxyStatus::Starting);

        // Spawning execs the binary and can block on a slow filesystem.
        let launch = tokio::task::spawn_blocking({
            let config = self.config.clone();
            move || EngineProcess::launch(&config)
        });
        let engine = match tokio::time::timeout(self.config.start_timeout, launch).await {
            Ok(Ok(Ok(engine))) => engine,
            Ok(Ok(Err(e))) => {
                self.state.fail(e.to_string());
                return false;
            }
            Ok(Err(e)) => {
                self.state.fail(format!("engine launch aborted: {e}"));
                return false;
            }
            Err(_) => {
                self.state.fail(SupervisorError::StartTimeout(self.config.start_timeout).to_string());
                return false;
            }
        };
        info!(pid = engine.pid(), "engine started");
        self.engine = Some(engine);
        self.framer.reset();
        self.drain_pending = false;

        self.send_command(Method::Start, &config).await;
        self.last_start_config = Some(config);
        self.heartbeat.start();
        true
    }

    async fn stop(&mut self) -> bool {
        self.finish_exit();
        let status = self.state.status();
        if status == ProxyStatus::Stopped {
            debug!("stop ignored, already stopped");
            return false;
        }
        self.state.set_status(ProxyStatus::Stopping);
        self.heartbeat.stop();
        self.send_command(Method::Stop, &json!({})).await;
        self.shutdown_engine().await;
        self.settle_output();

        if !self.state.pending.is_empty() {
            debug!(dropped = self.state.pending.clear(), "dropped unanswered requests");
        }
        self.state.set_status(ProxyStatus::Stopped);
        self.state.reset_stats();
        true
    }

    /// Wait up to `stop_timeout` for the engine to exit, decoding its output
    /// meanwhile, then kill it. No status changes.
    async fn shutdown_engine(&mut self) {
        let Some(mut engine) = self.engine.take() else {
            return;
        };
        let pid = engine.pid();
        engine.close_stdin();
        let grace = tokio::time::sleep(self.config.stop_timeout);
        tokio::pin!(grace);
        let exited = loop {
            tokio::select! {
                event = engine.next_event(!self.drain_pending) => match event {
                    ProcessEvent::Exited(status) => break Some(status),
                    other => self.on_output(other),
                },
                _ = std::future::ready(()), if self.drain_pending => self.drain_lines(),
                _ = &mut grace => break None,
            }
        };
        match exited {
            Some(Ok(status)) => info!(pid, %status, "engine exited"),
            Some(Err(e)) => warn!(pid, error = %e, "failed to observe engine exit"),
            None => {
                warn!(pid, timeout_ms = self.config.stop_timeout.as_millis() as u64, "engine did not exit, killing");
                if let Err(e) = engine.kill().await {
                    debug!(pid, error = %e, "kill failed");
                }
            }
        }
        self.settle_output();
    }

    async fn on_process_event(&mut self, event: ProcessEvent) {
        match event {
            ProcessEvent::Exited(status) => self.on_exit(status).await,
            other => self.on_output(other),
        }
    }

    fn on_output(&mut self, event: ProcessEvent) {
        match event {
            ProcessEvent::Stdout(chunk) => {
                self.framer.push(&chunk);
                self.drain_lines();
            }
            ProcessEvent::Stderr(chunk) => self.on_stderr(chunk),
            ProcessEvent::ReadError { stream, error } => {
                self.state.report_error(format!("read error from engine {stream}: {error}"));
            }
            ProcessEvent::Exited(_) => {}
        }
    }

    /// Decode up to `line_budget` complete lines; defer the rest.
    fn drain_lines(&mut self) {
        let mut handled = 0;
        while handled < self.config.line_budget {
            let Some(line) = self.framer.next_line() else {
                break;
            };
            handled += 1;
            if self.state.handle_line(&line) {
                self.heartbeat.record_activity();
            }
        }
        self.drain_pending = self.framer.has_complete_line();
        if self.drain_pending {
            debug!(handled, buffered = self.framer.buffered(), "line budget spent, yielding");
        } else {
            self.finish_exit();
        }
        self.sync_heartbeat();
    }

    fn on_stderr(&mut self, chunk: Vec<u8>) {
        self.stderr.push(&chunk, Instant::now());
    }

    /// Emit the open stderr batch as an `ERROR` log record.
    fn flush_stderr(&mut self) {
        if let Some(text) = self.stderr.take() {
            let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string();
            self.state.log(LogRecord::new("ERROR", text, timestamp));
        }
    }

    /// Emit captured stderr and drop undecoded stdout.
    fn settle_output(&mut self) {
        self.flush_stderr();
        if self.drain_pending {
            debug!(buffered = self.framer.buffered(), "discarding undecoded engine output");
        }
        self.framer.reset();
        self.drain_pending = false;
    }

    /// Collect the engine's last output and decode it under the line budget.
    /// The exit itself is applied by [`Self::finish_exit`] once that is done.
    async fn on_exit(&mut self, status: std::io::Result<std::process::ExitStatus>) {
        let Some(mut engine) = self.engine.take() else {
            return;
        };
        let pid = engine.pid();
        let (stdout, stderr) = engine.drain_output(EXIT_DRAIN).await;
        self.stderr.push(&stderr, Instant::now());
        self.flush_stderr();
        self.heartbeat.stop();

        let message = match status {
            Ok(status) => {
                let kind = ExitKind::classify(status);
                info!(pid, ?kind, "engine exited");
                kind.describe()
            }
            Err(e) => format!("failed to observe engine exit: {e}"),
        };
        self.exited = Some(message);
        self.framer.push(&stdout);
        self.drain_lines();
    }

    fn finish_exit(&mut self) {
        let Some(message) = self.exited.take() else {
            return;
        };
        self.settle_output();
        if !self.state.pending.is_empty() {
            debug!(dropped = self.state.pending.clear(), "dropped unanswered requests");
        }
        match self.state.status() {
            ProxyStatus::Stopping => {
                self.state.set_status(ProxyStatus::Stopped);
                self.state.reset_stats();
            }
            ProxyStatus::Stopped => {}
            _ => self.state.fail(message),
        }
    }

    async fn on_heartbeat(&mut self) {
        let expired = self.state.pending.expire(Instant::now(), self.config.request_timeout);
        for (id, request) in expired {
            warn!(id, method = %request.method, "request timed out");
        }
        match self.heartbeat.on_tick() {
            Beat::Probe => {
                debug!(missed = self.heartbeat.missed(), inflight = self.state.pending.len(), "heartbeat");
                self.send_command(Method::GetStatus, &json!({})).await;
            }
            Beat::Hung { missed } => {
                error!(missed, "engine not responding, killing");
                self.heartbeat.stop();
                if let Some(mut engine) = self.engine.take() {
                    if let Err(e) = engine.kill().await {
                        debug!(error = %e, "kill failed");
                    }
                }
                self.settle_output();
                self.state.pending.clear();
                self.state.fail(format!("engine stopped responding ({missed} heartbeats missed)"));
            }
        }
    }

    async fn on_restart_due(&mut self) {
        let Some(restart) = self.restart.take() else {
            return;
        };
        let ok = self.start(restart.config).await;
        let _ = restart.reply.send(ok);
    }

    fn cancel_restart(&mut self) {
        if let Some(restart) = self.restart.take() {
            debug!("pending restart cancelled");
            let _ = restart.reply.send(false);
        }
    }

    /// The heartbeat runs only while the proxy is active.
    fn sync_heartbeat(&mut self) {
        if !self.state.status().is_active() && self.heartbeat.is_running() {
            self.heartbeat.stop();
        }
    }

    /// Encode and write one command. No-op when the engine is not running.
    async fn send_command<P: Serialize + ?Sized>(&mut self, method: Method, params: &P) -> Option<u64> {
        let Some(engine) = self.engine.as_mut() else {
            return None;
        };
        if !engine.is_running() {
            debug!(%method, "engine not running, command dropped");
            return None;
        }
        let (line, id) = match self.encoder.encode(method.as_str(), params) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(%method, error = %e, "failed to encode command");
                return None;
            }
        };
        self.state.pending.insert(id, method, Instant::now());
        match engine.write_line(&line, self.config.write_timeout).await {
            Ok(()) => debug!(id, %method, "command sent"),
            Err(e) => {
                self.state.pending.resolve(id);
                if self.state.status().is_active() {
                    self.state.report_error(e.to_string());
                } else {
                    warn!(id, %method, error = %e, "failed to send command");
                }
            }
        }
        Some(id)
    }
}

async fn next_process_event(engine: &mut Option<EngineProcess>, read_stdout: bool) -> ProcessEvent {
    match engine {
        Some(engine) => engine.next_event(read_stdout).await,
        None => std::future::pending().await,
    }
}

async fn restart_due(restart: &Option<PendingRestart>) {
    match restart {
        Some(restart) => tokio::time::sleep_until(restart.at).await,
        None => std::future::pending().await,
    }
}

async fn stderr_due(due: Option<Instant>) {
    match due {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Cloneable handle to a running [`Supervisor`].
///
/// Dropping the last handle stops the engine and ends the owner task.
#[derive(Debug, Clone)]
pub struct SupervisorHandle {
    requests: mpsc::Sender<Request>,
    watchers: Watchers,
}

impl SupervisorHandle {
    /// Launch the engine and send it `config`. Returns `false` without
    /// side effects when already starting or running; `false` after moving
    /// to `Error` when the launch fails.
    pub async fn start(&self, config: Value) -> Result<bool, SupervisorError> {
        self.call(|reply| Request::Start { config, reply }).await
    }

    /// Graceful stop, escalating to kill. Returns `false` when already stopped.
    pub async fn stop(&self) -> Result<bool, SupervisorError> {
        self.call(|reply| Request::Stop { reply }).await
    }

    /// Stop, wait `restart_delay`, then start again with the last accepted
    /// configuration. Resolves with the result of the new start, or `false`
    /// if a start or stop request cancelled it.
    pub async fn restart(&self) -> Result<bool, SupervisorError> {
        self.call(|reply| Request::Restart { reply }).await
    }

    /// Stop the engine and end the owner task.
    pub async fn shutdown(&self) -> Result<(), SupervisorError> {
        self.call(|reply| Request::Shutdown { reply }).await
    }

    pub fn status(&self) -> ProxyStatus {
        *self.watchers.status.borrow()
    }

    pub fn statistics(&self) -> Statistics {
        *self.watchers.stats.borrow()
    }

    pub fn last_error(&self) -> Option<String> {
        self.watchers.last_error.lock().clone()
    }

    /// Notifications published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.watchers.events.subscribe()
    }

    pub fn watch_status(&self) -> tokio::sync::watch::Receiver<ProxyStatus> {
        self.watchers.status.clone()
    }

    pub fn watch_statistics(&self) -> tokio::sync::watch::Receiver<Statistics> {
        self.watchers.stats.clone()
    }

    async fn call<T>(&self, request: impl FnOnce(oneshot::Sender<T>) -> Request) -> Result<T, SupervisorError> {
        let (tx, rx) = oneshot::channel();
        self.requests.send(request(tx)).await.map_err(|_| SupervisorError::Closed)?;
        rx.await.map_err(|_| SupervisorError::Closed)
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
