// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor state that does not touch the process: status machine,
//! statistics, in-flight requests, and the reaction to decoded messages.

use serde_json::Value;
use tracing::{debug, error, info, warn};
use warden_core::{LogRecord, Notification, ProxyStatus, Statistics, StatusMachine};
use warden_wire::{decode, EngineEvent, Message, Method, RpcError, StatusReport};

use crate::observer::Observers;
use crate::pending::PendingRequests;

/// Longest slice of a rejected line echoed into the log.
const PREVIEW_CHARS: usize = 200;

#[derive(Debug)]
pub(crate) struct EngineState {
    machine: StatusMachine,
    stats: Statistics,
    pub(crate) pending: PendingRequests,
    observers: Observers,
}

impl EngineState {
    pub(crate) fn new(observers: Observers) -> Self {
        Self {
            machine: StatusMachine::new(),
            stats: Statistics::default(),
            pending: PendingRequests::default(),
            observers,
        }
    }

    pub(crate) fn status(&self) -> ProxyStatus {
        self.machine.current()
    }

    /// Validated transition; publishes only on an actual change.
    pub(crate) fn set_status(&mut self, next: ProxyStatus) -> bool {
        match self.machine.transition(next) {
            Ok(true) => {
                info!(status = %next, "status changed");
                self.observers.status(next);
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!(error = %e, "ignoring status change");
                false
            }
        }
    }

    /// Record `message`, move to `Error`, and notify.
    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!(%message, "engine failed");
        let changed = self.machine.fail(message.clone());
        self.observers.last_error(self.machine.last_error());
        match changed {
            Ok(true) => self.observers.status(ProxyStatus::Error),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "cannot enter error state"),
        }
        self.observers.notify(Notification::ErrorOccurred { message });
    }

    /// Record and notify an error without touching the status.
    pub(crate) fn report_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(%message, "engine reported an error");
        self.machine.record_error(message.clone());
        self.observers.last_error(self.machine.last_error());
        self.observers.notify(Notification::ErrorOccurred { message });
    }

    pub(crate) fn clear_error(&mut self) {
        self.machine.clear_error();
        self.observers.last_error(None);
    }

    /// Zero the counters, notifying only if something changed.
    pub(crate) fn reset_stats(&mut self) {
        if self.stats.reset() {
            self.observers.stats(&self.stats);
        }
    }

    pub(crate) fn log(&self, record: LogRecord) {
        match record.level.as_str() {
            "ERROR" => error!(target: "engine", "{}", record.message),
            "WARN" | "WARNING" => warn!(target: "engine", "{}", record.message),
            "DEBUG" | "TRACE" => debug!(target: "engine", "{}", record.message),
            _ => info!(target: "engine", "{}", record.message),
        }
        self.observers.notify(Notification::LogReceived { record });
    }

    /// Decode and apply one stdout line. Returns `true` when the line was a
    /// well-formed protocol message.
    pub(crate) fn handle_line(&mut self, line: &str) -> bool {
        match decode(line) {
            Ok(Message::Event { name, data }) => {
                self.handle_event(&name, data);
                true
            }
            Ok(Message::Response { id, outcome }) => {
                self.handle_response(id, outcome);
                true
            }
            Err(e) => {
                warn!(error = %e, line = preview(line), "discarding malformed line");
                false
            }
        }
    }

    fn handle_event(&mut self, name: &str, data: Value) {
        match EngineEvent::parse(name, data) {
            Ok(EngineEvent::Log(record)) => self.log(record),
            Ok(EngineEvent::Status(report)) => self.apply_status_event(&report),
            Ok(EngineEvent::Stats(sample)) => {
                self.stats.apply_sample(&sample);
                self.observers.stats(&self.stats);
            }
            Ok(EngineEvent::Unknown { name }) => debug!(event = %name, "ignoring unknown event"),
            Err(e) => warn!(error = %e, "discarding event"),
        }
    }

    fn apply_status_event(&mut self, report: &StatusReport) {
        if let Some(uptime) = report.uptime_secs {
            self.stats.set_uptime(uptime);
            self.observers.stats_snapshot(&self.stats);
        }
        let Some(reported) = report.status() else {
            warn!(status = %report.status, "unknown engine status");
            return;
        };
        let current = self.status();
        match reported {
            ProxyStatus::Running if current == ProxyStatus::Starting => {
                self.set_status(ProxyStatus::Running);
            }
            ProxyStatus::Error if current.is_active() => self.fail("engine reported an error state"),
            _ => debug!(%reported, %current, "engine status noted"),
        }
    }

    fn handle_response(&mut self, id: u64, outcome: Result<Value, RpcError>) {
        let Some(request) = self.pending.resolve(id) else {
            warn!(id, "response for unknown request");
            return;
        };
        debug!(id, method = %request.method, elapsed_ms = request.sent_at.elapsed().as_millis() as u64, "response");
        match outcome {
            Ok(result) => {
                let confirmed = StatusReport::from_result(&result)
                    .and_then(|r| r.status())
                    .is_some_and(|s| matches!(s, ProxyStatus::Starting | ProxyStatus::Running));
                if confirmed && self.status() == ProxyStatus::Starting {
                    self.set_status(ProxyStatus::Running);
                }
            }
            Err(err) => {
                let message = if err.message.is_empty() {
                    format!("engine rejected {}", request.method)
                } else {
                    err.message
                };
                if request.method == Method::Start && self.status() == ProxyStatus::Starting {
                    self.fail(message);
                } else {
                    self.report_error(message);
                }
            }
        }
    }
}

fn preview(line: &str) -> &str {
    match line.char_indices().nth(PREVIEW_CHARS) {
        Some((i, _)) => &line[..i],
        None => line,
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
