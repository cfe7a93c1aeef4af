// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Proxy lifecycle status and the transition table that guards it.
//!
//! ```text
//! Stopped ──▶ Starting ──▶ Running ──▶ Stopping ──▶ Stopped
//!                │            │           ▲
//!                └──▶ Error ◀─┘           │
//!                       ├──▶ Stopping ────┘
//!                       └──▶ Starting
//! ```
//!
//! `stop()` during `Starting` also goes straight to `Stopping`.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Lifecycle state of the supervised proxy engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProxyStatus {
    #[default]
    Stopped,
    Starting,
    Running,
    Stopping,
    Error,
}

impl ProxyStatus {
    /// Wire name, as carried in `status` events and results.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyStatus::Stopped => "stopped",
            ProxyStatus::Starting => "starting",
            ProxyStatus::Running => "running",
            ProxyStatus::Stopping => "stopping",
            ProxyStatus::Error => "error",
        }
    }

    /// Parse a wire name. Unknown names yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "stopped" => Some(ProxyStatus::Stopped),
            "starting" => Some(ProxyStatus::Starting),
            "running" => Some(ProxyStatus::Running),
            "stopping" => Some(ProxyStatus::Stopping),
            "error" => Some(ProxyStatus::Error),
            _ => None,
        }
    }

    /// Starting or Running: the engine is expected to be alive and heartbeating.
    pub fn is_active(&self) -> bool {
        matches!(self, ProxyStatus::Starting | ProxyStatus::Running)
    }

    /// Whether `start()` is accepted from this state.
    pub fn can_start(&self) -> bool {
        matches!(self, ProxyStatus::Stopped | ProxyStatus::Error)
    }

    /// Legal edges of the lifecycle graph. Self-edges are not listed here;
    /// [`StatusMachine::transition`] treats them as no-ops.
    pub fn can_transition_to(&self, next: ProxyStatus) -> bool {
        use ProxyStatus::*;
        matches!(
            (self, next),
            (Stopped, Starting)
                | (Starting, Running)
                | (Starting, Stopping)
                | (Starting, Error)
                | (Running, Stopping)
                | (Running, Error)
                | (Stopping, Stopped)
                | (Error, Starting)
                | (Error, Stopping)
        )
    }
}

impl fmt::Display for ProxyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid status transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: ProxyStatus,
    pub to: ProxyStatus,
}

/// Owns the current status and the last recorded error message.
///
/// Every mutation goes through [`transition`](Self::transition) or
/// [`fail`](Self::fail). Both return `Ok(true)` only when the value actually
/// changed, which is the caller's cue to publish a notification.
#[derive(Debug, Clone, Default)]
pub struct StatusMachine {
    current: ProxyStatus,
    last_error: Option<String>,
}

impl StatusMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> ProxyStatus {
        self.current
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn transition(&mut self, next: ProxyStatus) -> Result<bool, InvalidTransition> {
        if self.current == next {
            return Ok(false);
        }
        if !self.current.can_transition_to(next) {
            return Err(InvalidTransition { from: self.current, to: next });
        }
        self.current = next;
        Ok(true)
    }

    /// Record `message` and move to `Error`.
    ///
    /// The message is recorded even when the transition is rejected or is a
    /// no-op (already in `Error`), so the most recent failure is always readable.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<bool, InvalidTransition> {
        self.record_error(message);
        self.transition(ProxyStatus::Error)
    }

    /// Record `message` without changing the status.
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
