// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor for an external proxy engine speaking line-delimited JSON-RPC
//! over its stdio.
//!
//! One owner task holds the child process and multiplexes every input
//! (caller requests, stdout/stderr chunks, exit, heartbeat ticks, scheduled
//! restarts) through a single `select!` loop. Callers talk to it through a
//! cloneable [`SupervisorHandle`].

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod env;
mod error;
mod heartbeat;
mod observer;
mod pending;
mod process;
mod state;
mod stderr;
mod supervisor;

pub use config::{default_engine_path, Settings, SupervisorConfig, ENGINE_ARG, ENGINE_EXE};
pub use error::{ConfigError, SupervisorError};
pub use process::ExitKind;
pub use stderr::{MAX_STDERR_BYTES, TRUNCATION_MARKER};
pub use supervisor::{Supervisor, SupervisorHandle};

pub use warden_core::{LogRecord, Notification, ProxyStatus, Statistics};
