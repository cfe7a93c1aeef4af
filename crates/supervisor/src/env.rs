// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the supervisor crate.

use std::path::PathBuf;
use std::time::Duration;

/// Engine executable override
pub fn engine_path() -> Option<PathBuf> {
    std::env::var("WARDEN_ENGINE_PATH").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// Heartbeat interval override
pub fn heartbeat_interval() -> Option<Duration> {
    duration_ms("WARDEN_HEARTBEAT_MS")
}

/// Graceful stop window before the engine is killed
pub fn stop_timeout() -> Option<Duration> {
    duration_ms("WARDEN_STOP_TIMEOUT_MS")
}

/// Ceiling on waiting for the engine process to launch
pub fn start_timeout() -> Option<Duration> {
    duration_ms("WARDEN_START_TIMEOUT_MS")
}

/// Consecutive unanswered heartbeats before the engine is declared hung.
/// `0` disables hang detection.
pub fn max_missed_heartbeats() -> Option<u32> {
    std::env::var("WARDEN_MAX_MISSED_HEARTBEATS").ok().and_then(|s| s.parse::<u32>().ok())
}

fn duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
