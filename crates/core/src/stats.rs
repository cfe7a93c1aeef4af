// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traffic and connection counters folded from engine telemetry.

use serde::{Deserialize, Serialize};

/// Counters reported by a single `stats` event.
///
/// Missing fields default to zero so a partial payload still replaces the
/// snapshot wholesale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficSample {
    pub upload_bytes: u64,
    pub download_bytes: u64,
    pub active_connections: u32,
    pub total_connections: u64,
}

/// Aggregate statistics snapshot handed to observers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub upload_bytes: u64,
    pub download_bytes: u64,
    pub active_connections: u32,
    pub total_connections: u64,
    pub uptime_seconds: u64,
}

impl Statistics {
    /// Replace the four traffic counters. Uptime is left untouched.
    pub fn apply_sample(&mut self, sample: &TrafficSample) {
        self.upload_bytes = sample.upload_bytes;
        self.download_bytes = sample.download_bytes;
        self.active_connections = sample.active_connections;
        self.total_connections = sample.total_connections;
    }

    /// Update only the uptime counter.
    pub fn set_uptime(&mut self, seconds: u64) {
        self.uptime_seconds = seconds;
    }

    pub fn is_zero(&self) -> bool {
        *self == Statistics::default()
    }

    /// Zero every counter. Returns whether anything changed.
    pub fn reset(&mut self) -> bool {
        let changed = !self.is_zero();
        *self = Statistics::default();
        changed
    }
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;
