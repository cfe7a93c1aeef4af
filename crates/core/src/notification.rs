// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notifications published by the supervisor to the host application.
//!
//! Serializes with `{"type": "status:changed", ...fields}` format.

use crate::log::LogRecord;
use crate::stats::Statistics;
use crate::status::ProxyStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Notification {
    /// Published only when the status value actually changes.
    #[serde(rename = "status:changed")]
    StatusChanged { status: ProxyStatus },

    #[serde(rename = "log:received")]
    LogReceived {
        #[serde(flatten)]
        record: LogRecord,
    },

    #[serde(rename = "stats:updated")]
    StatisticsUpdated { stats: Statistics },

    #[serde(rename = "error:occurred")]
    ErrorOccurred { message: String },
}

impl Notification {
    pub fn name(&self) -> &'static str {
        match self {
            Notification::StatusChanged { .. } => "status:changed",
            Notification::LogReceived { .. } => "log:received",
            Notification::StatisticsUpdated { .. } => "stats:updated",
            Notification::ErrorOccurred { .. } => "error:occurred",
        }
    }
}

#[cfg(test)]
#[path = "notification_tests.rs"]
mod tests;
