// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log lines surfaced from the engine, either structured `log` events or
//! captured stderr.

use serde::{Deserialize, Serialize};

/// A single log line forwarded to observers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogRecord {
    pub level: String,
    pub message: String,
    pub timestamp: String,
}

impl LogRecord {
    /// Build a record with the level normalized to upper case.
    pub fn new(
        level: impl AsRef<str>,
        message: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            level: level.as_ref().to_uppercase(),
            message: message.into(),
            timestamp: timestamp.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == "ERROR"
    }
}
