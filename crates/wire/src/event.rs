// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed view of the engine's unsolicited events.

use serde::Deserialize;
use serde_json::Value;
use warden_core::{LogRecord, ProxyStatus, TrafficSample};

use crate::error::ProtocolError;

/// Payload of a `status` event, also found in `start`/`get_status` results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StatusReport {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub uptime_secs: Option<u64>,
}

impl StatusReport {
    /// Parsed status; `None` for names outside the lifecycle vocabulary.
    pub fn status(&self) -> Option<ProxyStatus> {
        ProxyStatus::parse(&self.status)
    }

    /// Extract a status report from a response `result`, if it carries one.
    pub fn from_result(result: &Value) -> Option<Self> {
        let status = result.get("status")?.as_str()?.to_string();
        let uptime_secs = result.get("uptime_secs").and_then(Value::as_u64);
        Some(Self { status, uptime_secs })
    }
}

/// Known engine events. Unknown names are kept so callers can log them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Log(LogRecord),
    Status(StatusReport),
    Stats(TrafficSample),
    Unknown { name: String },
}

impl EngineEvent {
    /// Interpret the `data` object of a named event.
    pub fn parse(name: &str, data: Value) -> Result<Self, ProtocolError> {
        let payload_err =
            |source| ProtocolError::EventPayload { event: name.to_string(), source };
        match name {
            "log" => {
                let record: LogRecord = serde_json::from_value(data).map_err(payload_err)?;
                Ok(EngineEvent::Log(LogRecord::new(
                    &record.level,
                    record.message,
                    record.timestamp,
                )))
            }
            "status" => Ok(EngineEvent::Status(serde_json::from_value(data).map_err(payload_err)?)),
            "stats" => Ok(EngineEvent::Stats(serde_json::from_value(data).map_err(payload_err)?)),
            _ => Ok(EngineEvent::Unknown { name: name.to_string() }),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
