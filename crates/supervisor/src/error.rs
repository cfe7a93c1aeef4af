// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors from launching and talking to the engine process.
///
/// Engine misbehaviour never reaches callers as an error: it becomes a status
/// transition plus a notification. Callers only see [`SupervisorError::Closed`].
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to start engine `{}`: {source}", path.display())]
    Spawn { path: PathBuf, source: std::io::Error },

    #[error("engine did not start within {0:?}")]
    StartTimeout(Duration),

    #[error("engine {0} pipe unavailable")]
    MissingPipe(&'static str),

    #[error("engine stdin is closed")]
    StdinClosed,

    #[error("write to engine failed: {0}")]
    Write(#[source] std::io::Error),

    #[error("write to engine timed out after {0:?}")]
    WriteTimeout(Duration),

    #[error("supervisor task is not running")]
    Closed,
}

/// Errors from resolving supervisor configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot locate the host executable: {0}")]
    NoHostExe(#[source] std::io::Error),

    #[error("failed to read settings {}: {source}", path.display())]
    Read { path: PathBuf, source: std::io::Error },

    #[error("invalid settings {}: {source}", path.display())]
    Parse { path: PathBuf, source: toml::de::Error },
}
