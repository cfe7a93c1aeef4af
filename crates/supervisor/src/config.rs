// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor configuration.
//!
//! Resolution order, later wins: built-in defaults, an optional TOML settings
//! file, then `WARDEN_*` environment variables (see [`crate::env`]).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use warden_wire::MAX_LINE_BYTES;

use crate::error::ConfigError;
use crate::stderr::MAX_STDERR_BYTES;

/// Flag that switches the engine into stdio JSON-RPC mode.
pub const ENGINE_ARG: &str = "--json-rpc";

/// Engine executable name, expected next to the host executable.
#[cfg(windows)]
pub const ENGINE_EXE: &str = "ech-workers-rs.exe";
#[cfg(not(windows))]
pub const ENGINE_EXE: &str = "ech-workers-rs";

/// Lines decoded per turn of the owner loop before yielding.
pub const LINE_BUDGET: usize = 1000;

/// Runtime configuration for a [`crate::Supervisor`].
#[derive(Debug, Clone, PartialEq)]
pub struct SupervisorConfig {
    pub engine_path: PathBuf,
    pub engine_args: Vec<String>,
    /// Extra environment for the engine process.
    pub engine_env: BTreeMap<String, String>,
    pub start_timeout: Duration,
    /// Bound on writing and flushing one command line.
    pub write_timeout: Duration,
    /// Grace period after `stop` before the engine is killed.
    pub stop_timeout: Duration,
    pub heartbeat_interval: Duration,
    /// `0` disables hang detection.
    pub max_missed_heartbeats: u32,
    pub request_timeout: Duration,
    pub restart_delay: Duration,
    pub max_line_bytes: usize,
    pub line_budget: usize,
    pub max_stderr_bytes: usize,
    pub notification_capacity: usize,
}

impl SupervisorConfig {
    pub fn new(engine_path: impl Into<PathBuf>) -> Self {
        Self {
            engine_path: engine_path.into(),
            engine_args: vec![ENGINE_ARG.to_string()],
            engine_env: BTreeMap::new(),
            start_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(1),
            stop_timeout: Duration::from_secs(3),
            heartbeat_interval: Duration::from_secs(5),
            max_missed_heartbeats: 3,
            request_timeout: Duration::from_secs(30),
            restart_delay: Duration::from_millis(500),
            max_line_bytes: MAX_LINE_BYTES,
            line_budget: LINE_BUDGET,
            max_stderr_bytes: MAX_STDERR_BYTES,
            notification_capacity: 256,
        }
    }

    /// Resolve the full configuration: defaults, then `settings` (if given),
    /// then environment overrides.
    pub fn load(settings: Option<&Path>) -> Result<Self, ConfigError> {
        let settings = match settings {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        let engine_path = match settings.engine_path.clone() {
            Some(path) => path,
            None => default_engine_path()?,
        };
        Ok(Self::new(engine_path).apply(&settings).with_env_overrides())
    }

    /// Overlay the values present in a settings file.
    pub fn apply(mut self, settings: &Settings) -> Self {
        if let Some(path) = &settings.engine_path {
            self.engine_path = path.clone();
        }
        if let Some(args) = &settings.engine_args {
            self.engine_args = args.clone();
        }
        self.engine_env.extend(settings.engine_env.iter().map(|(k, v)| (k.clone(), v.clone())));
        let ms = |v: Option<u64>, d: &mut Duration| {
            if let Some(v) = v {
                *d = Duration::from_millis(v);
            }
        };
        ms(settings.start_timeout_ms, &mut self.start_timeout);
        ms(settings.write_timeout_ms, &mut self.write_timeout);
        ms(settings.stop_timeout_ms, &mut self.stop_timeout);
        ms(settings.heartbeat_ms, &mut self.heartbeat_interval);
        ms(settings.request_timeout_ms, &mut self.request_timeout);
        ms(settings.restart_delay_ms, &mut self.restart_delay);
        if let Some(n) = settings.max_missed_heartbeats {
            self.max_missed_heartbeats = n;
        }
        if let Some(n) = settings.max_line_bytes {
            self.max_line_bytes = n;
        }
        if let Some(n) = settings.line_budget {
            self.line_budget = n.max(1);
        }
        if let Some(n) = settings.max_stderr_bytes {
            self.max_stderr_bytes = n;
        }
        self
    }

    /// Overlay `WARDEN_*` environment variables.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(path) = crate::env::engine_path() {
            self.engine_path = path;
        }
        if let Some(d) = crate::env::heartbeat_interval() {
            self.heartbeat_interval = d;
        }
        if let Some(d) = crate::env::stop_timeout() {
            self.stop_timeout = d;
        }
        if let Some(d) = crate::env::start_timeout() {
            self.start_timeout = d;
        }
        if let Some(n) = crate::env::max_missed_heartbeats() {
            self.max_missed_heartbeats = n;
        }
        self
    }
}

/// `<dir of current exe>/ech-workers-rs[.exe]`
pub fn default_engine_path() -> Result<PathBuf, ConfigError> {
    let exe = std::env::current_exe().map_err(ConfigError::NoHostExe)?;
    let dir = exe.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(dir.join(ENGINE_EXE))
}

/// On-disk settings file. Every field is optional; durations are milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub engine_path: Option<PathBuf>,
    pub engine_args: Option<Vec<String>>,
    pub engine_env: BTreeMap<String, String>,
    pub start_timeout_ms: Option<u64>,
    pub write_timeout_ms: Option<u64>,
    pub stop_timeout_ms: Option<u64>,
    pub heartbeat_ms: Option<u64>,
    pub max_missed_heartbeats: Option<u32>,
    pub request_timeout_ms: Option<u64>,
    pub restart_delay_ms: Option<u64>,
    pub max_line_bytes: Option<usize>,
    pub line_budget: Option<usize>,
    pub max_stderr_bytes: Option<usize>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::parse(&text, path)
    }

    pub fn parse(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse { path: origin.to_path_buf(), source })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
