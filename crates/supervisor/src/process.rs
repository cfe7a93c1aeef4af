// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One running engine process: its pipes, reader tasks, and exit status.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;

use crate::config::SupervisorConfig;
use crate::error::SupervisorError;

/// Bytes requested per pipe read.
const READ_CHUNK: usize = 64 * 1024;

/// Chunks buffered between a reader task and the owner loop. When full the
/// reader stops reading and the OS pipe applies backpressure to the engine.
const CHUNK_QUEUE: usize = 16;

type Chunk = io::Result<Vec<u8>>;

/// How an engine process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    /// Ran to completion with an exit code.
    Exited { code: i32 },
    /// Terminated abnormally (signal on Unix).
    Crashed { signal: Option<i32> },
}

impl ExitKind {
    pub fn classify(status: ExitStatus) -> Self {
        match status.code() {
            Some(code) => ExitKind::Exited { code },
            None => ExitKind::Crashed { signal: exit_signal(status) },
        }
    }

    /// Message recorded when this exit was not requested.
    pub fn describe(&self) -> String {
        match self {
            ExitKind::Exited { code } => format!("engine process exited unexpectedly (code {code})"),
            ExitKind::Crashed { signal: Some(signal) } => {
                format!("engine process crashed (signal {signal})")
            }
            ExitKind::Crashed { signal: None } => "engine process crashed".to_string(),
        }
    }
}

#[cfg(unix)]
fn exit_signal(status: ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: ExitStatus) -> Option<i32> {
    None
}

/// Something the process did.
#[derive(Debug)]
pub(crate) enum ProcessEvent {
    Stdout(Vec<u8>),
    Stderr(Vec<u8>),
    ReadError { stream: &'static str, error: io::Error },
    Exited(io::Result<ExitStatus>),
}

#[derive(Debug)]
pub(crate) struct EngineProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: mpsc::Receiver<Chunk>,
    stderr: mpsc::Receiver<Chunk>,
    stdout_open: bool,
    stderr_open: bool,
    pid: Option<u32>,
}

impl EngineProcess {
    /// Spawn the engine with piped stdio and start one reader task per
    /// output pipe.
    pub(crate) fn launch(config: &SupervisorConfig) -> Result<Self, SupervisorError> {
        let mut cmd = Command::new(&config.engine_path);
        cmd.args(&config.engine_args)
            .envs(&config.engine_env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|source| SupervisorError::Spawn { path: config.engine_path.clone(), source })?;
        let stdin = child.stdin.take().ok_or(SupervisorError::MissingPipe("stdin"))?;
        let stdout = child.stdout.take().ok_or(SupervisorError::MissingPipe("stdout"))?;
        let stderr = child.stderr.take().ok_or(SupervisorError::MissingPipe("stderr"))?;

        let (stdout_tx, stdout_rx) = mpsc::channel(CHUNK_QUEUE);
        let (stderr_tx, stderr_rx) = mpsc::channel(CHUNK_QUEUE);
        tokio::spawn(pump(stdout, stdout_tx, "stdout"));
        tokio::spawn(pump(stderr, stderr_tx, "stderr"));

        Ok(Self {
            pid: child.id(),
            child,
            stdin: Some(stdin),
            stdout: stdout_rx,
            stderr: stderr_rx,
            stdout_open: true,
            stderr_open: true,
        })
    }

    pub(crate) fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub(crate) fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Next thing the process did. Output is preferred over exit so nothing
    /// written before exiting is lost. Stdout is skipped when `read_stdout`
    /// is false.
    pub(crate) async fn next_event(&mut self, read_stdout: bool) -> ProcessEvent {
        loop {
            tokio::select! {
                biased;
                chunk = self.stderr.recv(), if self.stderr_open => match chunk {
                    Some(Ok(bytes)) => return ProcessEvent::Stderr(bytes),
                    Some(Err(error)) => return ProcessEvent::ReadError { stream: "stderr", error },
                    None => self.stderr_open = false,
                },
                chunk = self.stdout.recv(), if read_stdout && self.stdout_open => match chunk {
                    Some(Ok(bytes)) => return ProcessEvent::Stdout(bytes),
                    Some(Err(error)) => return ProcessEvent::ReadError { stream: "stdout", error },
                    None => self.stdout_open = false,
                },
                status = self.child.wait() => return ProcessEvent::Exited(status),
            }
        }
    }

    /// Collect what the reader tasks still hold after exit, until both
    /// pipes close or `within` elapses. Returns `(stdout, stderr)`.
    pub(crate) async fn drain_output(&mut self, within: Duration) -> (Vec<u8>, Vec<u8>) {
        let deadline = tokio::time::Instant::now() + within;
        let (mut out, mut err) = (Vec::new(), Vec::new());
        while self.stdout_open || self.stderr_open {
            let next = tokio::time::timeout_at(deadline, async {
                tokio::select! {
                    chunk = self.stdout.recv(), if self.stdout_open => (true, chunk),
                    chunk = self.stderr.recv(), if self.stderr_open => (false, chunk),
                }
            })
            .await;
            match next {
                Ok((true, Some(Ok(bytes)))) => out.extend_from_slice(&bytes),
                Ok((false, Some(Ok(bytes)))) => err.extend_from_slice(&bytes),
                Ok((true, _)) => self.stdout_open = false,
                Ok((false, _)) => self.stderr_open = false,
                Err(_) => break,
            }
        }
        (out, err)
    }

    /// Write one encoded line and flush, bounded by `timeout`.
    pub(crate) async fn write_line(&mut self, line: &[u8], timeout: Duration) -> Result<(), SupervisorError> {
        let stdin = self.stdin.as_mut().ok_or(SupervisorError::StdinClosed)?;
        let write = async {
            stdin.write_all(line).await?;
            stdin.flush().await
        };
        match tokio::time::timeout(timeout, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(SupervisorError::Write(e)),
            Err(_) => Err(SupervisorError::WriteTimeout(timeout)),
        }
    }

    /// Close stdin so an engine reading to EOF can exit on its own.
    pub(crate) fn close_stdin(&mut self) {
        self.stdin = None;
    }

    /// Force-terminate and reap.
    pub(crate) async fn kill(&mut self) -> io::Result<()> {
        self.child.kill().await
    }
}

async fn pump<R>(mut reader: R, tx: mpsc::Sender<Chunk>, stream: &'static str)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(Ok(buf[..n].to_vec())).await.is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                let _ = tx.send(Err(e)).await;
                break;
            }
        }
    }
    tracing::trace!(stream, "engine pipe closed");
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
