// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded capture of engine stderr.
//!
//! The reader hands stderr over in pipe-sized chunks. Chunks are collected
//! into one batch until the stream has been quiet for [`STDERR_QUIET`] or
//! the batch has been open for [`STDERR_MAX_HOLD`]. Bytes past the cap are
//! discarded and the batch is marked truncated.

use std::time::Duration;

use tokio::time::Instant;

/// Upper bound on one captured stderr batch.
pub const MAX_STDERR_BYTES: usize = 1024 * 1024;

/// Appended to a batch that hit [`MAX_STDERR_BYTES`].
pub const TRUNCATION_MARKER: &str = "\n[...truncated due to size limit]";

/// Silence that closes a batch.
pub(crate) const STDERR_QUIET: Duration = Duration::from_millis(100);

/// Longest a batch stays open under continuous output.
pub(crate) const STDERR_MAX_HOLD: Duration = Duration::from_secs(1);

/// Accumulates stderr chunks up to a byte cap, discarding the excess.
#[derive(Debug)]
pub(crate) struct StderrBatch {
    buf: Vec<u8>,
    cap: usize,
    truncated: bool,
}

impl StderrBatch {
    pub(crate) fn new(cap: usize) -> Self {
        Self { buf: Vec::new(), cap, truncated: false }
    }

    pub(crate) fn push(&mut self, chunk: &[u8]) {
        let room = self.cap.saturating_sub(self.buf.len());
        let take = room.min(chunk.len());
        self.buf.extend_from_slice(&chunk[..take]);
        if take < chunk.len() {
            self.truncated = true;
        }
    }

    /// Decoded, trimmed text; `None` when only whitespace was captured.
    pub(crate) fn finish(self) -> Option<String> {
        let mut text = String::from_utf8_lossy(&self.buf).into_owned();
        if self.truncated {
            text.push_str(TRUNCATION_MARKER);
        }
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == text.len() {
            Some(text)
        } else {
            Some(trimmed.to_string())
        }
    }
}

#[derive(Debug)]
struct OpenBatch {
    batch: StderrBatch,
    opened: Instant,
    last_chunk: Instant,
}

/// Groups a burst of stderr chunks into a single capped batch.
#[derive(Debug)]
pub(crate) struct StderrCapture {
    cap: usize,
    open: Option<OpenBatch>,
}

impl StderrCapture {
    pub(crate) fn new(cap: usize) -> Self {
        Self { cap, open: None }
    }

    pub(crate) fn push(&mut self, chunk: &[u8], now: Instant) {
        if chunk.is_empty() {
            return;
        }
        let cap = self.cap;
        let open = self.open.get_or_insert_with(|| OpenBatch {
            batch: StderrBatch::new(cap),
            opened: now,
            last_chunk: now,
        });
        open.batch.push(chunk);
        open.last_chunk = now;
    }

    /// When the open batch should be emitted, if one is open.
    pub(crate) fn due(&self) -> Option<Instant> {
        self.open
            .as_ref()
            .map(|open| (open.last_chunk + STDERR_QUIET).min(open.opened + STDERR_MAX_HOLD))
    }

    /// Close the open batch and return its text.
    pub(crate) fn take(&mut self) -> Option<String> {
        self.open.take().and_then(|open| open.batch.finish())
    }
}

#[cfg(test)]
#[path = "stderr_tests.rs"]
mod tests;
