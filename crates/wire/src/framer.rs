// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reassembles the engine's stdout byte stream into bounded lines.
//!
//! Bytes arrive with no alignment to message boundaries. A line is only
//! yielded once its `\n` has been seen. Lines longer than the bound are
//! dropped; an unterminated tail that already exceeds the bound is discarded
//! immediately and the framer skips input until the next newline, so a
//! hostile engine cannot make the buffer grow past one bound's worth.
//!
//! Output is independent of how the stream was chunked.

/// Largest accepted line, excluding the terminator.
pub const MAX_LINE_BYTES: usize = 10 * 1024 * 1024;

/// Counters describing what the framer dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FramerStats {
    /// Lines yielded to the caller.
    pub lines: u64,
    /// Lines dropped for exceeding the bound.
    pub oversized: u64,
    /// Lines dropped for not being valid UTF-8.
    pub invalid_utf8: u64,
}

#[derive(Debug)]
pub struct LineFramer {
    buf: Vec<u8>,
    /// First unconsumed byte.
    pos: usize,
    /// Start of the unterminated tail; `buf[pos..partial]` holds only
    /// complete lines.
    partial: usize,
    max_line: usize,
    /// Inside an oversized line; input is dropped until the next newline.
    discarding: bool,
    stats: FramerStats,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineFramer {
    pub fn new() -> Self {
        Self::with_max_line(MAX_LINE_BYTES)
    }

    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            buf: Vec::new(),
            pos: 0,
            partial: 0,
            max_line,
            discarding: false,
            stats: FramerStats::default(),
        }
    }

    /// Append bytes read from the stream.
    pub fn push(&mut self, chunk: &[u8]) {
        let mut chunk = chunk;
        if self.discarding {
            let Some(nl) = chunk.iter().position(|&b| b == b'\n') else {
                return;
            };
            self.discarding = false;
            self.note_oversized(None);
            chunk = &chunk[nl + 1..];
        }

        self.compact();
        let base = self.buf.len();
        self.buf.extend_from_slice(chunk);
        if let Some(nl) = chunk.iter().rposition(|&b| b == b'\n') {
            self.partial = base + nl + 1;
        }

        if self.buf.len() - self.partial > self.max_line {
            self.buf.truncate(self.partial);
            self.discarding = true;
        }
    }

    /// Next complete line, trailing whitespace trimmed. Blank, oversized and
    /// non-UTF-8 lines are skipped.
    pub fn next_line(&mut self) -> Option<String> {
        while self.pos < self.partial {
            let window = &self.buf[self.pos..self.partial];
            let nl = window.iter().position(|&b| b == b'\n')?;
            let start = self.pos;
            self.pos += nl + 1;

            if nl > self.max_line {
                self.note_oversized(Some(nl));
                continue;
            }

            let raw = trim_trailing(&self.buf[start..start + nl]);
            if raw.is_empty() {
                continue;
            }
            match std::str::from_utf8(raw) {
                Ok(line) => {
                    self.stats.lines += 1;
                    return Some(line.to_string());
                }
                Err(e) => {
                    self.stats.invalid_utf8 += 1;
                    tracing::warn!(bytes = raw.len(), error = %e, "dropped non-UTF-8 line");
                }
            }
        }
        None
    }

    /// Iterate over the complete lines buffered so far. The iterator can be
    /// abandoned at any point and resumed later with another call.
    pub fn lines(&mut self) -> Lines<'_> {
        Lines { framer: self }
    }

    /// Whether at least one terminated line is waiting to be consumed.
    pub fn has_complete_line(&self) -> bool {
        self.pos < self.partial
    }

    /// Bytes held in the buffer, consumed or not.
    pub fn buffered(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn stats(&self) -> FramerStats {
        self.stats
    }

    /// Drop all buffered input and counters, e.g. when a new process starts.
    pub fn reset(&mut self) {
        *self = Self::with_max_line(self.max_line);
    }

    fn compact(&mut self) {
        if self.pos > 0 {
            self.buf.drain(..self.pos);
            self.partial -= self.pos;
            self.pos = 0;
        }
    }

    fn note_oversized(&mut self, len: Option<usize>) {
        self.stats.oversized += 1;
        match len {
            Some(bytes) => {
                tracing::warn!(bytes, max = self.max_line, "dropped oversized line")
            }
            None => tracing::warn!(max = self.max_line, "dropped oversized line"),
        }
    }
}

/// Lazy iterator over complete lines. See [`LineFramer::lines`].
pub struct Lines<'a> {
    framer: &'a mut LineFramer,
}

impl Iterator for Lines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.framer.next_line()
    }
}

fn trim_trailing(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|b| !b.is_ascii_whitespace()).map_or(0, |i| i + 1);
    &bytes[..end]
}

#[cfg(test)]
#[path = "framer_tests.rs"]
mod tests;
