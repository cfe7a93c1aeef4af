// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Human-readable traffic and uptime formatting.

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;

/// `512 B`, `1.50 KB`, `2.00 MB`, `3.25 GB`
pub fn format_bytes(bytes: u64) -> String {
    let scaled = |unit: u64| bytes as f64 / unit as f64;
    if bytes >= GB {
        format!("{:.2} GB", scaled(GB))
    } else if bytes >= MB {
        format!("{:.2} MB", scaled(MB))
    } else if bytes >= KB {
        format!("{:.2} KB", scaled(KB))
    } else {
        format!("{bytes} B")
    }
}

/// `MM:SS`, or `HH:MM:SS` once an hour has passed.
pub fn format_uptime(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
