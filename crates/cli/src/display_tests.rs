// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    zero = { 0, "0 B" },
    below_kb = { 1023, "1023 B" },
    one_kb = { 1024, "1.00 KB" },
    kb_and_a_half = { 1536, "1.50 KB" },
    one_mb = { 1024 * 1024, "1.00 MB" },
    just_under_gb = { 1024 * 1024 * 1024 - 1, "1024.00 MB" },
    gigabytes = { 3 * 1024 * 1024 * 1024 + 256 * 1024 * 1024, "3.25 GB" },
)]
fn bytes(input: u64, expected: &str) {
    assert_eq!(format_bytes(input), expected);
}

#[yare::parameterized(
    zero = { 0, "00:00" },
    seconds = { 59, "00:59" },
    minutes = { 61, "01:01" },
    under_hour = { 3599, "59:59" },
    one_hour = { 3600, "01:00:00" },
    long_run = { 100 * 3600 + 5, "100:00:05" },
)]
fn uptime(input: u64, expected: &str) {
    assert_eq!(format_uptime(input), expected);
}
