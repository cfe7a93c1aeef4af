// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stand-in engine speaking the stdio JSON-RPC protocol.
//!
//! Behaviour is selected with `FAKE_ENGINE_MODE`:
//!
//! | mode          | behaviour                                              |
//! |---------------|--------------------------------------------------------|
//! | (unset)       | well-behaved engine                                    |
//! | `crash`       | aborts on `start`                                      |
//! | `exit`        | acknowledges `start`, then exits with code 0           |
//! | `hang`        | never answers, survives stdin closing                  |
//! | `ignore-stop` | never answers `stop`, survives stdin closing           |
//! | `reject`      | answers `start` with an RPC error                      |
//! | `flood`       | emits `FAKE_ENGINE_LINES` stats events after `start`   |
//! | `stderr`      | writes `FAKE_ENGINE_BYTES` bytes to stderr             |
//! | `oversized`   | writes one `FAKE_ENGINE_BYTES` line, then a stats line |
//! | `garbage`     | writes malformed lines, then a log event               |

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use serde_json::{json, Value};

fn main() -> ExitCode {
    if !std::env::args().skip(1).any(|a| a == "--json-rpc") {
        eprintln!("fake-engine: expected --json-rpc");
        return ExitCode::from(2);
    }
    match run(&std::env::var("FAKE_ENGINE_MODE").unwrap_or_default()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fake-engine: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(mode: &str) -> io::Result<ExitCode> {
    let started = Instant::now();
    let stdin = io::stdin();
    let mut out = io::stdout().lock();

    for line in stdin.lock().lines() {
        let line = line?;
        let Ok(command) = serde_json::from_str::<Value>(&line) else {
            continue;
        };
        let id = command.get("id").and_then(Value::as_u64).unwrap_or(0);
        let method = command.get("method").and_then(Value::as_str).unwrap_or_default();
        let params = command.get("params").cloned().unwrap_or_else(|| json!({}));

        match (mode, method) {
            ("hang", _) => continue,
            ("crash", "start") => std::process::abort(),
            ("reject", "start") => {
                send(&mut out, &json!({"id": id, "error": {"code": -32000, "message": "invalid server address"}}))?;
            }
            (_, "start") => {
                send(&mut out, &json!({"id": id, "result": {"status": "starting"}}))?;
                send(&mut out, &log("info", &format!("config {params}")))?;
                send(&mut out, &json!({"event": "status", "data": {"status": "running"}}))?;
                send(&mut out, &stats(100, 200, 1, 1))?;
                after_start(mode, &mut out)?;
                if mode == "exit" {
                    return Ok(ExitCode::SUCCESS);
                }
            }
            ("ignore-stop", "stop") => continue,
            (_, "stop") => {
                send(&mut out, &json!({"id": id, "result": {"status": "stopped"}}))?;
                return Ok(ExitCode::SUCCESS);
            }
            (_, "get_status") => {
                let uptime = started.elapsed().as_secs();
                send(&mut out, &json!({"id": id, "result": {"status": "running", "uptime_secs": uptime}}))?;
            }
            _ => {
                send(&mut out, &json!({"id": id, "error": {"code": -32601, "message": "Method not found"}}))?;
            }
        }
    }
    if matches!(mode, "hang" | "ignore-stop") {
        // Outlive a closed stdin; only a kill ends us.
        loop {
            std::thread::sleep(Duration::from_secs(60));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn after_start(mode: &str, out: &mut impl Write) -> io::Result<()> {
    match mode {
        "flood" => {
            let lines = env_usize("FAKE_ENGINE_LINES", 5000);
            for i in 1..=lines as u64 {
                send(out, &stats(i, i * 2, 0, i))?;
            }
        }
        "stderr" => {
            let noise = vec![b'e'; env_usize("FAKE_ENGINE_BYTES", 2 * 1024 * 1024)];
            let mut err = io::stderr().lock();
            err.write_all(&noise)?;
            err.flush()?;
        }
        "oversized" => {
            let mut huge = vec![b'x'; env_usize("FAKE_ENGINE_BYTES", 11 * 1024 * 1024)];
            huge.push(b'\n');
            out.write_all(&huge)?;
            send(out, &stats(7, 8, 9, 10))?;
        }
        "garbage" => {
            out.write_all(b"not json\n[1,2]\n{\"id\":\"x\",\"result\":{}}\n\xff\xfe\n")?;
            send(out, &log("warn", "still alive"))?;
        }
        _ => {}
    }
    out.flush()
}

fn send(out: &mut impl Write, message: &Value) -> io::Result<()> {
    writeln!(out, "{message}")?;
    out.flush()
}

fn log(level: &str, message: &str) -> Value {
    json!({"event": "log", "data": {"level": level, "message": message, "timestamp": "2026-01-01 00:00:00"}})
}

fn stats(upload: u64, download: u64, active: u32, total: u64) -> Value {
    json!({"event": "stats", "data": {
        "upload_bytes": upload,
        "download_bytes": download,
        "active_connections": active,
        "total_connections": total,
    }})
}

fn env_usize(var: &str, default: usize) -> usize {
    std::env::var(var).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}
