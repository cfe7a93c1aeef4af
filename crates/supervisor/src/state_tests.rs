// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::observer::{channel, Watchers};
use tokio::sync::broadcast;
use tokio::time::Instant;
use warden_core::TrafficSample;

fn setup() -> (EngineState, Watchers, broadcast::Receiver<Notification>) {
    let (observers, watchers) = channel(64);
    let rx = watchers.events.subscribe();
    (EngineState::new(observers), watchers, rx)
}

fn drain(rx: &mut broadcast::Receiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(n) = rx.try_recv() {
        out.push(n);
    }
    out
}

fn running(state: &mut EngineState) {
    state.set_status(ProxyStatus::Starting);
    state.set_status(ProxyStatus::Running);
}

#[test]
fn stats_event_replaces_counters_and_notifies() {
    let (mut state, watchers, mut rx) = setup();
    running(&mut state);
    drain(&mut rx);

    assert!(state.handle_line(
        r#"{"event":"stats","data":{"upload_bytes":10,"download_bytes":20,"active_connections":1,"total_connections":3}}"#
    ));
    assert!(state.handle_line(
        r#"{"event":"stats","data":{"upload_bytes":5,"download_bytes":6,"active_connections":0,"total_connections":4}}"#
    ));

    let expected = Statistics {
        upload_bytes: 5,
        download_bytes: 6,
        active_connections: 0,
        total_connections: 4,
        uptime_seconds: 0,
    };
    assert_eq!(state.stats, expected);
    assert_eq!(*watchers.stats.borrow(), expected);
    let notes = drain(&mut rx);
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[1], Notification::StatisticsUpdated { stats: expected });
}

#[test]
fn status_event_uptime_touches_only_uptime() {
    let (mut state, watchers, mut rx) = setup();
    running(&mut state);
    state.stats.apply_sample(&TrafficSample {
        upload_bytes: 1,
        download_bytes: 2,
        active_connections: 3,
        total_connections: 4,
    });
    drain(&mut rx);

    state.handle_line(r#"{"event":"status","data":{"status":"running","uptime_secs":42}}"#);

    let stats = state.stats;
    assert_eq!(stats.uptime_seconds, 42);
    assert_eq!(stats.upload_bytes, 1);
    assert_eq!(stats.total_connections, 4);
    assert_eq!(watchers.stats.borrow().uptime_seconds, 42);
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn running_status_event_completes_start() {
    let (mut state, _watchers, mut rx) = setup();
    state.set_status(ProxyStatus::Starting);
    drain(&mut rx);

    state.handle_line(r#"{"event":"status","data":{"status":"running"}}"#);
    assert_eq!(state.status(), ProxyStatus::Running);
    assert_eq!(drain(&mut rx), vec![Notification::StatusChanged { status: ProxyStatus::Running }]);
}

#[test]
fn engine_error_status_fails_active_proxy() {
    let (mut state, watchers, _rx) = setup();
    running(&mut state);
    state.handle_line(r#"{"event":"status","data":{"status":"error"}}"#);
    assert_eq!(state.status(), ProxyStatus::Error);
    assert!(watchers.last_error.lock().is_some());
}

#[test]
fn start_result_moves_starting_to_running() {
    let (mut state, watchers, _rx) = setup();
    state.set_status(ProxyStatus::Starting);
    state.pending.insert(1, Method::Start, Instant::now());

    state.handle_line(r#"{"id":1,"result":{"status":"starting"}}"#);
    assert_eq!(state.status(), ProxyStatus::Running);
    assert_eq!(*watchers.status.borrow(), ProxyStatus::Running);
    assert!(state.pending.is_empty());
}

#[test]
fn response_resolves_at_most_once() {
    let (mut state, _watchers, mut rx) = setup();
    running(&mut state);
    state.pending.insert(7, Method::GetStatus, Instant::now());
    drain(&mut rx);

    let reply = r#"{"id":7,"error":{"code":-1,"message":"busy"}}"#;
    state.handle_line(reply);
    state.handle_line(reply);
    let errors: Vec<_> =
        drain(&mut rx).into_iter().filter(|n| matches!(n, Notification::ErrorOccurred { .. })).collect();
    assert_eq!(errors.len(), 1);
}

#[test]
fn unknown_response_id_is_ignored() {
    let (mut state, _watchers, mut rx) = setup();
    state.set_status(ProxyStatus::Starting);
    drain(&mut rx);

    assert!(state.handle_line(r#"{"id":99,"result":{"status":"running"}}"#));
    assert_eq!(state.status(), ProxyStatus::Starting);
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn start_rejection_moves_to_error() {
    let (mut state, watchers, mut rx) = setup();
    state.set_status(ProxyStatus::Starting);
    state.pending.insert(1, Method::Start, Instant::now());
    drain(&mut rx);

    state.handle_line(r#"{"id":1,"error":{"code":-32000,"message":"bad server address"}}"#);

    assert_eq!(state.status(), ProxyStatus::Error);
    assert_eq!(state.machine.last_error(), Some("bad server address"));
    assert_eq!(watchers.last_error.lock().as_deref(), Some("bad server address"));
    assert_eq!(
        drain(&mut rx),
        vec![
            Notification::StatusChanged { status: ProxyStatus::Error },
            Notification::ErrorOccurred { message: "bad server address".to_string() },
        ]
    );
}

#[test]
fn other_rejections_only_notify() {
    let (mut state, _watchers, mut rx) = setup();
    running(&mut state);
    state.pending.insert(2, Method::GetStatus, Instant::now());
    drain(&mut rx);

    state.handle_line(r#"{"id":2,"error":{"message":""}}"#);

    assert_eq!(state.status(), ProxyStatus::Running);
    assert_eq!(state.machine.last_error(), Some("engine rejected get_status"));
    assert_eq!(
        drain(&mut rx),
        vec![Notification::ErrorOccurred { message: "engine rejected get_status".to_string() }]
    );
}

#[test]
fn malformed_lines_are_rejected_silently() {
    let (mut state, _watchers, mut rx) = setup();
    running(&mut state);
    drain(&mut rx);

    assert!(!state.handle_line("not json"));
    assert!(!state.handle_line("[1,2,3]"));
    assert!(!state.handle_line(r#"{"id":1,"result":{},"error":{}}"#));
    assert!(drain(&mut rx).is_empty());
    assert_eq!(state.status(), ProxyStatus::Running);
}

#[test]
fn log_event_is_forwarded_upper_cased() {
    let (mut state, _watchers, mut rx) = setup();
    state.handle_line(r#"{"event":"log","data":{"level":"warn","message":"slow upstream","timestamp":"t"}}"#);
    assert_eq!(
        drain(&mut rx),
        vec![Notification::LogReceived { record: LogRecord::new("WARN", "slow upstream", "t") }]
    );
}

#[test]
fn reset_notifies_only_when_counters_change() {
    let (mut state, _watchers, mut rx) = setup();
    state.reset_stats();
    assert!(drain(&mut rx).is_empty());

    state.handle_line(
        r#"{"event":"stats","data":{"upload_bytes":1,"download_bytes":0,"active_connections":0,"total_connections":0}}"#,
    );
    drain(&mut rx);
    state.reset_stats();
    assert_eq!(drain(&mut rx), vec![Notification::StatisticsUpdated { stats: Statistics::default() }]);
}

#[test]
fn illegal_transition_is_ignored() {
    let (mut state, _watchers, mut rx) = setup();
    assert!(!state.set_status(ProxyStatus::Running));
    assert_eq!(state.status(), ProxyStatus::Stopped);
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn clear_error_resets_shared_slot() {
    let (mut state, watchers, _rx) = setup();
    state.set_status(ProxyStatus::Starting);
    state.fail("boom");
    assert_eq!(watchers.last_error.lock().as_deref(), Some("boom"));
    state.clear_error();
    assert_eq!(watchers.last_error.lock().as_deref(), None);
    assert_eq!(state.machine.last_error(), None);
}
