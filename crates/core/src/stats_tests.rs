// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn sample(upload: u64, download: u64, active: u32, total: u64) -> TrafficSample {
    TrafficSample {
        upload_bytes: upload,
        download_bytes: download,
        active_connections: active,
        total_connections: total,
    }
}

#[test]
fn apply_sample_replaces_counters_wholesale() {
    let mut stats = Statistics::default();
    stats.apply_sample(&sample(100, 200, 3, 10));
    stats.apply_sample(&sample(5, 6, 1, 11));

    assert_eq!(stats.upload_bytes, 5);
    assert_eq!(stats.download_bytes, 6);
    assert_eq!(stats.active_connections, 1);
    assert_eq!(stats.total_connections, 11);
}

#[test]
fn apply_sample_leaves_uptime_alone() {
    let mut stats = Statistics::default();
    stats.set_uptime(42);
    stats.apply_sample(&sample(1, 2, 3, 4));
    assert_eq!(stats.uptime_seconds, 42);
}

#[test]
fn set_uptime_leaves_traffic_alone() {
    let mut stats = Statistics::default();
    stats.apply_sample(&sample(100, 200, 3, 10));
    stats.set_uptime(7);
    assert_eq!(
        stats,
        Statistics {
            upload_bytes: 100,
            download_bytes: 200,
            active_connections: 3,
            total_connections: 10,
            uptime_seconds: 7,
        }
    );
}

#[test]
fn reset_reports_change_only_once() {
    let mut stats = Statistics::default();
    assert!(!stats.reset());

    stats.apply_sample(&sample(1, 0, 0, 0));
    assert!(stats.reset());
    assert!(stats.is_zero());
    assert!(!stats.reset());
}

#[test]
fn partial_sample_defaults_missing_fields() {
    let parsed: TrafficSample = serde_json::from_str(r#"{"upload_bytes":9}"#).unwrap();
    assert_eq!(parsed, sample(9, 0, 0, 0));
}

#[test]
fn sample_rejects_negative_connection_count() {
    let parsed = serde_json::from_str::<TrafficSample>(r#"{"active_connections":-1}"#);
    assert!(parsed.is_err());
}
