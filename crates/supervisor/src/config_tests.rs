// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
fn defaults() {
    let config = SupervisorConfig::new("/bin/engine");
    assert_eq!(config.engine_args, vec!["--json-rpc".to_string()]);
    assert_eq!(config.start_timeout, Duration::from_secs(5));
    assert_eq!(config.write_timeout, Duration::from_secs(1));
    assert_eq!(config.stop_timeout, Duration::from_secs(3));
    assert_eq!(config.heartbeat_interval, Duration::from_secs(5));
    assert_eq!(config.restart_delay, Duration::from_millis(500));
    assert_eq!(config.max_line_bytes, 10 * 1024 * 1024);
    assert_eq!(config.max_stderr_bytes, 1024 * 1024);
    assert_eq!(config.line_budget, 1000);
    assert_eq!(config.max_missed_heartbeats, 3);
}

#[test]
fn default_engine_path_sits_next_to_host() {
    let path = default_engine_path().unwrap();
    let host = std::env::current_exe().unwrap();
    assert_eq!(path.parent(), host.parent());
    assert_eq!(path.file_name().and_then(|n| n.to_str()), Some(ENGINE_EXE));
}

#[test]
fn settings_overlay_only_present_fields() {
    let settings = Settings::parse(
        r#"
heartbeat_ms = 100
stop_timeout_ms = 250
line_budget = 0

[engine_env]
RUST_LOG = "debug"
"#,
        Path::new("warden.toml"),
    )
    .unwrap();

    let config = SupervisorConfig::new("/bin/engine").apply(&settings);
    assert_eq!(config.heartbeat_interval, Duration::from_millis(100));
    assert_eq!(config.stop_timeout, Duration::from_millis(250));
    assert_eq!(config.line_budget, 1, "budget is clamped to at least one line");
    assert_eq!(config.start_timeout, Duration::from_secs(5));
    assert_eq!(config.engine_env.get("RUST_LOG").map(String::as_str), Some("debug"));
}

#[test]
fn unknown_settings_keys_are_rejected() {
    let err = Settings::parse("heartbeat = 5", Path::new("warden.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("warden.toml"));
}

#[test]
fn missing_settings_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Settings::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
#[serial]
fn environment_wins_over_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("warden.toml");
    std::fs::write(&path, "engine_path = \"/from/file\"\nheartbeat_ms = 100\n").unwrap();

    std::env::set_var("WARDEN_HEARTBEAT_MS", "700");
    let config = SupervisorConfig::load(Some(&path)).unwrap();
    std::env::remove_var("WARDEN_HEARTBEAT_MS");

    assert_eq!(config.engine_path, PathBuf::from("/from/file"));
    assert_eq!(config.heartbeat_interval, Duration::from_millis(700));
}

#[test]
#[serial]
fn environment_engine_path_overrides_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("warden.toml");
    std::fs::write(&path, "engine_path = \"/from/file\"\n").unwrap();

    std::env::set_var("WARDEN_ENGINE_PATH", "/from/env");
    let config = SupervisorConfig::load(Some(&path)).unwrap();
    std::env::remove_var("WARDEN_ENGINE_PATH");

    assert_eq!(config.engine_path, PathBuf::from("/from/env"));
}
