// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn encode_produces_one_compact_line() {
    let mut encoder = Encoder::new();
    let (bytes, id) = encoder.encode("start", &json!({"listen": "127.0.0.1:1080"})).unwrap();

    assert_eq!(id, 1);
    assert_eq!(bytes.last(), Some(&b'\n'));
    assert_eq!(bytes.iter().filter(|&&b| b == b'\n').count(), 1);

    let cmd: Command = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        cmd,
        Command { id: 1, method: "start".into(), params: json!({"listen": "127.0.0.1:1080"}) }
    );
}

#[test]
fn back_to_back_commands_get_increasing_ids() {
    let mut encoder = Encoder::new();
    let (_, a) = encoder.encode("get_status", &()).unwrap();
    let (_, b) = encoder.encode("get_status", &()).unwrap();
    assert!(b > a);
    assert_eq!(encoder.last_id(), b);
}

#[test]
fn null_params_are_sent_as_empty_object() {
    let mut encoder = Encoder::new();
    let (bytes, _) = encoder.encode(Method::Stop.as_str(), &()).unwrap();
    let text = std::str::from_utf8(&bytes).unwrap();
    assert_eq!(text, "{\"id\":1,\"method\":\"stop\",\"params\":{}}\n");
}

#[test]
fn non_object_params_are_rejected_without_consuming_an_id() {
    let mut encoder = Encoder::new();
    let err = encoder.encode("start", &json!([1, 2])).unwrap_err();
    assert!(matches!(err, ProtocolError::ParamsNotObject { .. }));
    assert_eq!(encoder.last_id(), 0);

    let (_, id) = encoder.encode("start", &json!({})).unwrap();
    assert_eq!(id, 1);
}

#[yare::parameterized(
    start      = { Method::Start,     "start" },
    stop       = { Method::Stop,      "stop" },
    get_status = { Method::GetStatus, "get_status" },
)]
fn method_names(method: Method, name: &str) {
    assert_eq!(method.as_str(), name);
    assert_eq!(method.to_string(), name);
}

#[test]
fn decode_event() {
    let msg = decode(r#"{"event":"stats","data":{"upload_bytes":1}}"#).unwrap();
    assert_eq!(
        msg,
        Message::Event { name: "stats".into(), data: json!({"upload_bytes": 1}) }
    );
}

#[test]
fn decode_event_without_data_gets_empty_object() {
    let msg = decode(r#"{"event":"ping"}"#).unwrap();
    assert_eq!(msg, Message::Event { name: "ping".into(), data: json!({}) });
}

#[test]
fn event_wins_over_id() {
    let msg = decode(r#"{"event":"log","id":3,"data":{}}"#).unwrap();
    assert!(matches!(msg, Message::Event { .. }));
}

#[test]
fn decode_success_response() {
    let msg = decode(r#"{"id":7,"result":{"status":"running"}}"#).unwrap();
    assert_eq!(msg, Message::Response { id: 7, outcome: Ok(json!({"status": "running"})) });
}

#[test]
fn decode_error_response() {
    let msg = decode(r#"{"id":8,"error":{"code":-32601,"message":"Method not found: x"}}"#)
        .unwrap();
    let Message::Response { id, outcome: Err(error) } = msg else {
        panic!("expected error response");
    };
    assert_eq!(id, 8);
    assert_eq!(error.code, Some(-32601));
    assert_eq!(error.message, "Method not found: x");
}

#[yare::parameterized(
    not_json       = { "{not json" },
    array          = { "[1,2,3]" },
    string         = { "\"hello\"" },
    neither        = { r#"{"foo":1}"# },
    both           = { r#"{"id":1,"result":{},"error":{"message":"x"}}"# },
    empty_response = { r#"{"id":1}"# },
    negative_id    = { r#"{"id":-1,"result":{}}"# },
    string_id      = { r#"{"id":"1","result":{}}"# },
    event_number   = { r#"{"event":5,"data":{}}"# },
    data_array     = { r#"{"event":"log","data":[]}"# },
    error_string   = { r#"{"id":1,"error":"boom"}"# },
)]
fn malformed_lines_are_rejected(line: &str) {
    assert!(decode(line).is_err(), "accepted: {line}");
}

#[test]
fn ambiguous_response_reports_id() {
    let err = decode(r#"{"id":4,"result":{},"error":{"message":"x"}}"#).unwrap_err();
    assert!(matches!(err, ProtocolError::AmbiguousResponse { id: 4 }));
}
