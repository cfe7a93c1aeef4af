// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors from encoding or classifying protocol messages.
///
/// Decode errors are never fatal: callers log and skip the offending line.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message is not a JSON object")]
    NotAnObject,

    #[error("message has neither `event` nor `id`")]
    Unclassified,

    #[error("field `{0}` has the wrong type")]
    InvalidField(&'static str),

    #[error("response {id} carries both `result` and `error`")]
    AmbiguousResponse { id: u64 },

    #[error("response {id} carries neither `result` nor `error`")]
    EmptyResponse { id: u64 },

    #[error("params for `{method}` must be a JSON object")]
    ParamsNotObject { method: String },

    #[error("malformed `{event}` event: {source}")]
    EventPayload { event: String, source: serde_json::Error },
}
