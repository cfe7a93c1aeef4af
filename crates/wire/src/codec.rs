// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command encoding and incoming message classification.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ProtocolError;

/// Methods the supervisor sends to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `params` carries the full proxy configuration.
    Start,
    Stop,
    GetStatus,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Start => "start",
            Method::Stop => "stop",
            Method::GetStatus => "get_status",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allocates request ids: strictly increasing, starting at 1, never reused.
#[derive(Debug, Default)]
pub struct RequestIds {
    last: u64,
}

impl RequestIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> u64 {
        self.last += 1;
        self.last
    }

    /// Most recently allocated id (0 before the first allocation).
    pub fn last(&self) -> u64 {
        self.last
    }
}

/// Command envelope, supervisor → engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub id: u64,
    pub method: String,
    pub params: Value,
}

/// Encodes commands as single-line JSON envelopes.
#[derive(Debug, Default)]
pub struct Encoder {
    ids: RequestIds,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize `params` and wrap them in an envelope with the next id.
    ///
    /// `null` params are sent as `{}`. Any other non-object is rejected
    /// without consuming an id.
    pub fn encode<P: Serialize + ?Sized>(
        &mut self,
        method: &str,
        params: &P,
    ) -> Result<(Vec<u8>, u64), ProtocolError> {
        let params = match serde_json::to_value(params)? {
            Value::Null => Value::Object(Map::new()),
            obj @ Value::Object(_) => obj,
            _ => return Err(ProtocolError::ParamsNotObject { method: method.to_string() }),
        };
        let id = self.ids.next_id();
        let mut bytes =
            serde_json::to_vec(&Command { id, method: method.to_string(), params })?;
        bytes.push(b'\n');
        Ok((bytes, id))
    }

    pub fn last_id(&self) -> u64 {
        self.ids.last()
    }
}

/// Error detail of a failed call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A classified engine → supervisor message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Unsolicited event. `data` is always an object.
    Event { name: String, data: Value },
    /// Reply to the command with the same id.
    Response { id: u64, outcome: Result<Value, RpcError> },
}

/// Classify one line.
///
/// An object with `event` is an event; otherwise an object with `id` is a
/// response, which must carry exactly one of `result` and `error`.
pub fn decode(line: &str) -> Result<Message, ProtocolError> {
    let Value::Object(mut obj) = serde_json::from_str::<Value>(line)? else {
        return Err(ProtocolError::NotAnObject);
    };

    if let Some(event) = obj.remove("event") {
        let Value::String(name) = event else {
            return Err(ProtocolError::InvalidField("event"));
        };
        let data = match obj.remove("data") {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(data @ Value::Object(_)) => data,
            Some(_) => return Err(ProtocolError::InvalidField("data")),
        };
        return Ok(Message::Event { name, data });
    }

    let id = match obj.get("id") {
        Some(id) => id.as_u64().ok_or(ProtocolError::InvalidField("id"))?,
        None => return Err(ProtocolError::Unclassified),
    };

    match (obj.remove("result"), obj.remove("error")) {
        (Some(result), None) => Ok(Message::Response { id, outcome: Ok(result) }),
        (None, Some(error)) => {
            if !error.is_object() {
                return Err(ProtocolError::InvalidField("error"));
            }
            let error: RpcError = serde_json::from_value(error)
                .map_err(|_| ProtocolError::InvalidField("error"))?;
            Ok(Message::Response { id, outcome: Err(error) })
        }
        (Some(_), Some(_)) => Err(ProtocolError::AmbiguousResponse { id }),
        (None, None) => Err(ProtocolError::EmptyResponse { id }),
    }
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
