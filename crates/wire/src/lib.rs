// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line-delimited JSON-RPC protocol spoken with the proxy engine over stdio.
//!
//! Wire format: one UTF-8 JSON object per line, terminated by `\n`.
//!
//! ```text
//! supervisor → engine   {"id":7,"method":"get_status","params":{}}
//! engine → supervisor   {"id":7,"result":{"status":"running","uptime_secs":12}}
//! engine → supervisor   {"event":"stats","data":{"upload_bytes":100,...}}
//! ```

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod codec;
mod error;
mod event;
mod framer;

pub use codec::{decode, Command, Encoder, Message, Method, RequestIds, RpcError};
pub use error::ProtocolError;
pub use event::{EngineEvent, StatusReport};
pub use framer::{FramerStats, LineFramer, Lines, MAX_LINE_BYTES};

#[cfg(test)]
mod property_tests;
