// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! warden-core: domain types shared by the proxy engine supervisor

pub mod log;
pub mod notification;
pub mod stats;
pub mod status;

pub use log::LogRecord;
pub use notification::Notification;
pub use stats::{Statistics, TrafficSample};
pub use status::{InvalidTransition, ProxyStatus, StatusMachine};
