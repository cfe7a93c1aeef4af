// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic liveness probe.
//!
//! Every tick sends a `get_status` request. If the previous probe got no
//! reply and the engine has said nothing since, the tick counts as missed;
//! any message from the engine resets the count.

use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior};

/// What the owner loop should do for a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Beat {
    Probe,
    Hung { missed: u32 },
}

#[derive(Debug)]
pub(crate) struct Heartbeat {
    period: Duration,
    max_missed: u32,
    ticker: Option<Interval>,
    awaiting: bool,
    missed: u32,
}

impl Heartbeat {
    pub(crate) fn new(period: Duration, max_missed: u32) -> Self {
        Self { period, max_missed, ticker: None, awaiting: false, missed: 0 }
    }

    /// Arm the ticker; the first tick fires one period from now.
    pub(crate) fn start(&mut self) {
        let period = self.period.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(ticker);
        self.awaiting = false;
        self.missed = 0;
    }

    pub(crate) fn stop(&mut self) {
        self.ticker = None;
        self.awaiting = false;
        self.missed = 0;
    }

    pub(crate) fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Resolves on the next tick; never resolves while stopped.
    pub(crate) async fn tick(&mut self) {
        match self.ticker.as_mut() {
            Some(ticker) => {
                ticker.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }

    pub(crate) fn on_tick(&mut self) -> Beat {
        if self.awaiting {
            self.missed += 1;
        }
        self.awaiting = true;
        if self.max_missed > 0 && self.missed >= self.max_missed {
            Beat::Hung { missed: self.missed }
        } else {
            Beat::Probe
        }
    }

    /// The engine said something; it is alive.
    pub(crate) fn record_activity(&mut self) {
        self.awaiting = false;
        self.missed = 0;
    }

    pub(crate) fn missed(&self) -> u32 {
        self.missed
    }
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
