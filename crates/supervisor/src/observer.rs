// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound channels from the owner task to any number of observers.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use warden_core::{Notification, ProxyStatus, Statistics};

/// Sending half, owned by the supervisor task.
#[derive(Debug)]
pub(crate) struct Observers {
    status: watch::Sender<ProxyStatus>,
    stats: watch::Sender<Statistics>,
    events: broadcast::Sender<Notification>,
    last_error: Arc<Mutex<Option<String>>>,
}

/// Receiving half, cloned into every handle.
#[derive(Debug, Clone)]
pub(crate) struct Watchers {
    pub status: watch::Receiver<ProxyStatus>,
    pub stats: watch::Receiver<Statistics>,
    pub events: broadcast::Sender<Notification>,
    pub last_error: Arc<Mutex<Option<String>>>,
}

pub(crate) fn channel(capacity: usize) -> (Observers, Watchers) {
    let (status_tx, status_rx) = watch::channel(ProxyStatus::Stopped);
    let (stats_tx, stats_rx) = watch::channel(Statistics::default());
    let (events, _) = broadcast::channel(capacity.max(1));
    let last_error = Arc::new(Mutex::new(None));
    let observers = Observers {
        status: status_tx,
        stats: stats_tx,
        events: events.clone(),
        last_error: Arc::clone(&last_error),
    };
    let watchers = Watchers { status: status_rx, stats: stats_rx, events, last_error };
    (observers, watchers)
}

impl Observers {
    pub(crate) fn status(&self, status: ProxyStatus) {
        self.status.send_replace(status);
        self.notify(Notification::StatusChanged { status });
    }

    /// Update the snapshot without a notification.
    pub(crate) fn stats_snapshot(&self, stats: &Statistics) {
        self.stats.send_replace(*stats);
    }

    pub(crate) fn stats(&self, stats: &Statistics) {
        self.stats_snapshot(stats);
        self.notify(Notification::StatisticsUpdated { stats: *stats });
    }

    pub(crate) fn last_error(&self, message: Option<&str>) {
        *self.last_error.lock() = message.map(str::to_string);
    }

    pub(crate) fn notify(&self, notification: Notification) {
        // No subscribers is fine.
        let _ = self.events.send(notification);
    }
}
