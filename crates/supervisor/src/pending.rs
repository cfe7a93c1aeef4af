// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-flight request tracking.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use warden_wire::Method;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingRequest {
    pub method: Method,
    pub sent_at: Instant,
}

/// Requests written to the engine and not yet answered, keyed by id.
#[derive(Debug, Default)]
pub(crate) struct PendingRequests {
    inflight: HashMap<u64, PendingRequest>,
}

impl PendingRequests {
    pub(crate) fn insert(&mut self, id: u64, method: Method, sent_at: Instant) {
        if self.inflight.insert(id, PendingRequest { method, sent_at }).is_some() {
            tracing::warn!(id, %method, "request id reused while still in flight");
        }
    }

    /// Remove and return the request for `id`. A second call for the same id
    /// returns `None`.
    pub(crate) fn resolve(&mut self, id: u64) -> Option<PendingRequest> {
        self.inflight.remove(&id)
    }

    /// Drop requests older than `timeout`, returning them sorted by id.
    pub(crate) fn expire(&mut self, now: Instant, timeout: Duration) -> Vec<(u64, PendingRequest)> {
        let expired: Vec<u64> = self
            .inflight
            .iter()
            .filter(|(_, req)| now.saturating_duration_since(req.sent_at) >= timeout)
            .map(|(id, _)| *id)
            .collect();
        let mut out: Vec<_> =
            expired.into_iter().filter_map(|id| self.inflight.remove(&id).map(|req| (id, req))).collect();
        out.sort_by_key(|(id, _)| *id);
        out
    }

    pub(crate) fn clear(&mut self) -> usize {
        let n = self.inflight.len();
        self.inflight.clear();
        n
    }

    pub(crate) fn len(&self) -> usize {
        self.inflight.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.inflight.is_empty()
    }
}

#[cfg(test)]
#[path = "pending_tests.rs"]
mod tests;
