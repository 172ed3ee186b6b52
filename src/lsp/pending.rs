//! Pending-request correlation table.
//!
//! A `DashMap<u32, PendingEntry>` mapping a request id to a single-shot
//! result sink and a deadline, modeling "pending, completed with result,
//! completed with error, or cancelled" directly in the type rather than
//! routing replies through callbacks.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::oneshot;

/// Outcome of a single LSP request, as seen by the waiter.
#[derive(Debug)]
pub enum RequestOutcome {
    Result(Value),
    Error(Value),
}

struct PendingEntry {
    sender: oneshot::Sender<RequestOutcome>,
}

/// Tracks in-flight requests to the clangd child by id.
pub struct PendingTable {
    next_id: AtomicU32,
    entries: DashMap<u32, PendingEntry>,
}

impl PendingTable {
    pub fn new() -> Self {
        Self {
            // clangd-facing ids start past any ids clangd itself might send
            // us as server-initiated requests on a fresh session.
            next_id: AtomicU32::new(1),
            entries: DashMap::new(),
        }
    }

    /// Allocate a fresh request id and register a waiter for it. Returns the
    /// id (to stamp onto the outgoing JSON-RPC request) and a receiver the
    /// caller awaits, subject to its own deadline.
    pub fn register(&self) -> (u32, oneshot::Receiver<RequestOutcome>) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.entries.insert(id, PendingEntry { sender: tx });
        (id, rx)
    }

    /// Complete a pending request with a `result` or `error` payload. A
    /// reply for an id that's no longer in the table (already timed out, or
    /// duplicated by a buggy server) is logged and dropped.
    pub fn complete(&self, id: u32, outcome: RequestOutcome) {
        match self.entries.remove(&id) {
            Some((_, entry)) => {
                // A dropped receiver (waiter already gave up) is not an error.
                let _ = entry.sender.send(outcome);
            }
            None => {
                log::debug!("late or unknown reply for request id {id}, dropping");
            }
        }
    }

    /// Remove a pending entry without completing it, e.g. once its deadline
    /// has already elapsed and the caller has moved on.
    pub fn cancel(&self, id: u32) {
        self.entries.remove(&id);
    }

    /// Number of requests currently awaiting a reply.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fail every pending request with a transport error, used when the
    /// clangd child dies or its stdout reader hits EOF.
    pub fn fail_all(&self, message: &str) {
        let ids: Vec<u32> = self.entries.iter().map(|e| *e.key()).collect();
        for id in ids {
            self.complete(
                id,
                RequestOutcome::Error(serde_json::json!({"message": message})),
            );
        }
    }
}

impl Default for PendingTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Default per-request timeout (30s, overridable via
/// `--timeout`).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_then_complete_delivers_result() {
        let table = PendingTable::new();
        let (id, rx) = table.register();
        table.complete(id, RequestOutcome::Result(serde_json::json!({"ok": true})));

        match rx.await.unwrap() {
            RequestOutcome::Result(v) => assert_eq!(v, serde_json::json!({"ok": true})),
            RequestOutcome::Error(_) => panic!("expected a result"),
        }
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn each_registration_gets_a_fresh_id() {
        let table = PendingTable::new();
        let (id_a, _rx_a) = table.register();
        let (id_b, _rx_b) = table.register();
        assert_ne!(id_a, id_b);
    }

    #[tokio::test]
    async fn late_completion_for_unknown_id_is_dropped_not_panicking() {
        let table = PendingTable::new();
        table.complete(9999, RequestOutcome::Result(serde_json::json!(null)));
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn cancel_removes_entry_and_drops_receiver() {
        let table = PendingTable::new();
        let (id, rx) = table.register();
        table.cancel(id);
        assert!(table.is_empty());
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn fail_all_resolves_every_waiter_with_an_error() {
        let table = PendingTable::new();
        let (_id_a, rx_a) = table.register();
        let (_id_b, rx_b) = table.register();
        table.fail_all("clangd crashed");

        for rx in [rx_a, rx_b] {
            match rx.await.unwrap() {
                RequestOutcome::Error(_) => {}
                RequestOutcome::Result(_) => panic!("expected an error"),
            }
        }
    }

    #[tokio::test]
    async fn request_deadline_resolves_within_tolerance() {
        let table = PendingTable::new();
        let (id, rx) = table.register();
        let deadline = Duration::from_millis(50);

        let start = std::time::Instant::now();
        let result = tokio::time::timeout(deadline, rx).await;
        assert!(result.is_err(), "expected the receiver to time out");
        let elapsed = start.elapsed();
        assert!(elapsed < deadline + Duration::from_millis(100));

        table.cancel(id);
    }
}
