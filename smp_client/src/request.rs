//! The pending-request map (spec.md §3 `Request`, §4.4 outbound/routing):
//! keyed by the ASCII correlation id, each entry carries the `queueId`
//! the request was sent against and a one-shot resolver for the matching
//! (or rejecting) response. Grounded in style on `fe2o3_core::map`'s
//! map-wrapper idiom (a newtype over a standard map with domain-specific
//! accessors); the correlation-id keying itself is spec.md §4.4's design.
use std::collections::HashMap;

use tokio::sync::{oneshot, Mutex};

use smp_protocol::{BrokerCommand, SMPError};

/// What a pending request resolves to: the matched broker command, a
/// protocol-level rejection carried in the response itself, or
/// `Closed` if the transport went away before a response arrived.
#[derive(Debug)]
pub enum RequestOutcome {
    Command(BrokerCommand),
    Protocol(SMPError),
    Closed,
}

struct Request {
    #[allow(dead_code)]
    queue_id: Vec<u8>,
    responder: oneshot::Sender<RequestOutcome>,
}

/// `sentCommands` from spec.md §4.4, owned by one `SMPClient` instance.
pub struct PendingRequests {
    inner: Mutex<HashMap<String, Request>>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self { inner: Mutex::new(HashMap::new()) }
    }

    /// Registers `corr_id` before the transmission is written, per
    /// spec.md §4.4 step 5 ("register... before writing").
    pub async fn register(&self, corr_id: String, queue_id: Vec<u8>) -> oneshot::Receiver<RequestOutcome> {
        let (tx, rx) = oneshot::channel();
        let mut map = self.inner.lock().await;
        map.insert(corr_id, Request { queue_id, responder: tx });
        rx
    }

    /// Removes and returns the entry for `corr_id`, if any (a "hit" in
    /// spec.md §4.4's routing).
    async fn take(&self, corr_id: &str) -> Option<Request> {
        let mut map = self.inner.lock().await;
        map.remove(corr_id)
    }

    /// Routes a parsed response to its waiter. On a "hit" the outcome is
    /// delivered and `None` is returned; on a "miss" (no pending entry
    /// for `corr_id`) ownership of `outcome` is handed back so the caller
    /// can fall through to unsolicited-message handling.
    pub async fn resolve(&self, corr_id: &str, outcome: RequestOutcome) -> Option<RequestOutcome> {
        match self.take(corr_id).await {
            Some(req) => {
                let _ = req.responder.send(outcome);
                None
            },
            None => Some(outcome),
        }
    }

    /// Rejects every still-pending waiter with `Closed`, per spec.md §3's
    /// "removed... on transport close (at which point all remaining
    /// entries are rejected with a transport-closed error)".
    pub async fn close_all(&self) {
        let mut map = self.inner.lock().await;
        for (_, req) in map.drain() {
            let _ = req.responder.send(RequestOutcome::Closed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_then_resolve_hit() {
        let pending = PendingRequests::new();
        let rx = pending.register("1".into(), b"q1".to_vec()).await;
        let leftover = pending.resolve("1", RequestOutcome::Command(BrokerCommand::Ok)).await;
        assert!(leftover.is_none());
        assert!(matches!(rx.await.unwrap(), RequestOutcome::Command(BrokerCommand::Ok)));
    }

    #[tokio::test]
    async fn test_resolve_miss_hands_outcome_back() {
        let pending = PendingRequests::new();
        let leftover = pending.resolve("nonexistent", RequestOutcome::Command(BrokerCommand::Ok)).await;
        assert!(matches!(leftover, Some(RequestOutcome::Command(BrokerCommand::Ok))));
    }

    #[tokio::test]
    async fn test_close_all_rejects_every_pending_waiter() {
        let pending = PendingRequests::new();
        let rx1 = pending.register("1".into(), vec![]).await;
        let rx2 = pending.register("2".into(), vec![]).await;
        pending.close_all().await;
        assert!(matches!(rx1.await.unwrap(), RequestOutcome::Closed));
        assert!(matches!(rx2.await.unwrap(), RequestOutcome::Closed));
    }
}
