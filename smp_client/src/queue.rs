//! Bounded async queue (C7): producers suspend when full, consumers
//! suspend when empty, and a consumer sees a clean end-of-stream once
//! `close()` has been called and the buffer has drained. Grounded on
//! `fe2o3_core::channels::Simplex`'s thin-wrapper-over-a-channel idiom,
//! backed here by `tokio::sync::mpsc` rather than the teacher's `flume`
//! (see DESIGN.md).
use smp_core::prelude::*;

use tokio::sync::{mpsc, Mutex};

pub struct BoundedQueue<M> {
    tx: Mutex<Option<mpsc::Sender<M>>>,
    rx: Mutex<mpsc::Receiver<M>>,
}

impl<M: Send + 'static> BoundedQueue<M> {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self { tx: Mutex::new(Some(tx)), rx: Mutex::new(rx) }
    }

    /// Suspends if the queue is full. Fails once the queue has been
    /// closed.
    pub async fn enqueue(&self, msg: M) -> Outcome<()> {
        let guard = self.tx.lock().await;
        match guard.as_ref() {
            Some(tx) => match tx.send(msg).await {
                Ok(()) => Ok(()),
                Err(_) => Err(err!("Queue is closed."; Closed, Output)),
            },
            None => Err(err!("Queue is closed."; Closed, Output)),
        }
    }

    /// Suspends until a message is available. Returns `None` once the
    /// queue is closed and drained — callers iterate with
    /// `while let Some(msg) = queue.dequeue().await { ... }`.
    pub async fn dequeue(&self) -> Option<M> {
        let mut rx = self.rx.lock().await;
        rx.recv().await
    }

    /// Drops the sending half. Outstanding buffered messages still drain
    /// to `dequeue`; only after that does it start returning `None`.
    pub async fn close(&self) {
        let mut guard = self.tx.lock().await;
        *guard = None;
    }
}
