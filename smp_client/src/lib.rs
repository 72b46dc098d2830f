#![forbid(unsafe_code)]
//! Multiplexed client (C6) and bounded async queue (C7) for the Simplex
//! Messaging Protocol: correlation-id routed requests over an
//! [`smp_protocol::EncryptedTransport`], with unsolicited broker pushes
//! fanned out to an application-supplied queue.
pub mod client;
pub mod config;
pub mod queue;
pub mod request;

pub use client::{SMPClient, ServerMessage};
pub use config::ClientConfig;
pub use queue::BoundedQueue;
pub use request::{PendingRequests, RequestOutcome};
