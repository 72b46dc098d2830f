//! The framed unit shipped by the transport (spec.md §3).
use smp_core::byte::to_base64;
use smp_core::prelude::*;

use crate::codec::serialize_client;
use crate::command::{BrokerCommand, ClientCommand};
use crate::error::SMPError;

use rsa::RsaPrivateKey;

/// Outbound: `{signKey?, corrId, queueId, command}`.
pub struct ClientTransmission {
    pub sign_key: Option<RsaPrivateKey>,
    pub corr_id: Vec<u8>,
    pub queue_id: Vec<u8>,
    pub command: ClientCommand,
}

impl ClientTransmission {
    /// Builds the wire block (spec.md §4.4): `sig base64 | ' ' | corrId |
    /// ' ' | queueId base64 | ' ' | command | ' '`, signing `corrId ' '
    /// queueId ' ' command` when `signKey` is present.
    pub fn encode(&self) -> Outcome<Vec<u8>> {
        let mut trn = Vec::new();
        trn.extend_from_slice(&self.corr_id);
        trn.push(b' ');
        trn.extend_from_slice(to_base64(&self.queue_id).as_bytes());
        trn.push(b' ');
        trn.extend_from_slice(&serialize_client(&self.command)?);

        let sig = match &self.sign_key {
            Some(key) => smp_crypto::sign::sign(key, &trn)?,
            None => Vec::new(),
        };

        let mut wire = Vec::new();
        wire.extend_from_slice(to_base64(&sig).as_bytes());
        wire.push(b' ');
        wire.extend_from_slice(&trn);
        wire.push(b' ');
        Ok(wire)
    }
}

/// Inbound: either a broker command or a protocol-level error, always
/// carrying the correlation id and queue id the broker echoed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BrokerTransmission {
    Command { corr_id: Vec<u8>, queue_id: Vec<u8>, command: BrokerCommand },
    Error { corr_id: Vec<u8>, queue_id: Vec<u8>, error: SMPError },
}

impl BrokerTransmission {
    /// The sentinel produced when a block fails to decode at all (spec.md
    /// §3: `badBlock = {corrId: "", queueId: "", error: BLOCK}`).
    pub fn bad_block() -> Self {
        Self::Error { corr_id: Vec::new(), queue_id: Vec::new(), error: SMPError::Block }
    }

    pub fn corr_id(&self) -> &[u8] {
        match self {
            Self::Command { corr_id, .. } | Self::Error { corr_id, .. } => corr_id,
        }
    }

    pub fn queue_id(&self) -> &[u8] {
        match self {
            Self::Command { queue_id, .. } | Self::Error { queue_id, .. } => queue_id,
        }
    }
}
