//! `SMPServer` (spec.md §3): the address a client connects to, plus the
//! optional public-key pin.
use smp_core::prelude::*;

#[derive(Clone, Debug)]
pub struct SMPServer {
    pub host: String,
    pub port: Option<u16>,
    /// Expected SHA-256 of the server's public key SPKI encoding, if the
    /// caller wants handshake-time pinning (spec.md §4.3 step 2).
    pub key_hash: Option<[u8; 32]>,
}

impl SMPServer {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into(), port: None, key_hash: None }
    }

    pub fn port_or_default(&self, default: u16) -> u16 {
        self.port.unwrap_or(default)
    }
}

impl Config for SMPServer {
    fn check_and_fix(&mut self) -> Outcome<()> {
        if self.host.trim().is_empty() {
            return Err(err!("SMPServer.host must not be empty."; Invalid, Input));
        }
        Ok(())
    }
}
