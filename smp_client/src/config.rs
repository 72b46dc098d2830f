//! `ClientConfig` (SPEC_FULL.md §8): the handshake/write timeouts and
//! queue capacity spec.md §5/§6 leaves as "configured" without naming a
//! home for them. Grounded on `fe2o3_shield::cfg::ShieldConfig`'s
//! `Config` pattern via `smp_core::config::Config`.
use std::time::Duration;

use smp_core::prelude::*;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Bounds the handshake's header/key/welcome reads and the
    /// RSA-wrapped body write (spec.md §5's "transport read/write are
    /// suspension points").
    pub handshake_timeout: Duration,
    /// Bounds a single encrypted block write (spec.md §5's "write is
    /// bounded by a configured timeout").
    pub write_timeout: Duration,
    /// Capacity of the `msgQ` bounded async queue (spec.md §4.5).
    pub msg_queue_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(5),
            msg_queue_capacity: 64,
        }
    }
}

impl Config for ClientConfig {
    fn check_and_fix(&mut self) -> Outcome<()> {
        if self.msg_queue_capacity == 0 {
            return Err(err!("ClientConfig.msg_queue_capacity must be greater than zero."; Invalid, Input));
        }
        if self.handshake_timeout.is_zero() {
            return Err(err!("ClientConfig.handshake_timeout must be greater than zero."; Invalid, Input));
        }
        if self.write_timeout.is_zero() {
            return Err(err!("ClientConfig.write_timeout must be greater than zero."; Invalid, Input));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let mut cfg = ClientConfig::default();
        assert!(cfg.check_and_fix().is_ok());
    }

    #[test]
    fn test_zero_queue_capacity_is_rejected() {
        let mut cfg = ClientConfig { msg_queue_capacity: 0, ..ClientConfig::default() };
        assert!(cfg.check_and_fix().is_err());
    }
}
