//! `SessionKey`/`THandle` (spec.md §3): the per-direction AES-GCM key
//! material and the connection-wide block-size contract.
use smp_core::prelude::*;

/// `{aesKey, baseIV, counter}`. `counter` increases monotonically with
/// each block encrypted (send side) or decrypted (receive side); send and
/// receive counters are independent and never reset.
#[derive(Clone)]
pub struct SessionKey {
    pub aes_key: [u8; 32],
    pub base_iv: [u8; 16],
    pub counter: u32,
}

impl SessionKey {
    pub fn generate() -> Self {
        Self {
            aes_key: smp_core::rand::bytes(),
            base_iv: smp_core::rand::bytes(),
            counter: 0,
        }
    }

    /// Derive the next IV and advance the counter (spec.md §4.3's IV
    /// derivation: `iv[0..4] = baseIV[0..4] XOR counter`, `iv[4..16] =
    /// baseIV[4..16]` unchanged). Fails rather than wrapping once
    /// `counter` would overflow `u32`, per spec.md §3's SHOULD.
    pub fn next_iv(&mut self) -> Outcome<[u8; 16]> {
        let c = self.counter.to_be_bytes();
        let mut iv = [0u8; 16];
        for i in 0..4 {
            iv[i] = self.base_iv[i] ^ c[i];
        }
        iv[4..16].copy_from_slice(&self.base_iv[4..16]);
        self.counter = match self.counter.checked_add(1) {
            Some(n) => n,
            None => return Err(err!(
                "Session counter would exceed u32::MAX; connection must be closed.";
                Overflow, Closed
            )),
        };
        Ok(iv)
    }
}

/// `{sndKey, rcvKey, blockSize}` — the `conn` field from spec.md §3 is the
/// byte channel itself, owned by `crate::transport::EncryptedTransport`
/// rather than duplicated here.
pub struct THandle {
    pub snd_key: SessionKey,
    pub rcv_key: SessionKey,
    pub block_size: usize,
}

impl THandle {
    /// Plaintext capacity of one block, after the 16-byte GCM tag.
    pub fn plaintext_len(&self) -> usize {
        self.block_size - 16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iv_derivation_is_deterministic_per_counter() {
        let mut a = SessionKey::generate();
        let mut b = a.clone();
        assert_eq!(a.next_iv().unwrap(), b.next_iv().unwrap());
    }

    #[test]
    fn test_iv_uniqueness_across_counters() {
        let mut k = SessionKey::generate();
        let first = k.next_iv().unwrap();
        let second = k.next_iv().unwrap();
        assert_ne!(first, second);
        assert_eq!(k.counter, 2);
    }

    #[test]
    fn test_counter_overflow_is_fatal() {
        let mut k = SessionKey::generate();
        k.counter = u32::MAX;
        assert!(k.next_iv().is_err());
    }
}
