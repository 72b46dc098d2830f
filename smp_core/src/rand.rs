//! Secure random helpers, grounded on `fe2o3_core::rand::Rand`'s
//! thread-rng-backed wrapper pattern.
use rand::RngCore;
use rand_core::OsRng;

/// Fill `buf` with cryptographically secure random bytes.
pub fn fill(buf: &mut [u8]) {
    OsRng.fill_bytes(buf);
}

/// A fresh, securely random byte array of length `N`.
pub fn bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    fill(&mut buf);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_are_not_all_zero() {
        let b: [u8; 32] = bytes();
        assert!(b.iter().any(|x| *x != 0));
    }
}
