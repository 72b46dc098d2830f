//! RSA keypair generation and SPKI (DER) encode/decode, plus the SHA-256
//! key-hash used for server certificate pinning (spec.md §4.3 step 2).
//!
//! Grounded in the shape of `fe2o3_crypto::sign`'s scheme handling and
//! `fe2o3_crypto::keys::Keys`'s public/secret key pairing, adapted away
//! from the const-generic fixed-length layout since RSA keys are not
//! fixed-size the way a symmetric key is.
use smp_core::prelude::*;

use rsa::{
    pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey},
    RsaPrivateKey, RsaPublicKey,
};
use sha2::{Digest, Sha256};

pub const RSA_KEY_BITS: usize = 2048;

/// An RSA keypair used both for the handshake's OAEP encryption and for
/// signing outbound commands with PSS.
pub struct KeyPair {
    pub private: RsaPrivateKey,
    pub public: RsaPublicKey,
}

impl KeyPair {
    pub fn generate() -> Outcome<Self> {
        let mut rng = rand::thread_rng();
        let private = res!(
            RsaPrivateKey::new(&mut rng, RSA_KEY_BITS);
            Key, Encrypt
        );
        let public = RsaPublicKey::from(&private);
        Ok(Self { private, public })
    }

    /// Encode the public half as a DER SubjectPublicKeyInfo blob, the form
    /// exchanged over the wire during the handshake.
    pub fn public_spki_der(&self) -> Outcome<Vec<u8>> {
        Ok(res!(self.public.to_public_key_der(); Encode, Key).into_vec())
    }

    pub fn private_pkcs8_der(&self) -> Outcome<Vec<u8>> {
        Ok(res!(self.private.to_pkcs8_der(); Encode, Key).as_bytes().to_vec())
    }

    pub fn from_private_pkcs8_der(der: &[u8]) -> Outcome<Self> {
        let private = res!(RsaPrivateKey::from_pkcs8_der(der); Decode, Key);
        let public = RsaPublicKey::from(&private);
        Ok(Self { private, public })
    }
}

/// Decode a DER SubjectPublicKeyInfo blob into an `RsaPublicKey`.
pub fn public_key_from_spki_der(der: &[u8]) -> Outcome<RsaPublicKey> {
    Ok(res!(RsaPublicKey::from_public_key_der(der); Decode, Key))
}

/// SHA-256 hash of a server's SPKI-encoded public key, used for the
/// optional `keyHash` pin carried in an `SMPServer` address (spec.md §4.3
/// step 2).
pub fn key_hash(spki_der: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(spki_der);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_roundtrips_through_spki_der() {
        let kp = KeyPair::generate().unwrap();
        let der = kp.public_spki_der().unwrap();
        let decoded = public_key_from_spki_der(&der).unwrap();
        assert_eq!(decoded, kp.public);
    }

    #[test]
    fn test_key_hash_is_deterministic() {
        let kp = KeyPair::generate().unwrap();
        let der = kp.public_spki_der().unwrap();
        assert_eq!(key_hash(&der), key_hash(&der));
    }

    #[test]
    fn test_key_hash_differs_for_different_keys() {
        let a = KeyPair::generate().unwrap();
        let b = KeyPair::generate().unwrap();
        let da = a.public_spki_der().unwrap();
        let db = b.public_spki_der().unwrap();
        assert_ne!(key_hash(&da), key_hash(&db));
    }
}
