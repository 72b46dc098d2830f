//! RSA-PSS-SHA256 (salt length 32, matching the digest size) signing of
//! outbound transmissions and verification of the signature a broker
//! checks against the queue's registered key. Grounded on
//! `fe2o3_crypto::sign::SignatureScheme`'s signer/verifier call shape.
use smp_core::prelude::*;

use rsa::{
    pss::{Signature, SigningKey, VerifyingKey},
    signature::{RandomizedSigner, Verifier},
    RsaPrivateKey, RsaPublicKey,
};
use sha2::Sha256;

pub fn sign(private: &RsaPrivateKey, msg: &[u8]) -> Outcome<Vec<u8>> {
    let signing_key = SigningKey::<Sha256>::new(private.clone());
    let mut rng = rand::thread_rng();
    let sig = signing_key.sign_with_rng(&mut rng, msg);
    Ok(sig.to_vec())
}

pub fn verify(public: &RsaPublicKey, msg: &[u8], sig_bytes: &[u8]) -> Outcome<()> {
    let verifying_key = VerifyingKey::<Sha256>::new(public.clone());
    let sig = res!(Signature::try_from(sig_bytes); Decode, Invalid);
    res!(verifying_key.verify(msg, &sig); Verify, Auth);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyPair;

    #[test]
    fn test_pss_sign_then_verify() {
        let kp = KeyPair::generate().unwrap();
        let msg = b"NEW 1234 abcd";
        let sig = sign(&kp.private, msg).unwrap();
        assert!(verify(&kp.public, msg, &sig).is_ok());
    }

    #[test]
    fn test_pss_verify_rejects_wrong_key() {
        let kp_a = KeyPair::generate().unwrap();
        let kp_b = KeyPair::generate().unwrap();
        let msg = b"SEND 42 body";
        let sig = sign(&kp_a.private, msg).unwrap();
        assert!(verify(&kp_b.public, msg, &sig).is_err());
    }

    #[test]
    fn test_pss_verify_rejects_tampered_message() {
        let kp = KeyPair::generate().unwrap();
        let sig = sign(&kp.private, b"ACK 1 rcvid").unwrap();
        assert!(verify(&kp.public, b"ACK 1 other-id", &sig).is_err());
    }
}
