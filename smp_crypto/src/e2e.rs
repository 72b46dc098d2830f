//! One-shot end-to-end helpers over a message body (spec.md §8): a fresh
//! AES-256 key is RSA-OAEP-wrapped under the recipient's public key, then
//! the body is AES-GCM-sealed into a fixed-size frame under that key, so
//! `encryptE2E(pk, n, x)` always produces exactly `modulusBytes + n` bytes
//! regardless of `|x|`. Queue creation returns no shared secret — spec.md's
//! Non-goals exclude an agent-level E2E ratchet — so this is a
//! self-contained convenience pair a caller can use if it already has the
//! recipient's RSA public key, not a protocol feature in its own right.
//! Grounded on `fe2o3_crypto::enc`'s top-level convenience constructors,
//! which bundle key management behind a couple of free functions rather
//! than exposing the cipher directly, and on `crate::rsa_enc`'s own
//! wrap-then-seal shape (which this reuses directly for the key-wrapping
//! half).
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};

use smp_core::prelude::*;
use smp_core::rand::bytes;

use crate::aesgcm::{self, KEY_LEN, NONCE_LEN};
use crate::rsa_enc;

const PAD_BYTE: u8 = b'#';
const LEN_PREFIX: usize = 4;

/// A fresh key is used for every call, so a fixed all-zero nonce is safe:
/// AES-GCM only requires nonce uniqueness per key, never reuse across
/// calls here.
const ZERO_NONCE: [u8; NONCE_LEN] = [0u8; NONCE_LEN];

/// Encrypts `plaintext` for `pk`'s holder into exactly `n` AES-GCM bytes
/// preceded by the RSA-OAEP-wrapped key (`modulusBytes` bytes), for a
/// total ciphertext length of `modulusBytes + n`. `plaintext` is preceded
/// by its own 4-byte big-endian length and padded with `#` to fill the
/// frame, the same length-then-pad shape `smp_protocol::codec` uses for
/// `SEND`/`MSG` bodies.
pub fn encrypt_e2e(pk: &RsaPublicKey, n: usize, plaintext: &[u8]) -> Outcome<Vec<u8>> {
    let capacity = match n.checked_sub(aesgcm::TAG_LEN) {
        Some(c) => c,
        None => return Err(err!(
            "E2E frame size {} is too small to hold a {}-byte AEAD tag.", n, aesgcm::TAG_LEN;
            Size, Invalid, Input
        )),
    };
    if plaintext.len() + LEN_PREFIX > capacity {
        return Err(err!(
            "Plaintext of {} bytes does not fit in a {}-byte E2E frame.",
            plaintext.len(), n;
            Size, Invalid, Input
        ));
    }

    let mut padded = Vec::with_capacity(capacity);
    padded.extend_from_slice(&(plaintext.len() as u32).to_be_bytes());
    padded.extend_from_slice(plaintext);
    padded.resize(capacity, PAD_BYTE);

    let sym_key: [u8; KEY_LEN] = bytes();
    let body = aesgcm::encrypt(&sym_key, &ZERO_NONCE, &padded)?;
    debug_assert_eq!(body.len(), n);

    let mut out = rsa_enc::encrypt(pk, &sym_key)?;
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decrypts a blob produced by [`encrypt_e2e`] for the matching `sk`.
pub fn decrypt_e2e(sk: &RsaPrivateKey, data: &[u8]) -> Outcome<Vec<u8>> {
    let key_len = sk.size();
    if data.len() <= key_len {
        return Err(err!(
            "E2E ciphertext of {} bytes is too short for a {}-byte wrapped key.",
            data.len(), key_len;
            Decrypt, Invalid, Input
        ));
    }
    let (wrapped_key, body) = data.split_at(key_len);
    let sym_key_bytes = rsa_enc::decrypt(sk, wrapped_key)?;
    let sym_key: [u8; KEY_LEN] = match sym_key_bytes.try_into() {
        Ok(arr) => arr,
        Err(_) => return Err(err!("Unwrapped E2E key is not {} bytes.", KEY_LEN; Decrypt, Invalid)),
    };

    let padded = aesgcm::decrypt(&sym_key, &ZERO_NONCE, body)?;
    if padded.len() < LEN_PREFIX {
        return Err(err!("Decrypted E2E frame is shorter than its length prefix."; Decrypt, Invalid));
    }
    let len = u32::from_be_bytes([padded[0], padded[1], padded[2], padded[3]]) as usize;
    if LEN_PREFIX + len > padded.len() {
        return Err(err!(
            "Decrypted E2E frame claims {} plaintext bytes but only has {}.",
            len, padded.len() - LEN_PREFIX;
            Decrypt, Invalid
        ));
    }
    Ok(padded[LEN_PREFIX..LEN_PREFIX + len].to_vec())
}
