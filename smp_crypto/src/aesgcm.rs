//! AES-256-GCM, the per-block transport cipher (spec.md §4.3). Unlike
//! `fe2o3_crypto::enc::EncryptionScheme::AES_256_GCM`, the nonce here is
//! never transmitted — it is derived deterministically per block from the
//! session's base IV and block counter (owned by `smp_protocol::transport`)
//! — so this module takes the nonce as an explicit argument rather than
//! generating and appending a random one. spec.md §4.3 derives a full
//! 16-byte IV, not the `aes-gcm` crate's default 12-byte nonce, so this
//! builds the cipher from the crate's generic `AesGcm<Aes256, NonceSize>`
//! rather than its `Aes256Gcm` alias (which is hardcoded to a 12-byte
//! nonce). The combined ciphertext-then-tag output is exactly the wire
//! layout spec.md §4.3 describes (`blockSize - 16` ciphertext bytes
//! followed by a 16-byte tag).
use smp_core::prelude::*;

use aes_gcm::{
    aead::{generic_array::{typenum::U16, GenericArray}, Aead, Payload},
    aes::Aes256,
    AesGcm, KeyInit,
};

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 16;
pub const TAG_LEN: usize = 16;

type Cipher = AesGcm<Aes256, U16>;

pub fn encrypt(key: &[u8; KEY_LEN], nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Outcome<Vec<u8>> {
    let cipher = res!(Cipher::new_from_slice(key); Key, Encrypt);
    let nonce = GenericArray::from_slice(nonce);
    match cipher.encrypt(nonce, Payload { msg: plaintext, aad: &[] }) {
        Ok(out) => Ok(out),
        Err(e) => Err(err!(e, "While AES-256-GCM encrypting {} bytes.", plaintext.len(); Encrypt)),
    }
}

pub fn decrypt(key: &[u8; KEY_LEN], nonce: &[u8; NONCE_LEN], ciphertext: &[u8]) -> Outcome<Vec<u8>> {
    let cipher = res!(Cipher::new_from_slice(key); Key, Decrypt);
    let nonce = GenericArray::from_slice(nonce);
    match cipher.decrypt(nonce, Payload { msg: ciphertext, aad: &[] }) {
        Ok(out) => Ok(out),
        Err(e) => Err(err!(e, "While AES-256-GCM decrypting {} bytes.", ciphertext.len(); Decrypt)),
    }
}
