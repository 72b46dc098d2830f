//! RSA-OAEP-SHA256 encrypt/decrypt, used once per connection to wrap the
//! client's session keys during the handshake (spec.md §4.3 step 3).
//! Grounded on `fe2o3_crypto::enc::Encrypter`'s encrypt/decrypt pair shape.
use smp_core::prelude::*;

use rand_core::OsRng;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

pub fn encrypt(public: &RsaPublicKey, plaintext: &[u8]) -> Outcome<Vec<u8>> {
    let padding = Oaep::new::<Sha256>();
    Ok(res!(
        public.encrypt(&mut OsRng, padding, plaintext);
        Encrypt, Key
    ))
}

pub fn decrypt(private: &RsaPrivateKey, ciphertext: &[u8]) -> Outcome<Vec<u8>> {
    let padding = Oaep::new::<Sha256>();
    Ok(res!(private.decrypt(padding, ciphertext); Decrypt, Key))
}
