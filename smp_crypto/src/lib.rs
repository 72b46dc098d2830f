//! The crypto provider (C3): RSA-OAEP/RSA-PSS for the handshake, AES-256-GCM
//! for the per-block transport cipher, SHA-256 for key-hash pinning.
//!
//! No RSA crate appears anywhere in the teacher's or the wider retrieved
//! pack's dependency set, so `rsa`/`sha2` are new additions here (see
//! DESIGN.md). The AES-GCM call pattern and the scheme-as-enum shape are
//! grounded on `fe2o3_crypto::enc`/`fe2o3_crypto::sign`.
#![forbid(unsafe_code)]

pub mod aesgcm;
pub mod e2e;
pub mod hash;
pub mod keys;
pub mod rsa_enc;
pub mod sign;

pub use smp_core::{Outcome, prelude::*};
