//! Byte codec primitives: base64 (the wire format's encoding for key and id
//! fields) and the `FromBytes`/`ToBytes` trait pair used to give fixed
//! binary shapes (the transport handshake header) a uniform encode/decode
//! surface. Grounded on `fe2o3_core::byte`.
use crate::prelude::*;

use base64::{engine::general_purpose::STANDARD, Engine as _};

pub fn to_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

pub fn from_base64(s: &str) -> Outcome<Vec<u8>> {
    Ok(res!(STANDARD.decode(s); Decode, Invalid, Input))
}

/// Decode a value of `Self` from the front of `buf`, returning the value
/// and the number of bytes consumed.
pub trait FromBytes: Sized {
    fn from_bytes(buf: &[u8]) -> Outcome<(Self, usize)>;
}

/// Append this value's wire encoding to `buf` without consuming `self`.
pub trait ToBytes {
    fn to_bytes(&self, buf: Vec<u8>) -> Outcome<Vec<u8>>;
}

pub fn too_few<T>(nbyts: usize, minbyts: usize, desc: &str) -> Error<ErrTag> {
    err!(
        "Only {} byte{}, require at least {} to decode the {}.",
        nbyts, if nbyts == 1 { "" } else { "s" }, minbyts, desc;
        Decode, Input, Missing
    )
}

macro_rules! impl_be_bytes {
    ($t:ty, $len:expr) => {
        impl ToBytes for $t {
            fn to_bytes(&self, mut buf: Vec<u8>) -> Outcome<Vec<u8>> {
                buf.extend_from_slice(&self.to_be_bytes());
                Ok(buf)
            }
        }
        impl FromBytes for $t {
            fn from_bytes(buf: &[u8]) -> Outcome<(Self, usize)> {
                if buf.len() < $len {
                    return Err(too_few(buf.len(), $len, stringify!($t)));
                }
                let arr: [u8; $len] = res!(buf[0..$len].try_into(); Decode);
                Ok((<$t>::from_be_bytes(arr), $len))
            }
        }
    };
}

impl_be_bytes!(u16, 2);
impl_be_bytes!(u32, 4);
impl_be_bytes!(u64, 8);
