//! Encrypted transport (C5): the handshake (spec.md §4.3 steps 1-6) and
//! per-block AES-GCM framing with deterministic per-direction IV
//! derivation. Grounded on `fe2o3_crypto::enc`'s AEAD call pattern for the
//! per-block cipher, and on `fe2o3_steel`'s `tokio::io::split` idiom for
//! giving the inbound loop and an outbound writer independent access to
//! the stream (spec.md §5: the send and receive session counters are
//! producer-only/inbound-loop-only respectively, so they never contend).
use smp_core::byte::{FromBytes, ToBytes};
use smp_core::prelude::*;
use smp_crypto::{aesgcm, keys, rsa_enc};

use crate::frames::{FrameReader, FrameWriter, Frames};
use crate::server::SMPServer;
use crate::session::{SessionKey, THandle};

pub const MIN_BLOCK_SIZE: usize = 4096;
pub const MAX_BLOCK_SIZE: usize = 65536;
pub const RSA_TRANSPORT_MODE: u16 = 0;
/// `[major, minor, patch, build]`, compared lexicographically over the
/// first two components only (spec.md §4.3 step 6).
pub const CURRENT_SMP_VERSION: [u16; 4] = [0, 4, 1, 0];

const PAD_BYTE: u8 = b'#';

/// The live connection immediately after the handshake, before the
/// caller splits it into independent read/write halves via [`split`].
pub struct EncryptedTransport<F: Frames> {
    frames: F,
    th: THandle,
}

impl<F: Frames> EncryptedTransport<F> {
    /// Run the client side of the handshake (spec.md §4.3 steps 1-6) and
    /// return a ready-to-use transport. The handshake itself is strictly
    /// sequential, so it runs over the combined `Frames` object before
    /// any split.
    pub async fn handshake(mut frames: F, server: &SMPServer) -> Outcome<Self> {
        // Steps 1-2: fixed 8-byte server header.
        let header = match res!(frames.read_exact(8).await; IO) {
            Some(h) => h,
            None => return Err(err!("Byte channel closed before sending the handshake header."; IO, Network, Closed)),
        };
        let (block_size, n) = res!(u32::from_bytes(&header));
        let (transport_mode, m) = res!(u16::from_bytes(&header[n..]));
        let (key_size, _) = res!(u16::from_bytes(&header[n + m..]));
        let block_size = block_size as usize;
        let key_size = key_size as usize;

        if block_size < MIN_BLOCK_SIZE || block_size > MAX_BLOCK_SIZE {
            return Err(err!(
                "Server block size {} is outside the allowed range [{}, {}].",
                block_size, MIN_BLOCK_SIZE, MAX_BLOCK_SIZE;
                Invalid, Size
            ));
        }
        if transport_mode != RSA_TRANSPORT_MODE {
            return Err(err!(
                "Unsupported transport mode {}; only binary RSA transport (0) is implemented.",
                transport_mode;
                Invalid, Version
            ));
        }

        let spki_der = match res!(frames.read_exact(key_size).await; IO) {
            Some(k) => k,
            None => return Err(err!("Byte channel closed before sending the server's public key."; IO, Network, Closed)),
        };

        if let Some(expected) = server.key_hash {
            let actual = keys::key_hash(&spki_der);
            if actual != expected {
                return Err(err!(
                    "Server key hash does not match the expected pin.";
                    Auth, Mismatch, Key
                ));
            }
        }
        let server_public_key = res!(keys::public_key_from_spki_der(&spki_der));

        // Step 3: fresh session keys, one per direction.
        let snd_key = SessionKey::generate();
        let rcv_key = SessionKey::generate();

        // Step 4: client handshake body, RSA-OAEP-wrapped, written as one frame.
        let mut body = Vec::with_capacity(102);
        body = res!((block_size as u32).to_bytes(body));
        body = res!(0u16.to_bytes(body));
        body.extend_from_slice(&snd_key.aes_key);
        body.extend_from_slice(&snd_key.base_iv);
        body.extend_from_slice(&rcv_key.aes_key);
        body.extend_from_slice(&rcv_key.base_iv);
        let wrapped = res!(rsa_enc::encrypt(&server_public_key, &body));
        res!(frames.write_all(&wrapped).await; IO);

        let mut th = THandle { snd_key, rcv_key, block_size };

        // Step 6: read the welcome block and check version compatibility.
        let welcome_bytes = match res!(frames.read_exact(block_size).await; IO) {
            Some(b) => b,
            None => return Err(err!("Byte channel closed before sending the welcome block."; IO, Network, Closed)),
        };
        let welcome_plain = decrypt_block(&mut th.rcv_key, &welcome_bytes)?;
        let version_token = welcome_plain
            .iter()
            .position(|b| *b == b' ' || *b == PAD_BYTE)
            .map(|i| &welcome_plain[..i])
            .unwrap_or(&welcome_plain[..]);
        let version_str = res!(std::str::from_utf8(version_token); Decode, Version);
        let parts: Vec<&str> = version_str.split('.').collect();
        if parts.len() < 2 {
            return Err(err!("Malformed welcome version string '{}'.", version_str; Decode, Version, Invalid));
        }
        let major: u16 = res!(parts[0].parse(); Decode, Version);
        let minor: u16 = res!(parts[1].parse(); Decode, Version);
        if major > CURRENT_SMP_VERSION[0] || (major == CURRENT_SMP_VERSION[0] && minor > CURRENT_SMP_VERSION[1]) {
            return Err(err!(
                "Server version {}.{} is incompatible with this client's {}.{}.",
                major, minor, CURRENT_SMP_VERSION[0], CURRENT_SMP_VERSION[1];
                Version, Invalid
            ));
        }

        Ok(Self { frames, th })
    }

    pub fn block_size(&self) -> usize { self.th.block_size }

    /// Splits into independent reader/writer halves, each owning its own
    /// direction's `SessionKey` and counter. `split_frames` performs the
    /// underlying byte-channel split (e.g. `frames::split` for a
    /// `StreamFrames<S>`).
    pub fn split<R: FrameReader, W: FrameWriter>(
        self,
        split_frames: impl FnOnce(F) -> (R, W),
    ) -> (TransportReader<R>, TransportWriter<W>) {
        let (r, w) = split_frames(self.frames);
        (
            TransportReader { frames: r, rcv_key: self.th.rcv_key, block_size: self.th.block_size },
            TransportWriter { frames: w, snd_key: self.th.snd_key, block_size: self.th.block_size },
        )
    }

    /// Encrypt and write one plaintext block, padding with `#` on the
    /// right to exactly `blockSize - 16` bytes first (spec.md §4.3).
    pub async fn write_block(&mut self, plaintext: &[u8]) -> Outcome<()> {
        write_block_on(&mut self.frames, &mut self.th.snd_key, self.th.block_size, plaintext).await
    }

    /// Read and decrypt one block. Returns `Ok(None)` on a clean close.
    pub async fn read_block(&mut self) -> Outcome<Option<Vec<u8>>> {
        read_block_on(&mut self.frames, &mut self.th.rcv_key, self.th.block_size).await
    }
}

/// The inbound half of a split transport (spec.md §4.4's inbound loop
/// owns exactly this: a reader plus the receive-side session key).
pub struct TransportReader<R: FrameReader> {
    frames: R,
    rcv_key: SessionKey,
    block_size: usize,
}

impl<R: FrameReader> TransportReader<R> {
    pub async fn read_block(&mut self) -> Outcome<Option<Vec<u8>>> {
        read_block_on(&mut self.frames, &mut self.rcv_key, self.block_size).await
    }
}

/// The outbound half of a split transport (spec.md §4.4's `sendSMPCommand`
/// owns exactly this: a writer plus the send-side session key).
pub struct TransportWriter<W: FrameWriter> {
    frames: W,
    snd_key: SessionKey,
    block_size: usize,
}

impl<W: FrameWriter> TransportWriter<W> {
    pub async fn write_block(&mut self, plaintext: &[u8]) -> Outcome<()> {
        write_block_on(&mut self.frames, &mut self.snd_key, self.block_size, plaintext).await
    }
}

async fn write_block_on<W: FrameWriter>(
    frames: &mut W,
    snd_key: &mut SessionKey,
    block_size: usize,
    plaintext: &[u8],
) -> Outcome<()> {
    let cap = block_size - 16;
    if plaintext.len() >= cap {
        return Err(err!(
            "Payload of {} bytes does not fit in a block (capacity {}); large message.",
            plaintext.len(), cap;
            Size, Invalid, Output
        ));
    }
    let mut padded = plaintext.to_vec();
    padded.resize(cap, PAD_BYTE);
    let iv = res!(snd_key.next_iv());
    let ciphertext = res!(aesgcm::encrypt(&snd_key.aes_key, &iv, &padded));
    debug_assert_eq!(ciphertext.len(), block_size);
    res!(frames.write_all(&ciphertext).await; IO);
    Ok(())
}

async fn read_block_on<R: FrameReader>(
    frames: &mut R,
    rcv_key: &mut SessionKey,
    block_size: usize,
) -> Outcome<Option<Vec<u8>>> {
    let block = match res!(frames.read_exact(block_size).await; IO) {
        Some(b) => b,
        None => return Ok(None),
    };
    let plain = decrypt_block(rcv_key, &block)?;
    Ok(Some(plain))
}

fn decrypt_block(rcv_key: &mut SessionKey, block: &[u8]) -> Outcome<Vec<u8>> {
    let iv = res!(rcv_key.next_iv());
    aesgcm::decrypt(&rcv_key.aes_key, &iv, block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// An in-memory `Frames` for exercising the framing logic without a
    /// real socket: bytes written land in `outbound`, from where a test
    /// can feed them back in as `inbound` to simulate a loopback.
    struct MockPair {
        inbound: VecDeque<u8>,
        outbound: Arc<Mutex<VecDeque<u8>>>,
    }

    #[async_trait::async_trait]
    impl FrameReader for MockPair {
        async fn read_exact(&mut self, n: usize) -> Outcome<Option<Vec<u8>>> {
            if self.inbound.len() < n {
                return Ok(None);
            }
            Ok(Some(self.inbound.drain(..n).collect()))
        }
    }

    #[async_trait::async_trait]
    impl FrameWriter for MockPair {
        async fn write_all(&mut self, data: &[u8]) -> Outcome<()> {
            self.outbound.lock().unwrap().extend(data.iter().copied());
            Ok(())
        }
    }

    #[test]
    fn test_block_padding_and_capacity() {
        let th = THandle {
            snd_key: SessionKey::generate(),
            rcv_key: SessionKey::generate(),
            block_size: 4096,
        };
        assert_eq!(th.plaintext_len(), 4080);
    }

    #[tokio::test]
    async fn test_write_block_then_read_block_via_loopback() {
        let key = SessionKey::generate();
        let outbound = Arc::new(Mutex::new(VecDeque::new()));
        let mut transport = EncryptedTransport {
            frames: MockPair { inbound: VecDeque::new(), outbound: outbound.clone() },
            th: THandle { snd_key: key.clone(), rcv_key: key.clone(), block_size: 4096 },
        };

        transport.write_block(b"NEW rsa:abc").await.unwrap();
        let fed_back: VecDeque<u8> = outbound.lock().unwrap().drain(..).collect();
        transport.frames.inbound = fed_back;

        let plain = transport.read_block().await.unwrap().unwrap();
        assert!(plain.starts_with(b"NEW rsa:abc"));
        assert!(plain[11..].iter().all(|b| *b == PAD_BYTE));
    }

    #[tokio::test]
    async fn test_write_block_rejects_oversized_payload() {
        let key = SessionKey::generate();
        let mut transport = EncryptedTransport {
            frames: MockPair { inbound: VecDeque::new(), outbound: Arc::new(Mutex::new(VecDeque::new())) },
            th: THandle { snd_key: key.clone(), rcv_key: key, block_size: 4096 },
        };
        let too_big = vec![0u8; 4080];
        assert!(transport.write_block(&too_big).await.is_err());
    }

    #[tokio::test]
    async fn test_read_block_returns_none_on_clean_close() {
        let key = SessionKey::generate();
        let mut transport = EncryptedTransport {
            frames: MockPair { inbound: VecDeque::new(), outbound: Arc::new(Mutex::new(VecDeque::new())) },
            th: THandle { snd_key: key.clone(), rcv_key: key, block_size: 4096 },
        };
        assert!(transport.read_block().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_split_reader_and_writer_are_independent() {
        let snd = SessionKey::generate();
        let rcv = SessionKey::generate();
        let outbound = Arc::new(Mutex::new(VecDeque::new()));
        let transport = EncryptedTransport {
            frames: MockPair { inbound: VecDeque::new(), outbound: outbound.clone() },
            th: THandle { snd_key: snd, rcv_key: rcv, block_size: 4096 },
        };
        let (mut reader, mut writer) = transport.split(|frames| {
            // A `MockPair` can't truly split (it's one in-memory buffer
            // pair), so this test just confirms the reader/writer halves
            // work on their own once separated.
            let inbound = Arc::new(Mutex::new(frames.inbound));
            let reader_half = MockReadHalf { inbound: inbound.clone() };
            let writer_half = MockWriteHalf { outbound: frames.outbound };
            (reader_half, writer_half)
        });

        writer.write_block(b"PING").await.unwrap();
        let sent: VecDeque<u8> = outbound.lock().unwrap().drain(..).collect();
        assert_eq!(sent.len(), 4096);

        // Feed what was sent back into the reader's inbound buffer and
        // confirm a concurrent-looking reader/writer pair both still work.
        *reader.frames.inbound.lock().unwrap() = sent;
        let plain = reader.read_block().await.unwrap().unwrap();
        assert!(plain.starts_with(b"PING"));
    }

    struct MockReadHalf {
        inbound: Arc<Mutex<VecDeque<u8>>>,
    }

    #[async_trait::async_trait]
    impl FrameReader for MockReadHalf {
        async fn read_exact(&mut self, n: usize) -> Outcome<Option<Vec<u8>>> {
            let mut guard = self.inbound.lock().unwrap();
            if guard.len() < n {
                return Ok(None);
            }
            Ok(Some(guard.drain(..n).collect()))
        }
    }

    struct MockWriteHalf {
        outbound: Arc<Mutex<VecDeque<u8>>>,
    }

    #[async_trait::async_trait]
    impl FrameWriter for MockWriteHalf {
        async fn write_all(&mut self, data: &[u8]) -> Outcome<()> {
            self.outbound.lock().unwrap().extend(data.iter().copied());
            Ok(())
        }
    }
}
