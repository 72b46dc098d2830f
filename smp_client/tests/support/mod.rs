//! A minimal SMP broker, enough of the server side of the protocol to
//! drive [`smp_client::SMPClient`] through a real handshake and a handful
//! of commands over an in-memory duplex pipe. Not a spec target itself
//! (the broker role is explicitly out of scope) — this exists purely to
//! give the client's end-to-end tests something to talk to.
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rsa::{traits::PublicKeyParts, RsaPrivateKey};
use tokio::io::{AsyncRead, AsyncWrite};

use smp_core::prelude::*;
use smp_crypto::{aesgcm, keys::KeyPair, rsa_enc};
use smp_protocol::{
    parse_any, serialize_broker, AnyCommand, BrokerCommand, FrameReader,
    FrameWriter, Party, RecipientCommand, SenderCommand, SessionKey, StreamFrames,
};

const PAD_BYTE: u8 = b'#';

async fn write_block(
    frames: &mut (impl FrameReader + FrameWriter),
    key: &mut SessionKey,
    block_size: usize,
    plaintext: &[u8],
) -> Outcome<()> {
    let cap = block_size - 16;
    let mut padded = plaintext.to_vec();
    padded.resize(cap, PAD_BYTE);
    let iv = key.next_iv()?;
    let ciphertext = aesgcm::encrypt(&key.aes_key, &iv, &padded)?;
    frames.write_all(&ciphertext).await
}

async fn read_block(
    frames: &mut (impl FrameReader + FrameWriter),
    key: &mut SessionKey,
    block_size: usize,
) -> Outcome<Option<Vec<u8>>> {
    let block = match frames.read_exact(block_size).await? {
        Some(b) => b,
        None => return Ok(None),
    };
    let iv = key.next_iv()?;
    Ok(Some(aesgcm::decrypt(&key.aes_key, &iv, &block)?))
}

/// What the broker side ends up with after a successful handshake: the
/// encrypted channel plus the two session keys, named from the broker's
/// own perspective (its `snd_key` is the client's `rcvKey`, and vice
/// versa).
pub struct BrokerSession<S> {
    frames: StreamFrames<S>,
    snd_key: SessionKey,
    rcv_key: SessionKey,
    block_size: usize,
}

/// Runs the server side of the handshake (spec.md §4.3) over `stream`,
/// writing `welcome_version` (e.g. `"0.4.0.0"`) as the welcome block's
/// plaintext. `rsa_key` is the broker's long-term handshake key.
pub async fn run_handshake<S: AsyncRead + AsyncWrite + Unpin + Send>(
    stream: S,
    rsa_key: &RsaPrivateKey,
    spki_der: &[u8],
    block_size: usize,
    welcome_version: &str,
) -> Outcome<BrokerSession<S>> {
    let mut frames = StreamFrames::new(stream);

    let mut header = Vec::with_capacity(8);
    header.extend_from_slice(&(block_size as u32).to_be_bytes());
    header.extend_from_slice(&0u16.to_be_bytes());
    header.extend_from_slice(&(spki_der.len() as u16).to_be_bytes());
    frames.write_all(&header).await?;
    frames.write_all(spki_der).await?;

    let wrapped = match frames.read_exact(rsa_key.size()).await? {
        Some(b) => b,
        None => return Err(err!("Client closed before sending its handshake body."; IO, Network, Closed)),
    };
    let body = rsa_enc::decrypt(rsa_key, &wrapped)?;
    if body.len() != 102 {
        return Err(err!("Malformed handshake body: {} bytes, expected 102.", body.len(); Invalid, Size));
    }
    let client_snd_aes: [u8; 32] = body[6..38].try_into().unwrap();
    let client_snd_iv: [u8; 16] = body[38..54].try_into().unwrap();
    let client_rcv_aes: [u8; 32] = body[54..86].try_into().unwrap();
    let client_rcv_iv: [u8; 16] = body[86..102].try_into().unwrap();

    // The broker sends with the key the client will receive with, and
    // receives with the key the client sent.
    let mut snd_key = SessionKey { aes_key: client_rcv_aes, base_iv: client_rcv_iv, counter: 0 };
    let rcv_key = SessionKey { aes_key: client_snd_aes, base_iv: client_snd_iv, counter: 0 };

    let welcome_plain = format!("{} ", welcome_version);
    write_block(&mut frames, &mut snd_key, block_size, welcome_plain.as_bytes()).await?;

    Ok(BrokerSession { frames, snd_key, rcv_key, block_size })
}

struct QueueRecord {
    rcv_id: Vec<u8>,
}

/// Serves `NEW`/`KEY`/`SUB`/`ACK`/`SEND` against a trivial in-memory
/// queue table until the client disconnects, unsolicited-pushing one
/// `MSG` per successful `SEND` to whichever recipient owns that `sndId`.
pub async fn serve<S: AsyncRead + AsyncWrite + Unpin + Send>(mut session: BrokerSession<S>) -> Outcome<()> {
    let mut next_id: u64 = 1;
    let mut queues: HashMap<Vec<u8>, QueueRecord> = HashMap::new();

    loop {
        let block = match read_block(&mut session.frames, &mut session.rcv_key, session.block_size).await {
            Ok(Some(b)) => b,
            Ok(None) => return Ok(()),
            Err(_) => return Ok(()),
        };
        let Some((corr_id, queue_id, cmd)) = parse_transmission(&block) else { continue };

        let response = match cmd {
            AnyCommand::Recipient(RecipientCommand::New { .. }) => {
                let rcv_id = format!("rcv{}", next_id).into_bytes();
                let snd_id = format!("snd{}", next_id).into_bytes();
                next_id += 1;
                queues.insert(snd_id.clone(), QueueRecord { rcv_id: rcv_id.clone() });
                Some(BrokerCommand::Ids { rcv_id, snd_id })
            },
            AnyCommand::Recipient(RecipientCommand::Key { .. }) => Some(BrokerCommand::Ok),
            AnyCommand::Recipient(RecipientCommand::Sub) => Some(BrokerCommand::Ok),
            AnyCommand::Recipient(RecipientCommand::Ack) => Some(BrokerCommand::Ok),
            AnyCommand::Recipient(RecipientCommand::Off) => Some(BrokerCommand::Ok),
            AnyCommand::Recipient(RecipientCommand::Del) => Some(BrokerCommand::Ok),
            AnyCommand::Sender(SenderCommand::Send { msg_body }) => {
                let push_to = queues.get(&queue_id).map(|r| r.rcv_id.clone());
                let ack = BrokerCommand::Ok;
                write_transmission(&mut session, &corr_id, &queue_id, &ack).await?;
                if let Some(rcv_id) = push_to {
                    let msg = BrokerCommand::Msg {
                        msg_id: b"m1".to_vec(),
                        ts: DateTime::<Utc>::from_timestamp_millis(1_700_000_000_000).unwrap(),
                        msg_body,
                    };
                    write_transmission(&mut session, "push", &rcv_id, &msg).await?;
                }
                continue;
            },
            AnyCommand::Sender(SenderCommand::Ping) => Some(BrokerCommand::Pong),
            AnyCommand::Broker(_) => None,
        };

        if let Some(cmd) = response {
            write_transmission(&mut session, &corr_id, &queue_id, &cmd).await?;
        }
    }
}

fn parse_transmission(block: &[u8]) -> Option<(String, Vec<u8>, AnyCommand)> {
    use smp_core::parse::Parser;
    let mut p = Parser::new(block);
    let raw_sig = p.take_while0(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'=');
    let _ = smp_core::byte::from_base64(std::str::from_utf8(raw_sig).ok()?).ok()?;
    p.space().ok()?;
    let corr_id = String::from_utf8(p.word().to_vec()).ok()?;
    p.space().ok()?;
    let raw_qid = p.take_while0(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'=');
    let queue_id = smp_core::byte::from_base64(std::str::from_utf8(raw_qid).ok()?).ok()?;
    p.space().ok()?;
    let (party, cmd) = parse_any(&mut p).ok()?;
    if party == Party::Broker {
        return None;
    }
    Some((corr_id, queue_id, cmd))
}

async fn write_transmission<S: AsyncRead + AsyncWrite + Unpin + Send>(
    session: &mut BrokerSession<S>,
    corr_id: &str,
    queue_id: &[u8],
    cmd: &BrokerCommand,
) -> Outcome<()> {
    let mut wire = Vec::new();
    wire.push(b' '); // empty signature
    wire.extend_from_slice(corr_id.as_bytes());
    wire.push(b' ');
    wire.extend_from_slice(smp_core::byte::to_base64(queue_id).as_bytes());
    wire.push(b' ');
    wire.extend_from_slice(&serialize_broker(cmd)?);
    write_block(&mut session.frames, &mut session.snd_key, session.block_size, &wire).await
}

/// A ready-made RSA keypair and its SPKI DER encoding for handshake tests,
/// generated once per call (2048-bit RSA keygen is not free, so callers
/// that run several scenarios should generate one and reuse it).
pub fn broker_identity() -> (RsaPrivateKey, Vec<u8>) {
    let kp = KeyPair::generate().unwrap();
    let der = kp.public_spki_der().unwrap();
    (kp.private, der)
}
