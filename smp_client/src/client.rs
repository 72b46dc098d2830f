//! The multiplexed client (C6): correlation-id generation, signing,
//! the inbound loop and its routing, and the convenience operations
//! built on `sendSMPCommand` (spec.md §4.4). Grounded on `fe2o3_net`'s
//! one-task-per-connection client idiom (a spawned inbound loop,
//! `Arc`-shared state with the caller) and on spec.md §4.4 directly for
//! the routing/correlation logic itself.
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, WriteHalf};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use rsa::RsaPrivateKey;

use smp_core::parse::Parser;
use smp_core::prelude::*;
use smp_protocol::frames::StreamWriteHalf;
use smp_protocol::{
    parse_any, split_stream_frames, AnyCommand, BrokerCommand, BrokerTransmission, ClientCommand,
    ClientTransmission, CmdSub, EncryptedTransport, FrameReader, Party, RecipientCommand, SMPError,
    SMPServer, SenderCommand, StreamFrames, TransportReader, TransportWriter,
};

use crate::config::ClientConfig;
use crate::queue::BoundedQueue;
use crate::request::{PendingRequests, RequestOutcome};

/// What the application receives for each unsolicited broker push
/// (spec.md §6: "the msgQ receives `{server, queueId, command}`").
#[derive(Clone, Debug)]
pub struct ServerMessage {
    pub server: SMPServer,
    pub queue_id: Vec<u8>,
    pub command: BrokerCommand,
}

/// A connected client, one per handshake, generic over the underlying
/// byte-stream type (a `TcpStream`, a `tokio_rustls` stream, or anything
/// else `AsyncRead + AsyncWrite`).
pub struct SMPClient<S> {
    writer: AsyncMutex<Option<TransportWriter<StreamWriteHalf<WriteHalf<S>>>>>,
    pending: Arc<PendingRequests>,
    next_corr_id: AtomicU64,
    connected: Arc<AtomicBool>,
    msg_queue: Arc<BoundedQueue<ServerMessage>>,
    server: SMPServer,
    block_size: usize,
    write_timeout: std::time::Duration,
    inbound_task: AsyncMutex<Option<JoinHandle<()>>>,
}

impl<S: AsyncRead + AsyncWrite + Unpin + Send + 'static> SMPClient<S> {
    /// Performs the handshake over `stream`, spawns the inbound loop, and
    /// returns a ready-to-use client (spec.md §4.3 + §4.4).
    pub async fn connect(
        stream: S,
        mut server: SMPServer,
        mut cfg: ClientConfig,
        msg_queue: Arc<BoundedQueue<ServerMessage>>,
    ) -> Outcome<Self> {
        server.check_and_fix()?;
        cfg.check_and_fix()?;

        let frames = StreamFrames::new(stream);
        let transport = match timeout(cfg.handshake_timeout, EncryptedTransport::handshake(frames, &server)).await {
            Ok(result) => result?,
            Err(_) => return Err(err!(
                "Handshake timed out after {:?}.", cfg.handshake_timeout;
                Timeout, Network
            )),
        };
        let block_size = transport.block_size();
        let (mut reader, writer) = transport.split(split_stream_frames);

        let pending = Arc::new(PendingRequests::new());
        let connected = Arc::new(AtomicBool::new(true));

        let loop_pending = pending.clone();
        let loop_connected = connected.clone();
        let loop_msg_queue = msg_queue.clone();
        let loop_server = server.clone();
        let inbound_task = tokio::spawn(async move {
            run_inbound_loop(&mut reader, &loop_pending, &loop_msg_queue, &loop_server).await;
            loop_connected.store(false, Ordering::Release);
            loop_pending.close_all().await;
            loop_msg_queue.close().await;
        });

        Ok(Self {
            writer: AsyncMutex::new(Some(writer)),
            pending,
            next_corr_id: AtomicU64::new(0),
            connected,
            msg_queue,
            server,
            block_size,
            write_timeout: cfg.write_timeout,
            inbound_task: AsyncMutex::new(Some(inbound_task)),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn server(&self) -> &SMPServer {
        &self.server
    }

    /// The negotiated block size (spec.md §3's `th.blockSize`), cached
    /// from the handshake.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// The `msgQ` unsolicited-message queue (spec.md §4.5): callers
    /// `dequeue()` in their own loop to receive `MSG`/`END` pushes.
    pub fn message_queue(&self) -> &Arc<BoundedQueue<ServerMessage>> {
        &self.msg_queue
    }

    /// `sendSMPCommand` (spec.md §4.4): allocate a correlation id, sign
    /// and frame the transmission, register the pending request, write
    /// it, and await the matching response.
    pub async fn send_smp_command(
        &self,
        sign_key: Option<&RsaPrivateKey>,
        queue_id: &[u8],
        command: ClientCommand,
    ) -> Outcome<BrokerCommand> {
        let corr_id = self.next_corr_id.fetch_add(1, Ordering::Relaxed).to_string();

        let trn = ClientTransmission {
            sign_key: sign_key.cloned(),
            corr_id: corr_id.clone().into_bytes(),
            queue_id: queue_id.to_vec(),
            command,
        };
        let wire = trn.encode()?;

        let rx = self.pending.register(corr_id, queue_id.to_vec()).await;

        {
            let mut guard = self.writer.lock().await;
            let writer = match guard.as_mut() {
                Some(w) => w,
                None => return Err(err!("Transport has been disconnected."; Closed, Network)),
            };
            match timeout(self.write_timeout, writer.write_block(&wire)).await {
                Ok(result) => result?,
                Err(_) => return Err(err!("Write timed out after {:?}.", self.write_timeout; Timeout, Network)),
            }
        }

        match res!(rx.await; Closed, Bug) {
            RequestOutcome::Command(BrokerCommand::Err { error }) => Err(error.into()),
            RequestOutcome::Command(cmd) => Ok(cmd),
            RequestOutcome::Protocol(error) => Err(error.into()),
            RequestOutcome::Closed => Err(err!("Transport closed before a response arrived."; Closed, Network)),
        }
    }

    /// `createSMPQueue`: `NEW`; errors on a non-`IDS` response.
    pub async fn create_smp_queue(
        &self,
        rcv_key: &RsaPrivateKey,
        rcv_pub_key: Vec<u8>,
    ) -> Outcome<(Vec<u8>, Vec<u8>)> {
        let cmd = ClientCommand::Recipient(RecipientCommand::New { rcv_pub_key });
        match self.send_smp_command(Some(rcv_key), &[], cmd).await? {
            BrokerCommand::Ids { rcv_id, snd_id } => Ok((rcv_id, snd_id)),
            other => Err(unexpected_response("IDS", &other)),
        }
    }

    /// `subscribeSMPQueue`: `SUB`; accepts `OK` or `MSG` (the latter is
    /// enqueued to `msgQ` by the inbound loop before this resolves, since
    /// the response itself carries the message).
    pub async fn subscribe_smp_queue(&self, rcv_key: &RsaPrivateKey, queue_id: &[u8]) -> Outcome<()> {
        let cmd = ClientCommand::Recipient(RecipientCommand::Sub);
        match self.send_smp_command(Some(rcv_key), queue_id, cmd).await? {
            BrokerCommand::Ok | BrokerCommand::Msg { .. } => Ok(()),
            other => Err(unexpected_response("OK or MSG", &other)),
        }
    }

    /// `secureSMPQueue`: `KEY`; requires `OK`.
    pub async fn secure_smp_queue(
        &self,
        rcv_key: &RsaPrivateKey,
        queue_id: &[u8],
        snd_pub_key: Vec<u8>,
    ) -> Outcome<()> {
        let cmd = ClientCommand::Recipient(RecipientCommand::Key { snd_pub_key });
        match self.send_smp_command(Some(rcv_key), queue_id, cmd).await? {
            BrokerCommand::Ok => Ok(()),
            other => Err(unexpected_response("OK", &other)),
        }
    }

    /// `sendSMPMessage`: `SEND`; requires `OK`.
    pub async fn send_smp_message(
        &self,
        snd_key: Option<&RsaPrivateKey>,
        queue_id: &[u8],
        msg_body: Vec<u8>,
    ) -> Outcome<()> {
        let cmd = ClientCommand::Sender(SenderCommand::Send { msg_body });
        match self.send_smp_command(snd_key, queue_id, cmd).await? {
            BrokerCommand::Ok => Ok(()),
            other => Err(unexpected_response("OK", &other)),
        }
    }

    /// `ackSMPMessage`: `ACK`; accepts `OK` or `MSG`.
    pub async fn ack_smp_message(&self, rcv_key: &RsaPrivateKey, queue_id: &[u8]) -> Outcome<()> {
        let cmd = ClientCommand::Recipient(RecipientCommand::Ack);
        match self.send_smp_command(Some(rcv_key), queue_id, cmd).await? {
            BrokerCommand::Ok | BrokerCommand::Msg { .. } => Ok(()),
            other => Err(unexpected_response("OK or MSG", &other)),
        }
    }

    /// `suspendSMPQueue`: `OFF`; requires `OK`.
    pub async fn suspend_smp_queue(&self, rcv_key: &RsaPrivateKey, queue_id: &[u8]) -> Outcome<()> {
        let cmd = ClientCommand::Recipient(RecipientCommand::Off);
        match self.send_smp_command(Some(rcv_key), queue_id, cmd).await? {
            BrokerCommand::Ok => Ok(()),
            other => Err(unexpected_response("OK", &other)),
        }
    }

    /// `deleteSMPQueue`: `DEL`; requires `OK`.
    pub async fn delete_smp_queue(&self, rcv_key: &RsaPrivateKey, queue_id: &[u8]) -> Outcome<()> {
        let cmd = ClientCommand::Recipient(RecipientCommand::Del);
        match self.send_smp_command(Some(rcv_key), queue_id, cmd).await? {
            BrokerCommand::Ok => Ok(()),
            other => Err(unexpected_response("OK", &other)),
        }
    }

    /// Closes the transport and awaits the inbound loop's completion
    /// (spec.md §4.4's `disconnect()`).
    pub async fn disconnect(&self) -> Outcome<()> {
        let mut guard = self.inbound_task.lock().await;
        if let Some(handle) = guard.take() {
            handle.abort();
            let _ = handle.await;
        }
        // Dropping the write half closes the socket's write side; the
        // read half was already dropped along with the aborted task.
        self.writer.lock().await.take();
        self.connected.store(false, Ordering::Release);
        self.pending.close_all().await;
        self.msg_queue.close().await;
        Ok(())
    }
}

fn unexpected_response(expected: &str, got: &BrokerCommand) -> Error<ErrTag> {
    err!("Expected a {} response, got {}.", expected, got.tag(); Unexpected, Invalid)
}

/// A base64 field that may legitimately be empty (an unsigned
/// transmission's `sig`, or a broker response whose `queueId` is empty),
/// unlike [`Parser::base64_field`] which requires at least one byte.
fn base64_field_opt(p: &mut Parser) -> Outcome<Vec<u8>> {
    let raw = p.take_while0(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'=');
    smp_core::byte::from_base64(res!(std::str::from_utf8(raw); Decode, Input))
}

/// Parses one decrypted block into a [`BrokerTransmission`]: `sig base64
/// | ' ' | corrId word | ' ' | queueId base64 | ' ' | command` (spec.md
/// §4.4's inbound grammar). The signature field is present on the wire
/// but intentionally never verified here (spec.md §9: a server-side
/// concern). A block that doesn't parse, or whose tag doesn't belong to
/// the broker, collapses to [`BrokerTransmission::bad_block`] /
/// `SMPError::Cmd(CmdSub::Prohibited)` rather than propagating a parse
/// error, since a misbehaving peer must not be able to crash the loop.
fn parse_inbound_transmission(block: &[u8]) -> (String, BrokerTransmission) {
    let mut p = Parser::new(block);
    let parsed: Outcome<(String, Vec<u8>, Party, AnyCommand)> = (|| {
        let _sig = base64_field_opt(&mut p)?;
        p.space()?;
        let corr_id_bytes = p.word();
        let corr_id = res!(String::from_utf8(corr_id_bytes.to_vec()); Decode, Input);
        p.space()?;
        let queue_id = base64_field_opt(&mut p)?;
        p.space()?;
        let (party, command) = parse_any(&mut p)?;
        Ok((corr_id, queue_id, party, command))
    })();

    match parsed {
        Ok((corr_id, queue_id, Party::Broker, AnyCommand::Broker(command))) => {
            (corr_id, BrokerTransmission::Command { corr_id: corr_id.clone().into_bytes(), queue_id, command })
        },
        Ok((corr_id, queue_id, _, _)) => (
            corr_id.clone(),
            BrokerTransmission::Error { corr_id: corr_id.into_bytes(), queue_id, error: SMPError::Cmd(CmdSub::Prohibited) },
        ),
        Err(_) => (String::new(), BrokerTransmission::bad_block()),
    }
}

/// Classifies a [`BrokerTransmission`] per spec.md §4.4's queue-id
/// discipline, yielding the outcome that will reach either a pending
/// waiter or the unsolicited-message path.
fn classify_transmission(trn: &BrokerTransmission) -> RequestOutcome {
    match trn {
        BrokerTransmission::Error { error, .. } => RequestOutcome::Protocol(*error),
        BrokerTransmission::Command { command, queue_id, .. } => {
            if matches!(command, BrokerCommand::Err { .. }) {
                return RequestOutcome::Command(command.clone());
            }
            let requires_empty = command.requires_empty_queue_id();
            if requires_empty && !queue_id.is_empty() {
                RequestOutcome::Protocol(SMPError::Cmd(CmdSub::HasAuth))
            } else if !requires_empty && queue_id.is_empty() {
                RequestOutcome::Protocol(SMPError::Cmd(CmdSub::NoQueue))
            } else {
                RequestOutcome::Command(command.clone())
            }
        },
    }
}

/// The inbound loop (spec.md §4.4): runs once per connection, parsing
/// and routing every decrypted block until the transport closes.
async fn run_inbound_loop<R: FrameReader>(
    reader: &mut TransportReader<R>,
    pending: &PendingRequests,
    msg_queue: &BoundedQueue<ServerMessage>,
    server: &SMPServer,
) {
    loop {
        let block = match reader.read_block().await {
            Ok(Some(b)) => b,
            Ok(None) => break,
            Err(e) => {
                if e.has_tag(ErrTag::Decrypt) {
                    warn!("Dropping a block that failed AES-GCM authentication (BLOCK).");
                    continue;
                }
                error!("Inbound transport read failed, closing connection: {}", e);
                break;
            },
        };

        let (corr_id, trn) = parse_inbound_transmission(&block);
        if matches!(trn, BrokerTransmission::Error { error: SMPError::Block, .. }) {
            debug!("Dropping an unparseable inbound block (badBlock).");
            continue;
        }

        let queue_id = trn.queue_id().to_vec();
        let outcome = classify_transmission(&trn);
        if let Some(RequestOutcome::Command(cmd)) = pending.resolve(&corr_id, outcome).await {
            if matches!(cmd, BrokerCommand::Msg { .. } | BrokerCommand::End) {
                let pushed = ServerMessage { server: server.clone(), queue_id, command: cmd };
                if msg_queue.enqueue(pushed).await.is_err() {
                    break;
                }
            }
        }
    }
}
