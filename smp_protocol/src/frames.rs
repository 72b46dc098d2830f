//! The byte channel (spec.md §6): a bidirectional stream the transport
//! reads and writes exact byte counts from/to — the handshake needs
//! variably-sized reads (the 8-byte header, `keySize` bytes of SPKI, the
//! RSA-wrapped body), while post-handshake traffic reads/writes exactly
//! `blockSize` bytes per block. A single `read_exact`/`write_all` contract
//! covers both without a framing layer that would only fit one of them.
//!
//! No teacher crate exposes exactly this shape off the shelf, so this
//! trait is this workspace's own, grounded in `fe2o3_net`'s raw `tokio`
//! read/write loop idiom (plain `read_exact`/`write_all`, no higher-level
//! codec).
use smp_core::prelude::*;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};

/// Read side of [`Frames`], split out so the inbound loop and an
/// outbound writer can make progress independently (spec.md §5: "Session
/// `counter`: producer-only on send side, inbound-loop-only on receive
/// side — no contention").
#[async_trait::async_trait]
pub trait FrameReader: Send {
    async fn read_exact(&mut self, n: usize) -> Outcome<Option<Vec<u8>>>;
}

/// Write side of [`Frames`].
#[async_trait::async_trait]
pub trait FrameWriter: Send {
    async fn write_all(&mut self, data: &[u8]) -> Outcome<()>;
}

#[async_trait::async_trait]
pub trait Frames: FrameReader + FrameWriter {}
impl<T: FrameReader + FrameWriter> Frames for T {}

async fn read_exact_loop<R: AsyncRead + Unpin + Send>(stream: &mut R, n: usize) -> Outcome<Option<Vec<u8>>> {
    let mut buf = vec![0u8; n];
    if n == 0 {
        return Ok(Some(buf));
    }
    let mut filled = 0;
    while filled < n {
        let read = match stream.read(&mut buf[filled..]).await {
            Ok(r) => r,
            Err(e) => return Err(err!(e, "While reading from the byte channel."; IO, Network)),
        };
        if read == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(err!(
                "Byte channel closed after {} of {} expected bytes.", filled, n;
                IO, Network, Unexpected
            ));
        }
        filled += read;
    }
    Ok(Some(buf))
}

async fn write_all_flush<W: AsyncWrite + Unpin + Send>(stream: &mut W, data: &[u8]) -> Outcome<()> {
    res!(stream.write_all(data).await; IO, Network);
    res!(stream.flush().await; IO, Network);
    Ok(())
}

/// The reference implementation, over any `AsyncRead + AsyncWrite` stream
/// (a raw TCP socket, or a `tokio-rustls`-wrapped one). Used for the
/// handshake, which is strictly sequential (no concurrent read/write
/// needed); call [`split`] afterwards to get independent halves for the
/// inbound loop and outbound writer.
pub struct StreamFrames<S> {
    stream: S,
}

impl<S: AsyncRead + AsyncWrite + Unpin + Send> StreamFrames<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

#[async_trait::async_trait]
impl<S: AsyncRead + AsyncWrite + Unpin + Send> FrameReader for StreamFrames<S> {
    async fn read_exact(&mut self, n: usize) -> Outcome<Option<Vec<u8>>> {
        read_exact_loop(&mut self.stream, n).await
    }
}

#[async_trait::async_trait]
impl<S: AsyncRead + AsyncWrite + Unpin + Send> FrameWriter for StreamFrames<S> {
    async fn write_all(&mut self, data: &[u8]) -> Outcome<()> {
        write_all_flush(&mut self.stream, data).await
    }
}

/// The read half of a split [`StreamFrames`], grounded on `fe2o3_steel`'s
/// `tokio::io::split` usage for its HTTPS/SMTPS connection handlers.
pub struct StreamReadHalf<R> {
    half: R,
}

#[async_trait::async_trait]
impl<R: AsyncRead + Unpin + Send> FrameReader for StreamReadHalf<R> {
    async fn read_exact(&mut self, n: usize) -> Outcome<Option<Vec<u8>>> {
        read_exact_loop(&mut self.half, n).await
    }
}

/// The write half of a split [`StreamFrames`].
pub struct StreamWriteHalf<W> {
    half: W,
}

#[async_trait::async_trait]
impl<W: AsyncWrite + Unpin + Send> FrameWriter for StreamWriteHalf<W> {
    async fn write_all(&mut self, data: &[u8]) -> Outcome<()> {
        write_all_flush(&mut self.half, data).await
    }
}

/// Splits a handshake-complete [`StreamFrames`] into independent
/// read/write halves via `tokio::io::split`.
pub fn split<S: AsyncRead + AsyncWrite + Unpin + Send>(
    frames: StreamFrames<S>,
) -> (StreamReadHalf<ReadHalf<S>>, StreamWriteHalf<WriteHalf<S>>) {
    let (r, w) = tokio::io::split(frames.into_inner());
    (StreamReadHalf { half: r }, StreamWriteHalf { half: w })
}
